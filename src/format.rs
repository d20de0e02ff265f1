use chrono::DateTime;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UUID: Regex = Regex::new(
        "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .unwrap();
    static ref URI: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:\S+$").unwrap();
}

/// Checks a string against a named `format`. Unknown formats are accepted.
pub fn check_format(format: &str, s: &str) -> bool {
    match format {
        "email" => email(s),
        "uri" => URI.is_match(s),
        "uuid" => UUID.is_match(s),
        "date-time" => DateTime::parse_from_rfc3339(s).is_ok(),
        _ => true,
    }
}

fn email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && domain.contains('.'),
        _ => false,
    }
}
