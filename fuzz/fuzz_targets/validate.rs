#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&[u8], &[u8])| {
    let (schema_bytes, instance_bytes) = data;

    // We're only interested in fuzzing validation of well-formed schemas.
    let Ok(schema_value) = serde_json::from_slice(schema_bytes) else {
        return;
    };
    let Ok(schema) = jsv::Schema::from_value(schema_value) else {
        return;
    };
    let Ok(instance) = serde_json::from_slice(instance_bytes) else {
        return;
    };

    // Arbitrary schemas can contain reference cycles, so cap ref depth.
    let _ = jsv::validate_with(
        &schema,
        &instance,
        jsv::ValidateOptions::new().with_max_ref_depth(64),
    );
});
