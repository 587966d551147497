#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(ty) = tributary::parse_type(s) {
            let _ = tributary::parse_type(&ty.to_string());
        }
    }
});
