#![no_main]

use libfuzzer_sys::fuzz_target;
use tributary::{Engine, ResourceLimits};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let limits = ResourceLimits::default().with_max_reduction_steps(200);
        let engine = Engine::new().with_limits(limits);

        if let Ok(expression) = engine.parse(s, None) {
            if let Ok(normalized) = engine.normalize(&expression) {
                let text = normalized.to_string();
                let reparsed = engine.parse(&text, None);
                assert!(reparsed.is_ok(), "normal form does not parse: {}", text);
            }
        }
    }
});
