#![no_main]

use libfuzzer_sys::fuzz_target;
use tributary::Engine;

fuzz_target!(|input: (u8, u8)| {
    let engine = Engine::new();

    let (parens, lambdas) = input;
    let parens = (parens as usize % 300) + 1;
    let lambdas = (lambdas as usize % 300) + 1;

    let mut expr = String::from("1");
    for _ in 0..parens {
        expr = format!("({} + 1)", expr);
    }
    let _ = engine.parse(&expr, Some("fuzz_nested".to_string()));

    let mut expr = String::from("x");
    for _ in 0..lambdas {
        expr = format!("x => {}", expr);
    }
    if let Ok(expression) = engine.parse(&expr, Some("fuzz_nested".to_string())) {
        let _ = engine.normalize(&expression);
    }
});
