use proptest::prelude::*;
use tributary::analysis::{contains_redex, free_variables};
use tributary::{Engine, Expression, Parameter, Type, Value};

fn leaf() -> impl Strategy<Value = Expression> {
    prop_oneof![
        (-50i64..50).prop_map(|n| Expression::constant(Value::Int(n))),
        prop::sample::select(vec!["a", "b", "c", "p", "q"])
            .prop_map(|name| Expression::local(name, Type::Any)),
    ]
}

fn lambda(parameter: &str, body: Expression) -> Expression {
    Expression::lambda(vec![Parameter::local(parameter, Type::Any)], body)
}

fn expression() -> impl Strategy<Value = Expression> {
    leaf().prop_recursive(4, 32, 2, |inner| {
        let parameter = prop::sample::select(vec!["p", "q"]);
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.add(r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.mul(r)),
            (parameter.clone(), inner.clone()).prop_map(|(p, body)| lambda(p, body)),
            (parameter, inner.clone(), inner)
                .prop_map(|(p, body, argument)| Expression::invoke(lambda(p, body), vec![argument])),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn normalize_is_idempotent(expression in expression()) {
        let engine = Engine::new();
        let once = engine.normalize(&expression);
        prop_assume!(once.is_ok());
        let once = once.unwrap();
        let twice = engine.normalize(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normal_form_has_no_redex(expression in expression()) {
        let engine = Engine::new();
        if let Ok(normalized) = engine.normalize(&expression) {
            prop_assert!(!contains_redex(&normalized, engine.registry()));
        }
    }

    #[test]
    fn normalization_adds_no_free_variables(expression in expression()) {
        let engine = Engine::new();
        if let Ok(normalized) = engine.normalize(&expression) {
            let before = free_variables(&expression);
            prop_assert!(free_variables(&normalized).is_subset(&before));
        }
    }

    #[test]
    fn display_parses_back(expression in expression()) {
        let engine = Engine::new();
        let text = expression.to_string();
        let parsed = engine.parse(&text, None).unwrap();
        prop_assert_eq!(&parsed, &expression, "text was {}", text);

        if let Ok(normalized) = engine.normalize(&expression) {
            let text = normalized.to_string();
            prop_assert_eq!(engine.parse(&text, None).unwrap(), normalized, "text was {}", text);
        }
    }
}
