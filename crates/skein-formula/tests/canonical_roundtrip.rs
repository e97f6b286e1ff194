//! Property suite: canonical reconstruction is a fixed point of parsing.

use proptest::prelude::*;
use skein_formula::parse;

/// Random well-formed formula source. Composite subexpressions are
/// parenthesized by construction, so every generated string parses.
fn arb_source() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..10_000).prop_map(|n| n.to_string()),
        (0u32..1000, 1u32..100).prop_map(|(whole, frac)| format!("{whole}.{frac}")),
        "[a-z][a-z0-9_]{0,5}".prop_map(|name| name),
        "[a-z ]{0,8}".prop_map(|text| format!("\"{text}\"")),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        let binary_op = prop_oneof![
            Just("+"),
            Just("-"),
            Just("*"),
            Just("/"),
            Just("%"),
            Just("^"),
            Just("<"),
            Just(">"),
            Just("<="),
            Just(">="),
            Just("=="),
            Just("!="),
            Just("&&"),
            Just("||"),
        ];
        prop_oneof![
            (inner.clone(), binary_op, inner.clone())
                .prop_map(|(lhs, op, rhs)| format!("({lhs}){op}({rhs})")),
            inner.clone().prop_map(|operand| format!("-({operand})")),
            inner.clone().prop_map(|operand| format!("!({operand})")),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| format!("max({a},{b})")),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| format!("if({c},{t},{e})")),
            inner.prop_map(|e| format!("({e})")),
        ]
    })
}

proptest! {
    /// `parse(s).to_string()` is idempotent: canonical text reparses to a
    /// tree that reconstructs identically.
    #[test]
    fn canonicalization_is_a_fixed_point(src in arb_source()) {
        let once = parse(&src).unwrap().to_string();
        let twice = parse(&once).unwrap().to_string();
        prop_assert_eq!(once, twice);
    }

    /// Canonicalization never changes the parse tree itself.
    #[test]
    fn canonical_text_reparses_to_the_same_tree(src in arb_source()) {
        let tree = parse(&src).unwrap();
        let reparsed = parse(&tree.to_string()).unwrap();
        prop_assert_eq!(tree, reparsed);
    }
}
