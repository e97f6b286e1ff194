//! Property suites over the solver manager: edit/undo symmetry and
//! store/solver consistency.

use proptest::prelude::*;
use skein_core::{Format, Value, VarId};
use skein_formula::Formula;
use skein_solver::{CalcModifier, Modifier, Source};
use skein_test_utils::TestWorld;
use std::sync::Arc;

/// The full store contents, ordered by identifier.
fn store_snapshot(w: &TestWorld) -> Vec<(VarId, Value)> {
    let mut entries: Vec<_> = w
        .manager
        .store()
        .iter()
        .map(|(id, value)| (id.clone(), value.clone()))
        .collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

/// A world with the chain a=seed, b=a+2, c=b*4 established.
fn chain_world(seed: i64) -> TestWorld {
    let mut w = TestWorld::new();
    for name in ["a", "b", "c"] {
        w.assert_global(name, Format::Integer);
    }
    w.set("a", Value::Int(seed), "seed");
    w.add_formula("b", "a+2", "chain-b");
    w.add_formula("c", "b*4", "chain-c");
    w
}

proptest! {
    /// Attaching and detaching the same `(modifier, source)` pair leaves
    /// the store, graph, and every other variable exactly as they were.
    #[test]
    fn add_then_remove_restores_state(
        seed in -50i64..50,
        amount in -50i64..50,
        use_formula in any::<bool>(),
    ) {
        let mut w = chain_world(seed);
        let store_before = store_snapshot(&w);
        let edges_before = w.manager.graph().edge_count();
        let nodes_before = w.manager.graph().node_count();

        let global = w.global_instance();
        let modifier: Arc<dyn Modifier> = if use_formula {
            let formula =
                Formula::parse(&format!("a+({amount})"), Format::Integer).unwrap();
            Arc::new(CalcModifier::add_formula(formula, global))
        } else {
            Arc::new(CalcModifier::add(Value::Int(amount), global))
        };

        let b = w.var("b");
        w.manager
            .add_modifier(&w.runtime, b.clone(), modifier.clone(), Source::new("probe"))
            .unwrap();
        w.manager
            .remove_modifier(&w.runtime, b, modifier.as_ref(), &Source::new("probe"))
            .unwrap();

        prop_assert_eq!(store_snapshot(&w), store_before);
        prop_assert_eq!(w.manager.graph().edge_count(), edges_before);
        prop_assert_eq!(w.manager.graph().node_count(), nodes_before);
    }

    /// After any edit sequence, every stored value equals what its solver
    /// derives from the default and current modifier list: the final
    /// diagnose step always lands on the stored value.
    #[test]
    fn stored_values_match_their_derivations(
        seed in -50i64..50,
        reseed in -50i64..50,
    ) {
        let mut w = chain_world(seed);
        w.set("a", Value::Int(reseed), "reseed");

        for name in ["a", "b", "c"] {
            let id = w.var(name);
            let steps = w.manager.diagnose(&w.runtime, &id).unwrap();
            let last = steps.last().unwrap();
            prop_assert_eq!(Some(&last.value), w.manager.value_of(&id));
        }
    }

    /// Chain arithmetic holds for arbitrary seeds: the propagated values
    /// are exactly the formulas applied to the current seed.
    #[test]
    fn chain_arithmetic_is_exact(seed in -1000i64..1000) {
        let w = chain_world(seed);
        prop_assert_eq!(w.value("a"), Value::Int(seed));
        prop_assert_eq!(w.value("b"), Value::Int(seed + 2));
        prop_assert_eq!(w.value("c"), Value::Int((seed + 2) * 4));
    }
}
