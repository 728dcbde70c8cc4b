//! Property tests for dependency graph resolution over random acyclic
//! configurations.

use idx_coordinator::{DependencyInfoProvider, IndexerConfigSet, IndexerDefinition};
use proptest::prelude::*;
use std::collections::HashSet;

/// Node `i` may only depend on nodes `< i`, so every generated graph is a DAG.
fn acyclic_config() -> impl Strategy<Value = IndexerConfigSet> {
    (1usize..12)
        .prop_flat_map(|n| {
            let edges = (0..n)
                .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(4)))
                .collect::<Vec<_>>();
            (Just(n), edges)
        })
        .prop_map(|(n, edges)| {
            let definitions = (0..n)
                .map(|i| {
                    let deps: Vec<String> = edges[i]
                        .iter()
                        .filter(|&&d| d < i)
                        .map(|d| format!("idx_{d}"))
                        .collect();
                    IndexerDefinition::new(format!("idx_{i}"), "mock").with_dependencies(deps)
                })
                .collect();
            IndexerConfigSet::from_definitions(definitions).unwrap()
        })
}

proptest! {
    #[test]
    fn run_before_never_contains_self(config in acyclic_config()) {
        let provider = DependencyInfoProvider::new(&config);
        for id in config.ids() {
            let before = provider.indexer_ids_to_run_before(&id).unwrap();
            prop_assert!(!before.contains(&id));
            let unique: HashSet<_> = before.iter().collect();
            prop_assert_eq!(unique.len(), before.len());
        }
    }

    #[test]
    fn run_before_contains_direct_dependencies(config in acyclic_config()) {
        let provider = DependencyInfoProvider::new(&config);
        for def in config.definitions() {
            let before = provider.indexer_ids_to_run_before(&def.id).unwrap();
            for dep in &def.dependencies {
                prop_assert!(before.contains(dep));
            }
        }
    }

    #[test]
    fn run_after_mirrors_run_before(config in acyclic_config()) {
        let provider = DependencyInfoProvider::new(&config);
        for x in config.ids() {
            let after: HashSet<String> =
                provider.indexer_ids_to_run_after(&x).unwrap().into_iter().collect();
            for y in config.ids() {
                let before = provider.indexer_ids_to_run_before(&y).unwrap();
                prop_assert_eq!(after.contains(&y), before.contains(&x));
            }
        }
    }

    #[test]
    fn ordered_ids_put_dependencies_first(config in acyclic_config()) {
        let provider = DependencyInfoProvider::new(&config);
        let order = provider.ordered_ids().unwrap();
        prop_assert_eq!(order.len(), config.len());
        let position = |id: &str| order.iter().position(|o| o == id).unwrap();
        for def in config.definitions() {
            for dep in &def.dependencies {
                prop_assert!(position(dep) < position(&def.id));
            }
        }
    }
}
