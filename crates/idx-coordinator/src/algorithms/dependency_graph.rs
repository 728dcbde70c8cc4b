//! # Dependency Graph Resolution
//!
//! Answers "what must run before X" and "what must run after X" over the
//! static `dependencies` edges, with transitive closure.
//!
//! An edge `A depends on B` means B must be valid before A is rebuilt.
//! The walk keeps the current path on a stack, so a configuration cycle is
//! reported as `CyclicDependency` instead of recursing forever. A direct
//! self-reference (`A depends on A`) is ignored.

use crate::domain::{IndexerConfigSet, IndexerError, IndexerId, IndexerResult};
use std::collections::{HashMap, HashSet};

/// Dependency queries over a configuration.
#[derive(Clone, Copy, Debug)]
pub struct DependencyInfoProvider<'a> {
    config: &'a IndexerConfigSet,
}

impl<'a> DependencyInfoProvider<'a> {
    /// Provider over the given configuration.
    pub fn new(config: &'a IndexerConfigSet) -> Self {
        Self { config }
    }

    /// Transitive "must run before" set of `id`, in discovery order.
    ///
    /// Never contains `id` itself.
    ///
    /// # Errors
    ///
    /// - `NoSuchEntity` if `id` or any referenced id is not configured
    /// - `CyclicDependency` if the closure loops back on itself
    pub fn indexer_ids_to_run_before(&self, id: &str) -> IndexerResult<Vec<IndexerId>> {
        self.closure(id, |node| self.dependencies_of(node))
    }

    /// Every indexer whose run-before closure contains `id`, in discovery order.
    ///
    /// # Errors
    ///
    /// - `NoSuchEntity` if `id` is not configured
    /// - `CyclicDependency` if the dependents loop back on themselves
    pub fn indexer_ids_to_run_after(&self, id: &str) -> IndexerResult<Vec<IndexerId>> {
        self.closure(id, |node| Ok(self.dependents_of(node)))
    }

    /// All configured ids, dependencies first.
    ///
    /// Among indexers whose dependencies are satisfied, the one declared
    /// first comes first.
    pub fn ordered_ids(&self) -> IndexerResult<Vec<IndexerId>> {
        let ids = self.config.ids();
        let position: HashMap<&str, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut pending: Vec<usize> = vec![0; ids.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
        for (i, id) in ids.iter().enumerate() {
            for dep in self.dependencies_of(id)? {
                let j = position[dep.as_str()];
                pending[i] += 1;
                dependents[j].push(i);
            }
        }

        let mut ready: std::collections::BTreeSet<usize> =
            (0..ids.len()).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(ids.len());
        while let Some(i) = ready.pop_first() {
            order.push(ids[i].clone());
            for &d in &dependents[i] {
                pending[d] -= 1;
                if pending[d] == 0 {
                    ready.insert(d);
                }
            }
        }

        if order.len() < ids.len() {
            // Walk one of the stuck nodes to report the actual cycle.
            if let Some(stuck) = (0..ids.len()).find(|&i| pending[i] > 0) {
                self.indexer_ids_to_run_before(&ids[stuck])?;
            }
            return Err(IndexerError::CyclicDependency { path: Vec::new() });
        }
        Ok(order)
    }

    /// The given ids in dependency order.
    pub fn order(&self, ids: &[IndexerId]) -> IndexerResult<Vec<IndexerId>> {
        for id in ids {
            if !self.config.contains(id) {
                return Err(IndexerError::NoSuchEntity(id.clone()));
            }
        }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(self
            .ordered_ids()?
            .into_iter()
            .filter(|id| wanted.contains(id.as_str()))
            .collect())
    }

    /// Direct dependencies of `id`, validated and without self-references.
    fn dependencies_of(&self, id: &str) -> IndexerResult<Vec<IndexerId>> {
        let def = self
            .config
            .get(id)
            .ok_or_else(|| IndexerError::NoSuchEntity(id.to_string()))?;
        let mut deps = Vec::with_capacity(def.dependencies.len());
        for dep in &def.dependencies {
            if dep == id || deps.contains(dep) {
                continue;
            }
            if !self.config.contains(dep) {
                return Err(IndexerError::NoSuchEntity(dep.clone()));
            }
            deps.push(dep.clone());
        }
        Ok(deps)
    }

    /// Indexers that directly depend on `id`.
    fn dependents_of(&self, id: &str) -> Vec<IndexerId> {
        self.config
            .definitions()
            .iter()
            .filter(|d| d.id != id && d.dependencies.iter().any(|dep| dep == id))
            .map(|d| d.id.clone())
            .collect()
    }

    fn closure<F>(&self, id: &str, neighbours: F) -> IndexerResult<Vec<IndexerId>>
    where
        F: Fn(&str) -> IndexerResult<Vec<IndexerId>>,
    {
        if !self.config.contains(id) {
            return Err(IndexerError::NoSuchEntity(id.to_string()));
        }

        fn visit<F>(
            node: &str,
            neighbours: &F,
            stack: &mut Vec<IndexerId>,
            done: &mut HashSet<IndexerId>,
            result: &mut Vec<IndexerId>,
        ) -> IndexerResult<()>
        where
            F: Fn(&str) -> IndexerResult<Vec<IndexerId>>,
        {
            stack.push(node.to_string());
            for next in neighbours(node)? {
                if let Some(pos) = stack.iter().position(|s| *s == next) {
                    let mut path = stack[pos..].to_vec();
                    path.push(next);
                    return Err(IndexerError::CyclicDependency { path });
                }
                if done.contains(&next) {
                    continue;
                }
                result.push(next.clone());
                visit(&next, neighbours, stack, done, result)?;
                done.insert(next);
            }
            stack.pop();
            Ok(())
        }

        let mut stack = Vec::new();
        let mut done = HashSet::new();
        let mut result = Vec::new();
        visit(id, &neighbours, &mut stack, &mut done, &mut result)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndexerDefinition;

    fn config(edges: &[(&str, &[&str])]) -> IndexerConfigSet {
        IndexerConfigSet::from_definitions(
            edges
                .iter()
                .map(|(id, deps)| {
                    IndexerDefinition::new(*id, "bin/noop").with_dependencies(deps.iter().copied())
                })
                .collect(),
        )
        .unwrap()
    }

    fn sorted(mut ids: Vec<String>) -> Vec<String> {
        ids.sort();
        ids
    }

    #[test]
    fn test_run_before_transitive_closure() {
        let cfg = config(&[("x", &["a", "b"]), ("a", &["c"]), ("b", &[]), ("c", &[])]);
        let provider = DependencyInfoProvider::new(&cfg);
        assert_eq!(
            sorted(provider.indexer_ids_to_run_before("x").unwrap()),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_run_before_deduplicates_diamond() {
        let cfg = config(&[("x", &["a", "b"]), ("a", &["c"]), ("b", &["c"]), ("c", &[])]);
        let provider = DependencyInfoProvider::new(&cfg);
        let ids = provider.indexer_ids_to_run_before("x").unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(sorted(ids), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_run_before_skips_self_reference() {
        let cfg = config(&[("x", &["x", "a"]), ("a", &[])]);
        let provider = DependencyInfoProvider::new(&cfg);
        assert_eq!(provider.indexer_ids_to_run_before("x").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_run_before_unknown_id() {
        let cfg = config(&[("x", &[])]);
        let provider = DependencyInfoProvider::new(&cfg);
        let err = provider.indexer_ids_to_run_before("ghost").unwrap_err();
        assert!(matches!(err, IndexerError::NoSuchEntity(id) if id == "ghost"));
    }

    #[test]
    fn test_run_before_unknown_dependency() {
        let cfg = config(&[("x", &["a"]), ("a", &["ghost"])]);
        let provider = DependencyInfoProvider::new(&cfg);
        let err = provider.indexer_ids_to_run_before("x").unwrap_err();
        assert!(matches!(err, IndexerError::NoSuchEntity(id) if id == "ghost"));
    }

    #[test]
    fn test_run_before_detects_cycle() {
        let cfg = config(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let provider = DependencyInfoProvider::new(&cfg);
        match provider.indexer_ids_to_run_before("a").unwrap_err() {
            IndexerError::CyclicDependency { path } => {
                assert_eq!(path, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_run_after_reverse_closure() {
        let cfg = config(&[("c", &[]), ("a", &["c"]), ("x", &["a"]), ("y", &[])]);
        let provider = DependencyInfoProvider::new(&cfg);
        assert_eq!(
            sorted(provider.indexer_ids_to_run_after("c").unwrap()),
            vec!["a", "x"]
        );
        assert!(provider.indexer_ids_to_run_after("y").unwrap().is_empty());
    }

    #[test]
    fn test_run_after_validates_id() {
        let cfg = config(&[("c", &[])]);
        let provider = DependencyInfoProvider::new(&cfg);
        assert!(matches!(
            provider.indexer_ids_to_run_after("nope"),
            Err(IndexerError::NoSuchEntity(_))
        ));
    }

    #[test]
    fn test_ordered_ids_dependencies_first_and_stable() {
        let cfg = config(&[("x", &["a"]), ("y", &[]), ("a", &[]), ("z", &["x"])]);
        let provider = DependencyInfoProvider::new(&cfg);
        assert_eq!(provider.ordered_ids().unwrap(), vec!["y", "a", "x", "z"]);
    }

    #[test]
    fn test_ordered_ids_reports_cycle() {
        let cfg = config(&[("free", &[]), ("a", &["b"]), ("b", &["a"])]);
        let provider = DependencyInfoProvider::new(&cfg);
        assert!(matches!(
            provider.ordered_ids(),
            Err(IndexerError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_order_subset() {
        let cfg = config(&[("x", &["a"]), ("a", &[]), ("b", &[])]);
        let provider = DependencyInfoProvider::new(&cfg);
        assert_eq!(
            provider.order(&["x".into(), "a".into()]).unwrap(),
            vec!["a", "x"]
        );
    }
}
