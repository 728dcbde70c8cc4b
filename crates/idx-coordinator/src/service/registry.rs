//! # Indexer Registry
//!
//! Every configured indexer, plus the batch operations the operator CLI
//! runs over several of them at once.
//!
//! ## Reindex Plan
//!
//! Requesting a subset of indexers also pulls in:
//! - upstream dependencies (run-before closure) that are INVALID
//! - every downstream dependent (run-after closure)
//!
//! The plan runs in dependency order. Within one batch a shared index group
//! is rebuilt once; the group's later members are only marked VALID, unless
//! they are working elsewhere or suspended.

use crate::algorithms::{backlog, DependencyInfoProvider};
use crate::domain::{
    IndexerError, IndexerId, IndexerMode, IndexerResult, IndexerStatus, ViewStatus,
};
use crate::ports::{IndexerApi, ReindexOutcome};
use crate::service::context::IndexerContext;
use crate::service::indexer::Indexer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Per-indexer results of a batch operation.
pub type BatchResults<T = ()> = Vec<(IndexerId, IndexerResult<T>)>;

/// What happened to one indexer in a batch reindex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "error")]
pub enum BatchStepOutcome {
    /// Full rebuild completed.
    Rebuilt,
    /// Another member of the shared index group was rebuilt in this batch.
    ValidatedBySharedIndex,
    /// Already working elsewhere.
    SkippedWorking,
    /// Suspended by an operator.
    SkippedSuspended,
    /// The rebuild failed.
    Failed(String),
}

/// One entry of a `ReindexReport`.
#[derive(Clone, Debug, Serialize)]
pub struct BatchStep {
    /// Indexer id.
    pub indexer_id: IndexerId,
    /// Indexer title.
    pub title: String,
    /// Result.
    pub outcome: BatchStepOutcome,
    /// Wall time spent on this indexer.
    pub duration: Duration,
}

/// Result of a batch reindex.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReindexReport {
    /// Steps in execution order.
    pub steps: Vec<BatchStep>,
}

impl ReindexReport {
    /// Whether any indexer failed.
    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.outcome, BatchStepOutcome::Failed(_)))
    }

    /// Step for `indexer_id`.
    pub fn step(&self, indexer_id: &str) -> Option<&BatchStep> {
        self.steps.iter().find(|s| s.indexer_id == indexer_id)
    }
}

/// One line of the status report.
#[derive(Clone, Debug, Serialize)]
pub struct IndexerStatusRow {
    /// Indexer id.
    pub id: IndexerId,
    /// Indexer title.
    pub title: String,
    /// Effective status.
    pub status: IndexerStatus,
    /// Realtime or schedule.
    pub mode: IndexerMode,
    /// View status when scheduled.
    pub view_status: Option<ViewStatus>,
    /// Changelog versions not yet applied.
    pub backlog: u64,
    /// Shared index group.
    pub shared_index: Option<String>,
    /// Latest update of indexer or view.
    pub updated: Option<DateTime<Utc>>,
}

/// All configured indexers.
pub struct IndexerRegistry {
    ctx: Arc<IndexerContext>,
    indexers: Vec<Indexer>,
}

impl IndexerRegistry {
    /// Registry over every indexer in `ctx`'s configuration.
    pub fn new(ctx: Arc<IndexerContext>) -> IndexerResult<Self> {
        let indexers = ctx
            .config
            .ids()
            .iter()
            .map(|id| Indexer::load(Arc::clone(&ctx), id))
            .collect::<IndexerResult<Vec<_>>>()?;
        Ok(Self { ctx, indexers })
    }

    /// Shared context.
    pub fn context(&self) -> &Arc<IndexerContext> {
        &self.ctx
    }

    /// Dependency queries over the configuration.
    pub fn dependencies(&self) -> DependencyInfoProvider<'_> {
        DependencyInfoProvider::new(&self.ctx.config)
    }

    /// Indexer by id.
    pub fn get(&self, id: &str) -> IndexerResult<&Indexer> {
        self.indexers
            .iter()
            .find(|i| i.id() == id)
            .ok_or_else(|| IndexerError::UnknownIndexer(id.to_string()))
    }

    /// All indexers in declaration order.
    pub fn all(&self) -> &[Indexer] {
        &self.indexers
    }

    /// Indexers for `ids`, or all of them when `ids` is empty.
    pub fn resolve(&self, ids: &[String]) -> IndexerResult<Vec<&Indexer>> {
        if ids.is_empty() {
            return Ok(self.indexers.iter().collect());
        }
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.insert(id.as_str()) {
                resolved.push(self.get(id)?);
            }
        }
        Ok(resolved)
    }

    /// Ids a reindex of `ids` will run, in dependency order.
    pub fn plan_reindex(&self, ids: &[String]) -> IndexerResult<Vec<IndexerId>> {
        let requested = self.resolve(ids)?;
        let provider = self.dependencies();
        if requested.len() == self.indexers.len() {
            return provider.ordered_ids();
        }

        let mut planned: Vec<IndexerId> = requested.iter().map(|i| i.id().to_string()).collect();
        let mut upstream = Vec::new();
        let mut downstream = Vec::new();
        for indexer in &requested {
            upstream.extend(provider.indexer_ids_to_run_before(indexer.id())?);
            downstream.extend(provider.indexer_ids_to_run_after(indexer.id())?);
        }
        for id in upstream {
            if self.get(&id)?.is_invalid()? {
                planned.push(id);
            }
        }
        planned.extend(downstream);

        let mut seen = HashSet::new();
        planned.retain(|id| seen.insert(id.clone()));
        provider.order(&planned)
    }

    /// Full reindex of `ids` (all when empty) and what they pull in.
    ///
    /// A failing indexer is recorded and the batch continues.
    pub fn reindex(&self, ids: &[String]) -> IndexerResult<ReindexReport> {
        let plan = self.plan_reindex(ids)?;
        info!(indexers = plan.len(), "Batch reindex started");

        let mut report = ReindexReport::default();
        let mut completed_groups: HashSet<String> = HashSet::new();
        for id in plan {
            let indexer = self.get(&id)?;
            let group = indexer.definition().shared_index.clone();
            let started = Instant::now();

            let group_built = group
                .as_ref()
                .is_some_and(|g| completed_groups.contains(g));

            let outcome = if group_built {
                match indexer.validate_by_shared_index() {
                    Ok(ReindexOutcome::Completed) => BatchStepOutcome::ValidatedBySharedIndex,
                    Ok(ReindexOutcome::SkippedWorking) => BatchStepOutcome::SkippedWorking,
                    Ok(ReindexOutcome::SkippedSuspended) => BatchStepOutcome::SkippedSuspended,
                    Err(e) => BatchStepOutcome::Failed(e.to_string()),
                }
            } else {
                match indexer.reindex_all() {
                    Ok(ReindexOutcome::Completed) => {
                        if let Some(group) = group {
                            completed_groups.insert(group);
                        }
                        BatchStepOutcome::Rebuilt
                    }
                    Ok(ReindexOutcome::SkippedWorking) => BatchStepOutcome::SkippedWorking,
                    Ok(ReindexOutcome::SkippedSuspended) => BatchStepOutcome::SkippedSuspended,
                    Err(e) => {
                        error!(indexer_id = %id, error = %e, "Indexer failed in batch reindex");
                        BatchStepOutcome::Failed(e.to_string())
                    }
                }
            };

            report.steps.push(BatchStep {
                indexer_id: id,
                title: indexer.title().to_string(),
                outcome,
                duration: started.elapsed(),
            });
        }
        info!(
            steps = report.steps.len(),
            failed = report.has_failures(),
            "Batch reindex finished"
        );
        Ok(report)
    }

    /// Invalidate `ids` (all when empty).
    pub fn invalidate(&self, ids: &[String]) -> IndexerResult<BatchResults> {
        self.for_each(ids, |i| i.invalidate())
    }

    /// Switch `ids` (all when empty) to schedule or realtime mode.
    pub fn set_scheduled(&self, ids: &[String], scheduled: bool) -> IndexerResult<BatchResults> {
        self.for_each(ids, |i| i.set_scheduled(scheduled))
    }

    /// Operator status override for `ids` (all when empty).
    pub fn set_status(&self, ids: &[String], status: IndexerStatus) -> IndexerResult<BatchResults> {
        self.for_each(ids, |i| i.set_status(status))
    }

    /// Apply pending changelog rows for every scheduled indexer.
    pub fn update_scheduled(&self) -> BatchResults<usize> {
        let mut results = Vec::new();
        for indexer in &self.indexers {
            let result = match indexer.is_scheduled() {
                Ok(false) => continue,
                Ok(true) => indexer.update_from_changelog(),
                Err(e) => Err(e),
            };
            results.push((indexer.id().to_string(), result));
        }
        results
    }

    /// Status rows for `ids` (all when empty).
    pub fn status_report(&self, ids: &[String]) -> IndexerResult<Vec<IndexerStatusRow>> {
        self.resolve(ids)?
            .into_iter()
            .map(|indexer| -> IndexerResult<IndexerStatusRow> {
                let view = indexer.view();
                let view_state = view.state()?;
                let scheduled = view_state.is_enabled();
                Ok(IndexerStatusRow {
                    id: indexer.id().to_string(),
                    title: indexer.title().to_string(),
                    status: indexer.status()?,
                    mode: IndexerMode::from_scheduled(scheduled),
                    view_status: scheduled.then_some(view_state.status),
                    backlog: backlog(view.as_ref())?,
                    shared_index: indexer.definition().shared_index.clone(),
                    updated: indexer.latest_updated()?,
                })
            })
            .collect()
    }

    fn for_each<F>(&self, ids: &[String], op: F) -> IndexerResult<BatchResults>
    where
        F: Fn(&Indexer) -> IndexerResult<()>,
    {
        Ok(self
            .resolve(ids)?
            .into_iter()
            .map(|indexer| (indexer.id().to_string(), op(indexer)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndexerDefinition;
    use crate::ports::IndexerStateStore;
    use crate::service::test_support::TestHarness;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn catalog() -> TestHarness {
        TestHarness::new(vec![
            IndexerDefinition::new("attribute", "mock"),
            IndexerDefinition::new("price", "mock")
                .with_dependencies(["attribute"])
                .with_shared_index("product"),
            IndexerDefinition::new("stock", "mock").with_shared_index("product"),
            IndexerDefinition::new("search", "mock").with_dependencies(["price"]),
            IndexerDefinition::new("rule", "mock"),
        ])
    }

    #[test]
    fn test_resolve_empty_means_all() {
        let harness = catalog();
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();
        assert_eq!(registry.resolve(&[]).unwrap().len(), 5);
        assert!(matches!(
            registry.resolve(&ids(&["nope"])),
            Err(IndexerError::UnknownIndexer(_))
        ));
    }

    #[test]
    fn test_plan_pulls_invalid_upstream_and_downstream() {
        let harness = catalog();
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();
        assert_eq!(
            registry.plan_reindex(&ids(&["price"])).unwrap(),
            ids(&["attribute", "price", "search"])
        );

        harness.set_stored_status("attribute", IndexerStatus::Valid);
        registry.get("attribute").unwrap().refresh_state();
        assert_eq!(
            registry.plan_reindex(&ids(&["price"])).unwrap(),
            ids(&["price", "search"])
        );
    }

    #[test]
    fn test_plan_all_is_dependency_order() {
        let harness = catalog();
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();
        assert_eq!(
            registry.plan_reindex(&[]).unwrap(),
            ids(&["attribute", "price", "stock", "search", "rule"])
        );
    }

    #[test]
    fn test_shared_index_rebuilt_once_per_batch() {
        let harness = catalog();
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();
        let report = registry.reindex(&[]).unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.step("price").unwrap().outcome, BatchStepOutcome::Rebuilt);
        assert_eq!(
            report.step("stock").unwrap().outcome,
            BatchStepOutcome::ValidatedBySharedIndex
        );
        assert_eq!(harness.actions.full_count("stock"), 0);
        assert!(registry.get("stock").unwrap().is_valid().unwrap());
    }

    #[test]
    fn test_shared_index_shortcut_respects_working_and_suspended() {
        let harness = TestHarness::new(vec![
            IndexerDefinition::new("price", "mock").with_shared_index("product"),
            IndexerDefinition::new("stock", "mock").with_shared_index("product"),
            IndexerDefinition::new("rule", "mock").with_shared_index("product"),
        ]);
        harness.set_stored_status("stock", IndexerStatus::Suspended);
        harness.set_stored_status("rule", IndexerStatus::Working);
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();

        let report = registry.reindex(&[]).unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.step("price").unwrap().outcome, BatchStepOutcome::Rebuilt);
        assert_eq!(
            report.step("stock").unwrap().outcome,
            BatchStepOutcome::SkippedSuspended
        );
        assert_eq!(
            report.step("rule").unwrap().outcome,
            BatchStepOutcome::SkippedWorking
        );
        assert_eq!(
            harness.store.load("stock").unwrap().status,
            IndexerStatus::Suspended
        );
        assert_eq!(
            harness.store.load("rule").unwrap().status,
            IndexerStatus::Working
        );
        assert_eq!(harness.actions.full_count("stock"), 0);
        assert_eq!(harness.actions.full_count("rule"), 0);
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let harness = catalog();
        harness.actions.fail("attribute");
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();
        let report = registry.reindex(&[]).unwrap();

        assert!(report.has_failures());
        assert!(matches!(
            report.step("attribute").unwrap().outcome,
            BatchStepOutcome::Failed(_)
        ));
        assert_eq!(report.step("rule").unwrap().outcome, BatchStepOutcome::Rebuilt);
        assert!(registry.get("attribute").unwrap().is_invalid().unwrap());
    }

    #[test]
    fn test_set_scheduled_and_status_report() {
        let harness = catalog();
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();
        let results = registry.set_scheduled(&ids(&["search"]), true).unwrap();
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        harness.store.record_change("search", &[1]).unwrap();

        let rows = registry.status_report(&ids(&["search", "rule"])).unwrap();
        assert_eq!(rows[0].mode, IndexerMode::Schedule);
        assert_eq!(rows[0].view_status, Some(ViewStatus::Idle));
        assert_eq!(rows[0].backlog, 1);
        assert_eq!(rows[1].mode, IndexerMode::Realtime);
        assert_eq!(rows[1].view_status, None);
    }

    #[test]
    fn test_update_scheduled_only_touches_scheduled() {
        let harness = catalog();
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();
        registry.set_scheduled(&ids(&["rule"]), true).unwrap();
        registry.set_status(&ids(&["rule"]), IndexerStatus::Valid).unwrap();
        harness.store.record_change("rule", &[8]).unwrap();

        let results = registry.update_scheduled();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "rule");
        assert_eq!(*results[0].1.as_ref().unwrap(), 1);
    }

    #[test]
    fn test_invalidate_reports_per_indexer() {
        let harness = catalog();
        let registry = IndexerRegistry::new(harness.ctx.clone()).unwrap();
        registry.reindex(&ids(&["rule"])).unwrap();
        assert!(registry.get("rule").unwrap().is_valid().unwrap());
        let results = registry.invalidate(&ids(&["rule"])).unwrap();
        assert_eq!(results.len(), 1);
        assert!(registry.get("rule").unwrap().is_invalid().unwrap());
    }
}
