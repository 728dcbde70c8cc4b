//! # Indexer
//!
//! Per-id façade over the state store, the changelog view and the action.
//!
//! ## Full Reindex Flow
//!
//! ```text
//! is_working? ──yes──→ SkippedWorking
//!     │no
//! SUSPENDED? ──yes──→ SkippedSuspended
//!     │no
//! save WORKING
//!     │
//! reset = no upstream dependency is VALID with a stale changelog
//!     │
//! suspend shared-index peer views, then own view
//!     │
//! execute_full ──err──→ save INVALID, resume views, return error
//!     │ok
//! still WORKING? → save VALID
//!     │
//! resume views → Completed
//! ```
//!
//! Any failure once WORKING is saved ends with the indexer INVALID, a
//! panicking action included.

use crate::algorithms::{is_view_up_to_date, DependencyInfoProvider};
use crate::domain::{
    EntityId, IndexerDefinition, IndexerError, IndexerResult, IndexerState, IndexerStatus,
    ViewError, ViewStatus,
};
use crate::metrics::ReindexResultKind;
use crate::ports::{IndexerApi, ReindexOutcome, View};
use crate::service::context::IndexerContext;
use crate::service::suspension::ViewSuspension;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// One configured indexer.
pub struct Indexer {
    ctx: Arc<IndexerContext>,
    definition: IndexerDefinition,
    state: Mutex<Option<IndexerState>>,
}

impl Indexer {
    /// Indexer for a configured id. State is loaded on first use.
    ///
    /// # Errors
    ///
    /// Returns `UnknownIndexer` if `id` is not configured.
    pub fn load(ctx: Arc<IndexerContext>, id: &str) -> IndexerResult<Self> {
        let definition = ctx.config.require(id)?.clone();
        Ok(Self {
            ctx,
            definition,
            state: Mutex::new(None),
        })
    }

    /// Static definition.
    pub fn definition(&self) -> &IndexerDefinition {
        &self.definition
    }

    /// Changelog view of this indexer.
    pub fn view(&self) -> Arc<dyn View> {
        self.ctx.views.view(self.definition.view_id())
    }

    /// Persisted state, loaded once and cached.
    pub fn state(&self) -> IndexerResult<IndexerState> {
        let mut cached = self.state.lock();
        if let Some(state) = cached.as_ref() {
            return Ok(state.clone());
        }
        let state = self.ctx.state_store.load(&self.definition.id)?;
        *cached = Some(state.clone());
        Ok(state)
    }

    /// Drop the cached state so the next access reloads it.
    pub fn refresh_state(&self) {
        *self.state.lock() = None;
    }

    fn save_state(&self, state: &mut IndexerState) -> IndexerResult<()> {
        state.touch();
        self.ctx.state_store.save(state)?;
        *self.state.lock() = Some(state.clone());
        Ok(())
    }

    fn change_status(&self, next: IndexerStatus) -> IndexerResult<()> {
        let mut state = self.state()?;
        let previous = state.status;
        state.set_status(next)?;
        self.save_state(&mut state)?;
        if previous != next {
            info!(indexer_id = %self.definition.id, from = %previous, to = %next, "Indexer status changed");
        }
        Ok(())
    }

    /// False when some upstream indexer is VALID but its changelog has
    /// unapplied versions: fast-forwarding our watermark would skip them.
    pub fn should_reset_view_version(&self) -> IndexerResult<bool> {
        let provider = DependencyInfoProvider::new(&self.ctx.config);
        for upstream_id in provider.indexer_ids_to_run_before(&self.definition.id)? {
            if upstream_id == self.definition.id {
                continue;
            }
            let upstream = Indexer::load(Arc::clone(&self.ctx), &upstream_id)?;
            if upstream.is_valid()? && !is_view_up_to_date(upstream.view().as_ref())? {
                debug!(
                    indexer_id = %self.definition.id,
                    upstream = %upstream_id,
                    "Upstream changelog is behind, keeping view version"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Views of the other members of this indexer's shared index group.
    fn shared_index_peer_views(&self) -> IndexerResult<Vec<Arc<dyn View>>> {
        let mut views = Vec::new();
        for peer_id in self.ctx.config.shared_index_peers(&self.definition.id)? {
            let peer = self.ctx.config.require(&peer_id)?;
            views.push(self.ctx.views.view(peer.view_id()));
        }
        Ok(views)
    }

    /// Guards shared by every path that may change a status on a rebuild's
    /// behalf. `None` means the indexer may proceed.
    fn skip_reason(&self) -> IndexerResult<Option<ReindexOutcome>> {
        let id = &self.definition.id;
        if self.ctx.working_state.is_working(id)? {
            warn!(indexer_id = %id, "Indexer is already working, skipping reindex");
            return Ok(Some(ReindexOutcome::SkippedWorking));
        }
        self.refresh_state();
        if self.state()?.status == IndexerStatus::Suspended {
            warn!(indexer_id = %id, "Indexer is suspended, skipping reindex");
            return Ok(Some(ReindexOutcome::SkippedSuspended));
        }
        Ok(None)
    }

    /// Mark VALID because another member of the shared index group was
    /// rebuilt. Working and suspended indexers are left alone.
    pub fn validate_by_shared_index(&self) -> IndexerResult<ReindexOutcome> {
        if let Some(skipped) = self.skip_reason()? {
            return Ok(skipped);
        }
        self.change_status(IndexerStatus::Valid)?;
        Ok(ReindexOutcome::Completed)
    }

    fn run_full_reindex(&self) -> IndexerResult<ReindexOutcome> {
        let id = &self.definition.id;
        if let Some(skipped) = self.skip_reason()? {
            return Ok(skipped);
        }

        let mut state = self.state()?;
        state.set_status(IndexerStatus::Working)?;
        self.save_state(&mut state)?;
        info!(indexer_id = %id, "Full reindex started");

        let _unwind = InvalidateOnUnwind { indexer: self };
        match self.rebuild() {
            Ok(()) => {
                info!(indexer_id = %id, "Full reindex completed");
                Ok(ReindexOutcome::Completed)
            }
            Err(e) => {
                self.mark_failed(&e);
                Err(e)
            }
        }
    }

    fn rebuild(&self) -> IndexerResult<()> {
        let reset = self.should_reset_view_version()?;
        let mut views = self.shared_index_peer_views()?;
        views.push(self.view());

        let suspension = ViewSuspension::acquire(&self.definition.id, views, reset)?;
        self.ctx
            .metrics
            .record_views_suspended(&self.definition.id, suspension.len());

        let action = self.ctx.actions.create(&self.definition);
        let outcome = match action.execute_full() {
            Ok(()) => self.finish_working(),
            Err(e) => Err(IndexerError::from(e)),
        };
        if let Err(e) = &outcome {
            // INVALID is saved before the views come back.
            self.mark_failed(e);
        }

        let released = suspension.release();
        outcome?;
        released?;
        Ok(())
    }

    /// WORKING -> VALID unless someone changed the status meanwhile.
    fn finish_working(&self) -> IndexerResult<()> {
        self.refresh_state();
        let mut state = self.state()?;
        if state.status == IndexerStatus::Working {
            state.set_status(IndexerStatus::Valid)?;
            self.save_state(&mut state)?;
        } else {
            warn!(
                indexer_id = %self.definition.id,
                status = %state.status,
                "Status changed during reindex, not marking valid"
            );
        }
        Ok(())
    }

    fn mark_failed(&self, cause: &dyn std::fmt::Display) {
        if matches!(self.state.lock().as_ref(), Some(s) if s.status == IndexerStatus::Invalid) {
            return;
        }
        error!(indexer_id = %self.definition.id, error = %cause, "Full reindex failed");
        if let Err(e) = self.change_status(IndexerStatus::Invalid) {
            error!(indexer_id = %self.definition.id, error = %e, "Failed to save invalid status");
        }
    }

    fn apply_changelog(&self, view: &dyn View, from: u64, to: u64) -> IndexerResult<usize> {
        let ids = view.changed_ids(from, to)?;
        if !ids.is_empty() {
            self.ctx.actions.create(&self.definition).execute_list(&ids)?;
            self.ctx
                .metrics
                .record_rows_reindexed(&self.definition.id, ids.len());
        }
        view.set_version_id(to)?;
        Ok(ids.len())
    }
}

/// Saves INVALID if a rebuild unwinds while WORKING is persisted.
struct InvalidateOnUnwind<'a> {
    indexer: &'a Indexer,
}

impl Drop for InvalidateOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.indexer.mark_failed(&"rebuild panicked");
        }
    }
}

impl IndexerApi for Indexer {
    fn id(&self) -> &str {
        &self.definition.id
    }

    fn title(&self) -> &str {
        &self.definition.title
    }

    fn description(&self) -> &str {
        &self.definition.description
    }

    fn status(&self) -> IndexerResult<IndexerStatus> {
        let view_state = self.view().state()?;
        if view_state.is_enabled() && view_state.status == ViewStatus::Working {
            return Ok(IndexerStatus::Working);
        }
        Ok(self.state()?.status)
    }

    fn is_scheduled(&self) -> IndexerResult<bool> {
        Ok(self.view().is_enabled()?)
    }

    fn latest_updated(&self) -> IndexerResult<Option<DateTime<Utc>>> {
        let own = self.state()?.updated;
        let view = self.view();
        if !view.is_enabled()? {
            return Ok(own);
        }
        Ok(match (own, view.updated()?) {
            (Some(own), Some(view)) => Some(own.max(view)),
            (own, view) => own.or(view),
        })
    }

    fn reindex_all(&self) -> IndexerResult<ReindexOutcome> {
        let started = Instant::now();
        let result = self.run_full_reindex();
        let kind = match &result {
            Ok(ReindexOutcome::Completed) => ReindexResultKind::Completed,
            Ok(_) => ReindexResultKind::Skipped,
            Err(_) => ReindexResultKind::Failed,
        };
        self.ctx
            .metrics
            .record_reindex(&self.definition.id, kind, started.elapsed());
        result
    }

    fn reindex_row(&self, id: EntityId) -> IndexerResult<()> {
        self.ctx.actions.create(&self.definition).execute_row(id)?;
        self.ctx.metrics.record_rows_reindexed(&self.definition.id, 1);
        let mut state = self.state()?;
        self.save_state(&mut state)
    }

    fn reindex_list(&self, ids: &[EntityId]) -> IndexerResult<()> {
        self.ctx.actions.create(&self.definition).execute_list(ids)?;
        self.ctx
            .metrics
            .record_rows_reindexed(&self.definition.id, ids.len());
        let mut state = self.state()?;
        self.save_state(&mut state)
    }

    fn invalidate(&self) -> IndexerResult<()> {
        self.change_status(IndexerStatus::Invalid)?;
        self.ctx.metrics.record_invalidation(&self.definition.id);
        Ok(())
    }

    fn set_scheduled(&self, scheduled: bool) -> IndexerResult<()> {
        let view = self.view();
        if scheduled {
            view.subscribe()?;
        } else {
            view.unsubscribe()?;
            self.invalidate()?;
        }
        info!(indexer_id = %self.definition.id, scheduled, "Indexer mode changed");
        let mut state = self.state()?;
        self.save_state(&mut state)
    }

    fn set_status(&self, status: IndexerStatus) -> IndexerResult<()> {
        self.refresh_state();
        self.change_status(status)
    }

    fn update_from_changelog(&self) -> IndexerResult<usize> {
        let view = self.view();
        let view_state = view.state()?;
        if !view_state.is_enabled() || view_state.status != ViewStatus::Idle {
            return Ok(0);
        }
        self.refresh_state();
        if self.state()?.status != IndexerStatus::Valid {
            return Ok(0);
        }

        let current = match view.changelog_version() {
            Ok(version) => version,
            Err(ViewError::ChangelogMissing { .. }) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let from = view_state.version_id.unwrap_or(0);
        if from >= current {
            return Ok(0);
        }

        view.set_status(ViewStatus::Working)?;
        let applied = self.apply_changelog(view.as_ref(), from, current);
        let restored = view.set_status(ViewStatus::Idle);

        match applied {
            Ok(count) => {
                restored?;
                debug!(indexer_id = %self.definition.id, from, to = current, count, "Changelog applied");
                Ok(count)
            }
            Err(e) => {
                if let Err(restore_err) = restored {
                    error!(
                        indexer_id = %self.definition.id,
                        error = %restore_err,
                        "Failed to reset view status after changelog failure"
                    );
                }
                Err(e)
            }
        }
    }
}
