//! # View Suspension Guard
//!
//! Pauses changelog processing for a set of views around a full rebuild.
//! `acquire` suspends the views, `release` resumes them. A guard dropped
//! without `release` (early return, panic) resumes its views in `Drop`.

use crate::domain::ViewError;
use crate::ports::View;
use std::sync::Arc;
use tracing::{debug, error};

/// Scoped suspension of changelog views.
#[must_use = "dropping the guard resumes the views immediately"]
pub struct ViewSuspension {
    indexer_id: String,
    views: Vec<Arc<dyn View>>,
}

impl ViewSuspension {
    /// Suspend `views` in order.
    ///
    /// With `reset` the watermark is fast-forwarded to the changelog head
    /// (`View::suspend`); without it only the status changes
    /// (`View::mark_suspended`). A view id listed twice is suspended once.
    ///
    /// # Errors
    ///
    /// Returns the first suspension failure. Views suspended before it are
    /// resumed before returning.
    pub fn acquire(
        indexer_id: &str,
        views: Vec<Arc<dyn View>>,
        reset: bool,
    ) -> Result<Self, ViewError> {
        let mut guard = Self {
            indexer_id: indexer_id.to_string(),
            views: Vec::with_capacity(views.len()),
        };
        for view in views {
            if guard.views.iter().any(|v| v.id() == view.id()) {
                continue;
            }
            if reset {
                view.suspend()?;
            } else {
                view.mark_suspended()?;
            }
            debug!(indexer_id, view_id = view.id(), reset, "View suspended for reindex");
            guard.views.push(view);
        }
        Ok(guard)
    }

    /// Number of views held.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether no view is held.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Resume every held view once, in acquisition order.
    ///
    /// All views are attempted; the first failure is returned.
    pub fn release(mut self) -> Result<(), ViewError> {
        let views = std::mem::take(&mut self.views);
        Self::resume_all(&self.indexer_id, views)
    }

    fn resume_all(indexer_id: &str, views: Vec<Arc<dyn View>>) -> Result<(), ViewError> {
        let mut first_error = None;
        for view in views {
            match view.resume() {
                Ok(()) => debug!(indexer_id, view_id = view.id(), "View resumed"),
                Err(e) => {
                    error!(indexer_id, view_id = view.id(), error = %e, "Failed to resume view");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for ViewSuspension {
    fn drop(&mut self) {
        if self.views.is_empty() {
            return;
        }
        let views = std::mem::take(&mut self.views);
        // Failures are already logged by resume_all.
        let _ = Self::resume_all(&self.indexer_id, views);
    }
}
