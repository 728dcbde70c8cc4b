//! # Changelog Freshness
//!
//! Compares a view's stored watermark to its changelog version.

use crate::domain::ViewError;
use crate::ports::View;

/// Whether the view has applied every changelog version.
///
/// A disabled view, or one whose changelog does not exist yet, counts as up
/// to date. An enabled view that never stored a watermark does not.
pub fn is_view_up_to_date(view: &dyn View) -> Result<bool, ViewError> {
    let state = view.state()?;
    if !state.is_enabled() {
        return Ok(true);
    }
    let current = match view.changelog_version() {
        Ok(version) => version,
        Err(ViewError::ChangelogMissing { .. }) => return Ok(true),
        Err(e) => return Err(e),
    };
    Ok(matches!(state.version_id, Some(applied) if applied >= current))
}

/// Number of changelog versions not yet applied.
pub fn backlog(view: &dyn View) -> Result<u64, ViewError> {
    let state = view.state()?;
    if !state.is_enabled() {
        return Ok(0);
    }
    match view.changelog_version() {
        Ok(current) => Ok(current.saturating_sub(state.version_id.unwrap_or(0))),
        Err(ViewError::ChangelogMissing { .. }) => Ok(0),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DocumentStore, MemoryBackend};
    use crate::ports::ViewRepository;

    fn store() -> DocumentStore<MemoryBackend> {
        DocumentStore::in_memory()
    }

    #[test]
    fn test_disabled_view_is_up_to_date() {
        let store = store();
        store.record_change("v", &[1, 2]).unwrap();
        let view = store.view("v");
        assert!(is_view_up_to_date(view.as_ref()).unwrap());
        assert_eq!(backlog(view.as_ref()).unwrap(), 0);
    }

    #[test]
    fn test_missing_changelog_is_up_to_date() {
        let store = store();
        let mut state = crate::domain::ViewState::new("v");
        state.mode = crate::domain::ViewMode::Enabled;
        store.put_view_state(&state).unwrap();
        let view = store.view("v");
        assert!(matches!(
            view.changelog_version(),
            Err(ViewError::ChangelogMissing { .. })
        ));
        assert!(is_view_up_to_date(view.as_ref()).unwrap());
        assert_eq!(backlog(view.as_ref()).unwrap(), 0);
    }

    #[test]
    fn test_behind_watermark_is_stale() {
        let store = store();
        let view = store.view("v");
        view.subscribe().unwrap();
        view.set_version_id(3).unwrap();
        store.record_change("v", &[1]).unwrap();
        store.record_change("v", &[2]).unwrap();
        store.record_change("v", &[3]).unwrap();
        store.record_change("v", &[4]).unwrap();
        store.record_change("v", &[5]).unwrap();
        assert!(!is_view_up_to_date(view.as_ref()).unwrap());
        assert_eq!(backlog(view.as_ref()).unwrap(), 2);

        view.set_version_id(5).unwrap();
        assert!(is_view_up_to_date(view.as_ref()).unwrap());
    }

    #[test]
    fn test_unset_watermark_is_stale() {
        let store = store();
        let view = store.view("v");
        view.subscribe().unwrap();
        store.record_change("v", &[1]).unwrap();
        let mut state = view.state().unwrap();
        state.version_id = None;
        store.put_view_state(&state).unwrap();
        assert!(!is_view_up_to_date(view.as_ref()).unwrap());
    }
}
