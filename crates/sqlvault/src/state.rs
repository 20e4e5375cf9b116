//! Load lifecycle state machine

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::VaultError;

/// Whether the mirror has been populated from the database.
///
/// `NotLoaded → Loading → Loaded` on success; `Loading → DbError` on a
/// database failure. Both `Loaded` and `DbError` are terminal: a vault is
/// loaded at most once, and after a failed load it must be replaced, not
/// retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    DbError,
}

/// The state value behind its own guard, independent of the mirror guard.
/// The lock is held only for the transition itself, never across I/O.
#[derive(Debug)]
pub(crate) struct LoadStateCell {
    state: Mutex<LoadState>,
}

impl LoadStateCell {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LoadState::NotLoaded),
        }
    }

    pub(crate) fn get(&self) -> LoadState {
        *self.lock()
    }

    /// `NotLoaded → Loading`, atomically. Errors without side effect from
    /// any other state, so a second `load` never touches the database.
    pub(crate) fn begin_load(&self) -> Result<(), VaultError> {
        let mut state = self.lock();
        if *state != LoadState::NotLoaded {
            return Err(VaultError::InvalidState {
                expected: LoadState::NotLoaded,
                actual: *state,
            });
        }
        *state = LoadState::Loading;
        Ok(())
    }

    pub(crate) fn complete_load(&self) {
        *self.lock() = LoadState::Loaded;
    }

    pub(crate) fn fail_load(&self) {
        *self.lock() = LoadState::DbError;
    }

    /// Gate for writes: anything but exactly `Loaded` is an error.
    pub(crate) fn require_loaded(&self) -> Result<(), VaultError> {
        let state = self.lock();
        if *state != LoadState::Loaded {
            return Err(VaultError::InvalidState {
                expected: LoadState::Loaded,
                actual: *state,
            });
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, LoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_load_path() {
        let cell = LoadStateCell::new();
        assert_eq!(cell.get(), LoadState::NotLoaded);
        cell.begin_load().unwrap();
        assert_eq!(cell.get(), LoadState::Loading);
        cell.complete_load();
        assert_eq!(cell.get(), LoadState::Loaded);
        cell.require_loaded().unwrap();
    }

    #[test]
    fn begin_load_only_valid_from_not_loaded() {
        let cell = LoadStateCell::new();
        cell.begin_load().unwrap();
        // Loading
        assert!(matches!(
            cell.begin_load(),
            Err(VaultError::InvalidState {
                actual: LoadState::Loading,
                ..
            })
        ));
        cell.complete_load();
        assert!(matches!(
            cell.begin_load(),
            Err(VaultError::InvalidState {
                actual: LoadState::Loaded,
                ..
            })
        ));
    }

    #[test]
    fn db_error_is_terminal() {
        let cell = LoadStateCell::new();
        cell.begin_load().unwrap();
        cell.fail_load();
        assert_eq!(cell.get(), LoadState::DbError);
        assert!(cell.begin_load().is_err());
        assert!(matches!(
            cell.require_loaded(),
            Err(VaultError::InvalidState {
                expected: LoadState::Loaded,
                actual: LoadState::DbError,
            })
        ));
    }

    #[test]
    fn require_loaded_rejects_not_loaded() {
        let cell = LoadStateCell::new();
        assert!(cell.require_loaded().is_err());
    }
}
