use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of one attendance month. Persisted in `attendance_months`;
/// a month with no row is `Viewing`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MonthState {
    Viewing,
    Editing,
    Saved,
    Locked,
}

/// Rejected workflow transitions. The message is what the caller sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TransitionError {
    #[display(fmt = "Month is locked. Unlock it before editing")]
    MonthLocked,
    #[display(fmt = "Attendance is already in edit mode")]
    AlreadyEditing,
    #[display(fmt = "Not in edit mode. Start editing before saving")]
    NotEditing,
    #[display(fmt = "Save the attendance before locking")]
    NotSaved,
    #[display(fmt = "Month is already locked")]
    AlreadyLocked,
    #[display(fmt = "Month is not locked")]
    NotLocked,
}

impl MonthState {
    pub fn begin_edit(self) -> Result<Self, TransitionError> {
        match self {
            MonthState::Locked => Err(TransitionError::MonthLocked),
            MonthState::Editing => Err(TransitionError::AlreadyEditing),
            MonthState::Viewing | MonthState::Saved => Ok(MonthState::Editing),
        }
    }

    pub fn save(self) -> Result<Self, TransitionError> {
        match self {
            MonthState::Editing => Ok(MonthState::Saved),
            MonthState::Locked => Err(TransitionError::MonthLocked),
            MonthState::Viewing | MonthState::Saved => Err(TransitionError::NotEditing),
        }
    }

    pub fn lock(self) -> Result<Self, TransitionError> {
        match self {
            MonthState::Saved => Ok(MonthState::Locked),
            MonthState::Locked => Err(TransitionError::AlreadyLocked),
            MonthState::Viewing | MonthState::Editing => Err(TransitionError::NotSaved),
        }
    }

    pub fn unlock(self) -> Result<Self, TransitionError> {
        match self {
            MonthState::Locked => Ok(MonthState::Viewing),
            _ => Err(TransitionError::NotLocked),
        }
    }

    /// Reports may only be generated once the month is locked.
    pub fn can_export(self) -> bool {
        self == MonthState::Locked
    }

    /// Cell edits are accepted only mid-edit; a locked month never is.
    pub fn accepts_edits(self) -> bool {
        self == MonthState::Editing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn full_cycle_edit_save_lock_unlock() {
        let s = MonthState::Viewing;
        let s = s.begin_edit().unwrap();
        assert_eq!(s, MonthState::Editing);
        let s = s.save().unwrap();
        assert_eq!(s, MonthState::Saved);
        let s = s.lock().unwrap();
        assert_eq!(s, MonthState::Locked);
        let s = s.unlock().unwrap();
        assert_eq!(s, MonthState::Viewing);
    }

    #[test]
    fn locked_month_rejects_edit() {
        assert_eq!(
            MonthState::Locked.begin_edit(),
            Err(TransitionError::MonthLocked)
        );
    }

    #[test]
    fn lock_requires_saved_state() {
        // Locking unsaved edits must be rejected with no state change.
        assert_eq!(MonthState::Editing.lock(), Err(TransitionError::NotSaved));
        assert_eq!(MonthState::Viewing.lock(), Err(TransitionError::NotSaved));
        assert_eq!(MonthState::Saved.lock(), Ok(MonthState::Locked));
    }

    #[test]
    fn unlock_only_from_locked() {
        assert_eq!(MonthState::Saved.unlock(), Err(TransitionError::NotLocked));
        assert_eq!(MonthState::Locked.unlock(), Ok(MonthState::Viewing));
    }

    #[test]
    fn saved_month_can_reenter_editing() {
        assert_eq!(MonthState::Saved.begin_edit(), Ok(MonthState::Editing));
    }

    #[test]
    fn export_gate() {
        assert!(MonthState::Locked.can_export());
        assert!(!MonthState::Saved.can_export());
        assert!(!MonthState::Editing.can_export());
        assert!(!MonthState::Viewing.can_export());
    }

    #[test]
    fn state_round_trips_through_storage_form() {
        assert_eq!(MonthState::Locked.to_string(), "locked");
        assert_eq!(
            MonthState::from_str("editing").unwrap(),
            MonthState::Editing
        );
    }
}
