//! Update state machine states and per-cycle session data.

use serde::{Deserialize, Serialize};
use twinslot_version::FirmwareVersion;

use crate::collaborators::StatusKind;
use crate::error::UpdateErrorKind;
use crate::locator::Locator;

/// Update state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpdateState {
    /// Waiting for an update request
    #[default]
    Idle,
    /// Acquiring the source locator
    Scanning,
    /// Transferring the image into the staging buffer
    Downloading,
    /// Checking the staged image's embedded version
    Verifying,
    /// Installing into the target slot
    Writing,
    /// Installed and verified; a reset follows
    Complete,
    /// Cycle aborted
    Failed {
        /// Why the cycle stopped
        error: UpdateErrorKind,
    },
}

impl UpdateState {
    /// Whether a cycle is running (cancel is effective).
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            UpdateState::Scanning
                | UpdateState::Downloading
                | UpdateState::Verifying
                | UpdateState::Writing
        )
    }

    /// Whether the machine is parked in `Complete` or `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdateState::Complete | UpdateState::Failed { .. })
    }

    /// Status notification emitted on entering this state.
    #[must_use]
    pub fn status_kind(&self) -> StatusKind {
        match self {
            UpdateState::Idle => StatusKind::Idle,
            UpdateState::Scanning => StatusKind::Scanning,
            UpdateState::Downloading => StatusKind::Downloading,
            UpdateState::Verifying => StatusKind::Verifying,
            UpdateState::Writing => StatusKind::Writing,
            UpdateState::Complete => StatusKind::Complete,
            UpdateState::Failed { .. } => StatusKind::Failed,
        }
    }
}

/// State carried across the steps of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub(crate) state: UpdateState,
    pub(crate) error: Option<UpdateErrorKind>,
    pub(crate) locator: Option<Locator>,
    pub(crate) target_version: Option<FirmwareVersion>,
}

impl Session {
    /// Current machine state.
    #[must_use]
    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Error recorded for the last failed cycle, cleared on cancel or re-arm.
    #[must_use]
    pub fn error(&self) -> Option<UpdateErrorKind> {
        self.error
    }

    /// Locator acquired for the running cycle.
    #[must_use]
    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    /// Embedded version of the staged image.
    #[must_use]
    pub fn target_version(&self) -> Option<FirmwareVersion> {
        self.target_version
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_and_terminal_are_disjoint() {
        let states = [
            UpdateState::Idle,
            UpdateState::Scanning,
            UpdateState::Downloading,
            UpdateState::Verifying,
            UpdateState::Writing,
            UpdateState::Complete,
            UpdateState::Failed {
                error: UpdateErrorKind::TransferFailed,
            },
        ];
        for state in states {
            assert!(!(state.is_in_progress() && state.is_terminal()));
        }
        assert!(!UpdateState::Idle.is_in_progress());
        assert!(!UpdateState::Idle.is_terminal());
    }

    #[test]
    fn test_session_reset() {
        let mut session = Session {
            state: UpdateState::Failed {
                error: UpdateErrorKind::InvalidSource,
            },
            error: Some(UpdateErrorKind::InvalidSource),
            locator: None,
            target_version: Some(FirmwareVersion::new(1, 0, 0, 0)),
        };
        session.reset();
        assert_eq!(session, Session::default());
        assert_eq!(session.state(), UpdateState::Idle);
    }
}
