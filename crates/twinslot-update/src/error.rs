//! Error types for the update orchestrator and its collaborators.

use serde::{Deserialize, Serialize};

use crate::state::UpdateState;

/// Why an update cycle ended in `Failed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum UpdateErrorKind {
    /// No locator was acquired before the timeout.
    #[error("source acquisition failed")]
    AcquisitionFailed,
    /// The acquired locator was malformed or used an unsupported scheme.
    #[error("invalid update source")]
    InvalidSource,
    /// The image transfer failed or produced an unusable buffer.
    #[error("image transfer failed")]
    TransferFailed,
    /// No embedded version could be read, or the image is already installed.
    #[error("version check failed")]
    VersionCheckFailed,
    /// The written slot did not verify.
    #[error("integrity check failed")]
    IntegrityCheckFailed,
    /// Erasing the target slot failed.
    #[error("flash erase failed")]
    FlashEraseFailed,
    /// Programming the target slot or a trailer failed.
    #[error("flash write failed")]
    FlashWriteFailed,
}

impl UpdateErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [UpdateErrorKind; 7] = [
        UpdateErrorKind::AcquisitionFailed,
        UpdateErrorKind::InvalidSource,
        UpdateErrorKind::TransferFailed,
        UpdateErrorKind::VersionCheckFailed,
        UpdateErrorKind::IntegrityCheckFailed,
        UpdateErrorKind::FlashEraseFailed,
        UpdateErrorKind::FlashWriteFailed,
    ];
}

/// Misuse of the orchestrator API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    /// A cycle was requested while the machine was not idle.
    #[error("update already in progress (state: {state:?})")]
    UpdateInProgress {
        /// State at the time of the request
        state: UpdateState,
    },

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

/// Result type for orchestrator API calls.
pub type UpdateResult<T = ()> = core::result::Result<T, UpdateError>;

/// Failure reported by an [`Acquisition`](crate::collaborators::Acquisition) source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    /// Nothing was acquired within the timeout.
    #[error("no locator acquired within {timeout_ms} ms")]
    Timeout {
        /// Timeout that elapsed
        timeout_ms: u32,
    },

    /// The acquisition device failed.
    #[error("acquisition device error")]
    Device,
}

/// Failure reported by a [`Transfer`](crate::collaborators::Transfer) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The remote end could not be reached.
    #[error("connection failed")]
    Connect,

    /// The remote end answered with a non-success status.
    #[error("remote returned status {0}")]
    Status(u16),

    /// The image would not fit in the staging buffer.
    #[error("image exceeds capacity of {capacity} bytes")]
    TooLarge {
        /// Staging buffer capacity
        capacity: usize,
    },

    /// The link dropped mid-transfer.
    #[error("transfer interrupted")]
    Interrupted,
}

/// Reasons a locator is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    /// The locator is empty.
    #[error("locator is empty")]
    Empty,

    /// The locator exceeds the configured maximum length.
    #[error("locator is {len} bytes, maximum is {max}")]
    TooLong {
        /// Locator length
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// The locator does not start with an accepted scheme.
    #[error("locator scheme is not accepted")]
    UnsupportedScheme,

    /// The locator contains whitespace or a control character.
    #[error("locator contains an invalid character at byte {0}")]
    InvalidCharacter(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::string::ToString;

    #[test]
    fn test_error_display() {
        assert_eq!(
            UpdateErrorKind::FlashEraseFailed.to_string(),
            "flash erase failed"
        );
        assert_eq!(
            UpdateError::UpdateInProgress {
                state: UpdateState::Downloading
            }
            .to_string(),
            "update already in progress (state: Downloading)"
        );
        assert_eq!(
            LocatorError::TooLong { len: 300, max: 256 }.to_string(),
            "locator is 300 bytes, maximum is 256"
        );
    }

    #[test]
    fn test_seven_distinct_kinds() {
        for (i, a) in UpdateErrorKind::ALL.iter().enumerate() {
            for b in UpdateErrorKind::ALL.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
