//! Contracts between the orchestrator and the world around it.
//!
//! Acquisition and transfer supply bytes, the presenter receives
//! notifications, and device control performs the final delayed reset. All
//! of them are synchronous: the orchestrator blocks inside the call and a
//! cancel only takes effect at the next step.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{AcquisitionError, TransferError, UpdateErrorKind};
use crate::locator::Locator;

/// Source of update locators (e.g. an optical code scanner).
pub trait Acquisition {
    /// Block for up to `timeout_ms` waiting for a locator.
    ///
    /// The returned text is validated by the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout or device failure.
    fn acquire(&mut self, timeout_ms: u32) -> Result<String, AcquisitionError>;
}

/// Phase reported by a transfer while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Opening the link
    Connecting,
    /// Receiving the body
    Downloading,
    /// Checking the received body
    Verifying,
    /// Transfer finished
    Complete,
    /// Transfer failed
    Failed,
}

/// Receives callbacks while a [`Transfer::fetch`] call runs.
pub trait TransferObserver {
    /// `received` bytes have arrived out of `total`, when the total is known.
    fn on_progress(&mut self, received: usize, total: Option<usize>);

    /// The transfer moved to a new phase.
    fn on_status(&mut self, status: TransferStatus);
}

/// Fetches an image into memory (e.g. HTTP over a serial modem).
pub trait Transfer {
    /// Fetch the image at `locator`, never returning more than `capacity`
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails.
    fn fetch(
        &mut self,
        locator: &Locator,
        capacity: usize,
        observer: &mut dyn TransferObserver,
    ) -> Result<Vec<u8>, TransferError>;
}

/// Status shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Idle
    Idle,
    /// Acquiring a locator
    Scanning,
    /// Transferring the image
    Downloading,
    /// Checking the image
    Verifying,
    /// Writing flash
    Writing,
    /// Update installed
    Complete,
    /// Update failed
    Failed,
    /// About to reset
    Rebooting,
}

/// Operator-facing notification sink (display, LEDs, log).
pub trait Presenter {
    /// Show a status change.
    fn notify_status(&mut self, status: StatusKind);

    /// Show transfer progress, 0-100.
    fn notify_progress(&mut self, percent: u8);

    /// Show a failure.
    fn notify_error(&mut self, kind: UpdateErrorKind);

    /// Show free-form text.
    fn notify_message(&mut self, text: &str);
}

/// Timing and reset primitives.
pub trait DeviceControl {
    /// Busy-wait for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Reset the device.
    ///
    /// Does not return on hardware; test doubles record the call and return.
    fn reset(&mut self);
}

/// [`Presenter`] that writes every notification to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn notify_status(&mut self, status: StatusKind) {
        info!("update status: {:?}", status);
    }

    fn notify_progress(&mut self, percent: u8) {
        info!("update progress: {}%", percent);
    }

    fn notify_error(&mut self, kind: UpdateErrorKind) {
        error!("update error: {}", kind);
    }

    fn notify_message(&mut self, text: &str) {
        info!("update message: {}", text);
    }
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn notify_status(&mut self, status: StatusKind) {
        (**self).notify_status(status);
    }

    fn notify_progress(&mut self, percent: u8) {
        (**self).notify_progress(percent);
    }

    fn notify_error(&mut self, kind: UpdateErrorKind) {
        (**self).notify_error(kind);
    }

    fn notify_message(&mut self, text: &str) {
        (**self).notify_message(text);
    }
}
