//! Prelude for twinslot-update.
//!
//! This module re-exports the most commonly used types for convenient importing.

pub use crate::collaborators::{
    Acquisition, DeviceControl, LogPresenter, Presenter, StatusKind, Transfer, TransferObserver,
    TransferStatus,
};
pub use crate::config::{InvalidationPolicy, UpdateConfig, UpdateConfigBuilder};
pub use crate::error::{
    AcquisitionError, LocatorError, TransferError, UpdateError, UpdateErrorKind, UpdateResult,
};
pub use crate::locator::Locator;
pub use crate::orchestrator::UpdateOrchestrator;
pub use crate::state::{Session, UpdateState};
