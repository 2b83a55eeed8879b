//! Step-driven A/B firmware update orchestrator.
//!
//! One cycle acquires a source locator, transfers the image into a staging
//! buffer, checks its embedded version against the running firmware, and
//! installs it into the slot the device is not running from. The install
//! order is fixed:
//!
//! 1. mark the running slot Invalid (see [`InvalidationPolicy`])
//! 2. erase the target slot
//! 3. write the staged image
//! 4. write the target trailer
//! 5. verify the target slot
//!
//! then the device is reset after a configurable delay. The first failure
//! parks the machine in `Failed`; nothing is retried or rolled back.
//!
//! The collaborators ([`Acquisition`], [`Transfer`], [`Presenter`],
//! [`DeviceControl`]) are injected so the whole machine runs against test
//! doubles.
//!
//! # Modules
//!
//! - [`orchestrator`]: the state machine
//! - [`state`]: states and session data
//! - [`collaborators`]: external contracts and [`LogPresenter`]
//! - [`config`]: [`UpdateConfig`] and [`InvalidationPolicy`]
//! - [`locator`]: locator validation
//! - [`progress`]: transfer progress relay
//! - [`error`]: error types

#![no_std]
#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod collaborators;
pub mod config;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod prelude;
pub mod progress;
pub mod state;

pub use collaborators::{
    Acquisition, DeviceControl, LogPresenter, Presenter, StatusKind, Transfer, TransferObserver,
    TransferStatus,
};
pub use config::{InvalidationPolicy, UpdateConfig, UpdateConfigBuilder};
pub use error::{
    AcquisitionError, LocatorError, TransferError, UpdateError, UpdateErrorKind, UpdateResult,
};
pub use locator::Locator;
pub use orchestrator::UpdateOrchestrator;
pub use progress::ProgressRelay;
pub use state::{Session, UpdateState};
