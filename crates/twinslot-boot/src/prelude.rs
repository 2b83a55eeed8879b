//! Prelude for twinslot-boot.
//!
//! This module re-exports the most commonly used types for convenient importing.

pub use crate::config::{BootConfig, BootConfigBuilder};
pub use crate::control::{BootControl, HaltReason};
pub use crate::error::{BootError, BootResult};
pub use crate::selector::{
    BootOutcome, BootSelector, Ineligible, Selection, SlotReport, inspect, rank, select,
};
pub use crate::vector::VectorTable;
