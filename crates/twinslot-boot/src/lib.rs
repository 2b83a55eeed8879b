//! Power-on slot selection.
//!
//! Runs once per boot, before any application code, and shares nothing with
//! the update orchestrator except the trailer format on storage:
//!
//! 1. optionally wait a bounded maintenance window ([`BootConfig`])
//! 2. inspect both slots: a slot is eligible when its trailer has the magic,
//!    is marked Valid and its body checksum matches
//! 3. pick the eligible slot with the greater packed trailer version, slot A
//!    winning ties
//! 4. read the chosen slot's vector table and hand over control through
//!    [`BootControl::jump`], or [`BootControl::halt`] if nothing is bootable
//!
//! An implausible vector table is logged but never stops an eligible slot
//! from booting.
//!
//! The interrupt-disable / stack-pointer / branch sequence lives behind
//! [`BootControl`] so the selection logic runs on the host.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod control;
pub mod error;
pub mod prelude;
pub mod selector;
pub mod vector;

pub use config::{BootConfig, BootConfigBuilder};
pub use control::{BootControl, HaltReason};
pub use error::{BootError, BootResult};
pub use selector::{
    BootOutcome, BootSelector, Ineligible, Selection, SlotReport, inspect, rank, select,
};
pub use vector::VectorTable;
