//! Prelude for twinslot-version.
//!
//! This module re-exports the most commonly used types for convenient importing.

pub use crate::embedded::{EMBEDDED_VERSION_OFFSET, current_version, extract_embedded_version};
pub use crate::error::{VersionParseError, VersionUnavailable};
pub use crate::version::{FirmwareVersion, compare, needs_update};
