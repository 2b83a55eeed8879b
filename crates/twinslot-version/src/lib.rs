//! Firmware version handling for A/B updates.
//!
//! A firmware version is four independent 8-bit fields
//! (`major.minor.revision.build`) compared lexicographically. Two encodings of
//! it exist on storage:
//!
//! - the packed 32-bit word in the slot trailer ([`FirmwareVersion::pack`]),
//!   read by the boot selector
//! - a raw 4-byte record embedded in the firmware body at a fixed offset
//!   ([`EMBEDDED_VERSION_OFFSET`]), read by the update path
//!
//! Nothing ties the two together; each is written and read on its own.
//!
//! # Example
//!
//! ```rust
//! use twinslot_version::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let current: FirmwareVersion = "1.2.0.7".parse()?;
//! let offered = FirmwareVersion::new(1, 1, 9, 0);
//!
//! assert!(offered < current);
//! assert!(needs_update(&current, &offered));
//! assert_eq!(offered.to_string(), "1.1.9.0");
//! # Ok(())
//! # }
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

pub mod embedded;
pub mod error;
pub mod prelude;
pub mod version;

pub use embedded::{EMBEDDED_VERSION_OFFSET, current_version, extract_embedded_version};
pub use error::{VersionParseError, VersionUnavailable};
pub use version::{FirmwareVersion, compare, needs_update};
