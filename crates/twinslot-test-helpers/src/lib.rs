//! Shared test utilities for the twinslot crates.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`mock`] - Recording and scripted collaborators
//! - [`fixtures`] - Layouts, images and provisioned slots
//! - [`prelude`] - Convenience re-exports
//!
//! Only use this crate from `tests/` directories. Unit tests inside the
//! library crates would see a second copy of each library's types.
//!
//! ```rust,ignore
//! use twinslot_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod fixtures;
pub mod mock;
pub mod must;
pub mod prelude;

pub use must::*;
