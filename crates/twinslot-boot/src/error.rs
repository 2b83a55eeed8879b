//! Error types for boot selection.

/// Errors raised while setting up the boot selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

/// Result type for boot selector setup.
pub type BootResult<T = ()> = core::result::Result<T, BootError>;
