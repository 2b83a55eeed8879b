//! Error types for version parsing and lookup.

use twinslot_partition::PartitionError;

/// Reasons a version string is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    /// The text did not contain exactly four dot-separated fields.
    #[error("expected 4 dot-separated fields, found {0}")]
    FieldCount(usize),

    /// A field was empty or contained something other than decimal digits.
    #[error("field {index} is not a decimal number")]
    NotDecimal {
        /// Zero-based field position
        index: usize,
    },

    /// A field exceeded 255.
    #[error("field {index} is out of range 0-255")]
    OutOfRange {
        /// Zero-based field position
        index: usize,
    },
}

/// The version of an image could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VersionUnavailable {
    /// The running binary is not in either slot.
    #[error("running slot is unknown")]
    NoRunningSlot,

    /// The image is too short to contain the embedded record.
    #[error("image of {len} bytes has no version record at offset {offset:#x}")]
    ImageTooShort {
        /// Offset of the embedded record
        offset: u32,
        /// Length of the image
        len: usize,
    },

    /// Reading the record from the slot failed.
    #[error("failed to read embedded version")]
    Read(#[source] PartitionError),
}
