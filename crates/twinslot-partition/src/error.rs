//! Error types for storage and partition operations.

use crate::slot::Slot;

/// Errors reported by a [`Storage`](crate::storage::Storage) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Address range falls outside the device.
    #[error("address range {address:#010x}+{len} is outside the storage device")]
    OutOfRange {
        /// First address of the access
        address: u32,
        /// Length of the access in bytes
        len: u32,
    },

    /// Address is not aligned to the erase block or program unit.
    #[error("address {address:#010x} is not aligned to {alignment} bytes")]
    Misaligned {
        /// Offending address
        address: u32,
        /// Required alignment
        alignment: u32,
    },

    /// Hardware erase of a block failed.
    #[error("erase of block at {address:#010x} failed")]
    EraseFailed {
        /// Block address
        address: u32,
    },

    /// Hardware program of a word failed.
    #[error("program of word at {address:#010x} failed")]
    ProgramFailed {
        /// Word address
        address: u32,
    },

    /// Read-back failed.
    #[error("read at {address:#010x} failed")]
    ReadFailed {
        /// Read address
        address: u32,
    },
}

/// A specialized `Result` type for storage operations.
pub type StorageResult<T = ()> = core::result::Result<T, StorageError>;

/// Errors surfaced by the partition manager.
///
/// Every variant names the slot it concerns. No operation retries internally,
/// so the first failing block or word is what gets reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    /// Erasing a slot stopped at the first failing block.
    #[error("erase of slot {slot} failed at {address:#010x}")]
    EraseFailed {
        /// Slot being erased
        slot: Slot,
        /// Block that failed
        address: u32,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },

    /// Programming the slot body or trailer failed.
    #[error("write to slot {slot} failed at {address:#010x}")]
    WriteFailed {
        /// Slot being written
        slot: Slot,
        /// Word that failed
        address: u32,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },

    /// Reading from the slot failed.
    #[error("read from slot {slot} failed at {address:#010x}")]
    ReadFailed {
        /// Slot being read
        slot: Slot,
        /// Read address
        address: u32,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },

    /// The requested range does not fit in the slot.
    #[error("{len} bytes at offset {offset:#x} exceed slot {slot} capacity of {capacity} bytes")]
    OutOfBounds {
        /// Slot addressed
        slot: Slot,
        /// Offset within the slot
        offset: u32,
        /// Requested length
        len: usize,
        /// Capacity that was exceeded
        capacity: u32,
    },

    /// The trailer does not carry the sentinel magic (erased or garbage storage).
    #[error("slot {slot} trailer has bad magic {found:#010x}")]
    BadMagic {
        /// Slot inspected
        slot: Slot,
        /// Value found in the magic field
        found: u32,
    },
}

impl PartitionError {
    /// The slot the error concerns.
    #[must_use]
    pub fn slot(&self) -> Slot {
        match self {
            PartitionError::EraseFailed { slot, .. }
            | PartitionError::WriteFailed { slot, .. }
            | PartitionError::ReadFailed { slot, .. }
            | PartitionError::OutOfBounds { slot, .. }
            | PartitionError::BadMagic { slot, .. } => *slot,
        }
    }

    /// Whether the slot simply has no initialised trailer.
    #[must_use]
    pub fn is_bad_magic(&self) -> bool {
        matches!(self, PartitionError::BadMagic { .. })
    }
}

/// A specialized `Result` type for partition operations.
pub type PartitionResult<T = ()> = core::result::Result<T, PartitionError>;

/// Errors found while validating a [`MemoryMap`](crate::layout::MemoryMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// Erase block size is zero or not a multiple of the program unit.
    #[error("erase block size {0} must be a non-zero multiple of the program unit")]
    InvalidBlockSize(u32),

    /// Slot size is not a whole number of erase blocks.
    #[error("slot size {slot_size} is not a multiple of the erase block size {block_size}")]
    SlotSizeNotBlockAligned {
        /// Configured slot size
        slot_size: u32,
        /// Configured erase block size
        block_size: u32,
    },

    /// Slot is too small to hold a trailer and a body.
    #[error("slot size {0} cannot hold the metadata trailer")]
    SlotTooSmall(u32),

    /// Slot base address is not on an erase block boundary.
    #[error("slot {slot} base {base:#010x} is not erase-block aligned")]
    MisalignedBase {
        /// Slot concerned
        slot: Slot,
        /// Configured base address
        base: u32,
    },

    /// Slot A and slot B overlap.
    #[error("slot A and slot B overlap")]
    Overlap,

    /// Slot range lies below the flash base or wraps the address space.
    #[error("slot {0} lies outside the addressable flash range")]
    OutOfRange(Slot),
}
