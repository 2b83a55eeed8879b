//! Prelude for twinslot-partition.
//!
//! This module re-exports the most commonly used types for convenient importing.
//!
//! # Example
//!
//! ```rust
//! use twinslot_partition::prelude::*;
//!
//! let layout = MemoryMap::DEFAULT;
//! assert_eq!(layout.trailer_address(Slot::B), 0x0800_FFE0);
//! ```

pub use crate::checksum::{Checksum, checksum};
pub use crate::error::{LayoutError, PartitionError, PartitionResult, StorageError, StorageResult};
pub use crate::layout::{MemoryMap, MemoryMapBuilder};
pub use crate::manager::{PartitionManager, SlotReader, SlotWriter};
pub use crate::slot::Slot;
pub use crate::storage::{PROGRAM_UNIT, Storage};
pub use crate::trailer::{SlotStatus, TRAILER_MAGIC, TRAILER_SIZE, Trailer};

#[cfg(feature = "alloc")]
pub use crate::memory::MemoryFlash;

#[cfg(feature = "embedded-storage")]
pub use crate::nor::NorFlashStorage;
