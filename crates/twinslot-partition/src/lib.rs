//! A/B partition primitives shared by the bootloader and the application.
//!
//! This crate owns everything both programs must agree on byte-for-byte:
//! - [`layout`]: slot geometry (`MemoryMap`) and the trailer address formula
//! - [`trailer`]: the 32-byte metadata trailer stored at the end of each slot
//! - [`storage`]: the block-granular `Storage` trait the partition code is written against
//! - [`manager`]: `PartitionManager`, the erase/write/verify/mark primitives
//! - [`checksum`]: CRC-32 integrity values over slot bodies
//! - [`memory`]: `MemoryFlash`, an in-memory storage fake (feature `alloc`)
//! - [`nor`]: adapter for `embedded-storage` NOR flash devices (feature `embedded-storage`)
//!
//! # Slot layout
//!
//! ```text
//! slot base                                        slot base + slot size
//! │ firmware body (≤ slot size − 32 bytes)   ...   │ trailer (32 bytes) │
//! ```
//!
//! # Example
//!
//! ```rust
//! use twinslot_partition::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = MemoryMap::DEFAULT;
//! let flash = MemoryFlash::for_layout(&layout);
//! let mut partitions = PartitionManager::new(flash, layout)?.running_from(Some(Slot::A));
//!
//! let image = [0x5Au8; 1000];
//! let target = partitions.target_slot();
//! partitions.erase(target)?;
//! partitions.write(target, 0, &image)?;
//! partitions.write_trailer(target, &Trailer::new(0x0102_0304, checksum(&image), 1000))?;
//! assert!(partitions.verify(target));
//! # Ok(())
//! # }
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod checksum;
pub mod error;
pub mod layout;
pub mod manager;
pub mod prelude;
pub mod slot;
pub mod storage;
pub mod trailer;

#[cfg(feature = "alloc")]
#[cfg_attr(docsrs, doc(cfg(feature = "alloc")))]
pub mod memory;

#[cfg(feature = "embedded-storage")]
#[cfg_attr(docsrs, doc(cfg(feature = "embedded-storage")))]
pub mod nor;

pub use checksum::{Checksum, checksum};
pub use error::{LayoutError, PartitionError, PartitionResult, StorageError, StorageResult};
pub use layout::{MemoryMap, MemoryMapBuilder};
pub use manager::{PartitionManager, SlotReader, SlotWriter};
pub use slot::Slot;
pub use storage::{PROGRAM_UNIT, Storage};
pub use trailer::{SlotStatus, TRAILER_MAGIC, TRAILER_SIZE, Trailer};

#[cfg(feature = "alloc")]
pub use memory::MemoryFlash;
