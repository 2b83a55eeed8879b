//! Slot geometry.
//!
//! A [`MemoryMap`] is build-time configuration: the bootloader and the
//! application must be compiled against identical values, otherwise they
//! disagree about where each trailer lives.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::slot::Slot;
use crate::storage::PROGRAM_UNIT;
use crate::trailer::TRAILER_SIZE;

/// Placement of the two firmware slots in flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryMap {
    /// Start of the flash device.
    pub flash_base: u32,
    /// First address of slot A.
    pub slot_a_base: u32,
    /// First address of slot B.
    pub slot_b_base: u32,
    /// Size of each slot in bytes, trailer included.
    pub slot_size: u32,
    /// Smallest erasable unit in bytes.
    pub erase_block_size: u32,
}

impl MemoryMap {
    /// Reference layout: 8 KiB bootloader followed by two 28 KiB slots on a
    /// device with 1 KiB pages.
    pub const DEFAULT: MemoryMap = MemoryMap {
        flash_base: 0x0800_0000,
        slot_a_base: 0x0800_2000,
        slot_b_base: 0x0800_9000,
        slot_size: 0x7000,
        erase_block_size: 1024,
    };

    /// Create a configuration builder seeded with [`MemoryMap::DEFAULT`].
    #[must_use]
    pub fn builder() -> MemoryMapBuilder {
        MemoryMapBuilder::default()
    }

    /// Validate the layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the erase block size is unusable, a slot is not a
    /// whole number of blocks or cannot hold a trailer, a slot base is
    /// misaligned or below the flash base, or the slots overlap.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let block = self.erase_block_size;
        if block == 0 || block % PROGRAM_UNIT as u32 != 0 {
            return Err(LayoutError::InvalidBlockSize(block));
        }
        if self.slot_size % block != 0 {
            return Err(LayoutError::SlotSizeNotBlockAligned {
                slot_size: self.slot_size,
                block_size: block,
            });
        }
        if self.slot_size <= TRAILER_SIZE as u32 {
            return Err(LayoutError::SlotTooSmall(self.slot_size));
        }

        for slot in Slot::ALL {
            let base = self.slot_base(slot);
            if base < self.flash_base || base.checked_add(self.slot_size).is_none() {
                return Err(LayoutError::OutOfRange(slot));
            }
            if (base - self.flash_base) % block != 0 {
                return Err(LayoutError::MisalignedBase { slot, base });
            }
        }

        let (a, b) = (self.slot_a_base, self.slot_b_base);
        if a < b.saturating_add(self.slot_size) && b < a.saturating_add(self.slot_size) {
            return Err(LayoutError::Overlap);
        }

        Ok(())
    }

    /// First address of `slot`.
    #[must_use]
    pub fn slot_base(&self, slot: Slot) -> u32 {
        match slot {
            Slot::A => self.slot_a_base,
            Slot::B => self.slot_b_base,
        }
    }

    /// One past the last address of `slot`.
    #[must_use]
    pub fn slot_end(&self, slot: Slot) -> u32 {
        self.slot_base(slot).saturating_add(self.slot_size)
    }

    /// Address of the trailer: `slot base + slot size - 32`.
    #[must_use]
    pub fn trailer_address(&self, slot: Slot) -> u32 {
        self.slot_end(slot).saturating_sub(TRAILER_SIZE as u32)
    }

    /// Bytes available to the firmware body.
    #[must_use]
    pub fn body_capacity(&self) -> u32 {
        self.slot_size.saturating_sub(TRAILER_SIZE as u32)
    }

    /// Number of erase blocks per slot.
    #[must_use]
    pub fn blocks_per_slot(&self) -> u32 {
        self.slot_size.checked_div(self.erase_block_size).unwrap_or(0)
    }

    /// Slot whose address range contains `address`, if any.
    ///
    /// The application uses this with its own load address to learn which
    /// slot it is running from.
    #[must_use]
    pub fn slot_containing(&self, address: u32) -> Option<Slot> {
        Slot::ALL
            .into_iter()
            .find(|&slot| (self.slot_base(slot)..self.slot_end(slot)).contains(&address))
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Builder for [`MemoryMap`].
#[derive(Debug, Default)]
pub struct MemoryMapBuilder {
    map: MemoryMap,
}

impl MemoryMapBuilder {
    /// Set the flash device base address.
    #[must_use]
    pub fn flash_base(mut self, address: u32) -> Self {
        self.map.flash_base = address;
        self
    }

    /// Set the base address of slot A.
    #[must_use]
    pub fn slot_a_base(mut self, address: u32) -> Self {
        self.map.slot_a_base = address;
        self
    }

    /// Set the base address of slot B.
    #[must_use]
    pub fn slot_b_base(mut self, address: u32) -> Self {
        self.map.slot_b_base = address;
        self
    }

    /// Set the slot size in bytes.
    #[must_use]
    pub fn slot_size(mut self, bytes: u32) -> Self {
        self.map.slot_size = bytes;
        self
    }

    /// Set the erase block size in bytes.
    #[must_use]
    pub fn erase_block_size(mut self, bytes: u32) -> Self {
        self.map.erase_block_size = bytes;
        self
    }

    /// Build and validate the layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting layout fails [`MemoryMap::validate`].
    pub fn build(self) -> Result<MemoryMap, LayoutError> {
        self.map.validate()?;
        Ok(self.map)
    }
}
