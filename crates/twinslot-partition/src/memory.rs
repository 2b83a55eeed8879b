//! In-memory flash fake.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;

use crate::error::{StorageError, StorageResult};
use crate::layout::MemoryMap;
use crate::storage::{PROGRAM_UNIT, Storage};

/// Value of an erased byte.
pub const ERASED: u8 = 0xFF;

/// RAM-backed [`Storage`] with fault injection.
///
/// By default programming overwrites the word outright. With
/// [`MemoryFlash::with_bit_clear`] a program can only clear bits, as on NOR
/// flash, and only an erase sets them back.
#[derive(Debug, Clone)]
pub struct MemoryFlash {
    base: u32,
    block_size: u32,
    data: Vec<u8>,
    bit_clear: bool,
    fail_erase_at: Option<u32>,
    fail_program_at: Option<u32>,
    erase_count: usize,
    program_count: usize,
}

impl MemoryFlash {
    /// Create an erased device of `len` bytes starting at `base`.
    #[must_use]
    pub fn new(base: u32, len: usize, block_size: u32) -> Self {
        Self {
            base,
            block_size,
            data: vec![ERASED; len],
            bit_clear: false,
            fail_erase_at: None,
            fail_program_at: None,
            erase_count: 0,
            program_count: 0,
        }
    }

    /// Create an erased device covering the flash base up to the end of the
    /// higher slot in `layout`.
    #[must_use]
    pub fn for_layout(layout: &MemoryMap) -> Self {
        let end = layout.slot_end(crate::Slot::A).max(layout.slot_end(crate::Slot::B));
        let len = end.saturating_sub(layout.flash_base) as usize;
        Self::new(layout.flash_base, len, layout.erase_block_size)
    }

    /// Model NOR programming: each programmed byte becomes `old & new`.
    #[must_use]
    pub fn with_bit_clear(mut self) -> Self {
        self.bit_clear = true;
        self
    }

    /// Whether programs can only clear bits.
    #[must_use]
    pub fn is_bit_clear(&self) -> bool {
        self.bit_clear
    }

    /// Make the next erase of the block at `address` fail.
    pub fn fail_erase_at(&mut self, address: u32) {
        self.fail_erase_at = Some(address);
    }

    /// Make programs of the word at `address` fail.
    pub fn fail_program_at(&mut self, address: u32) {
        self.fail_program_at = Some(address);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&mut self) {
        self.fail_erase_at = None;
        self.fail_program_at = None;
    }

    /// XOR the byte at `address` with `mask`. Returns `false` if the address
    /// is outside the device.
    pub fn corrupt(&mut self, address: u32, mask: u8) -> bool {
        let Ok(range) = self.range(address, 1) else {
            return false;
        };
        match self.data.get_mut(range.start) {
            Some(byte) => {
                *byte ^= mask;
                true
            }
            None => false,
        }
    }

    /// Bytes at `address..address + len`, if inside the device.
    #[must_use]
    pub fn bytes(&self, address: u32, len: usize) -> Option<&[u8]> {
        let range = self.range(address, len).ok()?;
        self.data.get(range)
    }

    /// Whole device contents.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of successful block erases.
    #[must_use]
    pub fn erase_count(&self) -> usize {
        self.erase_count
    }

    /// Number of successful word programs.
    #[must_use]
    pub fn program_count(&self) -> usize {
        self.program_count
    }

    fn range(&self, address: u32, len: usize) -> StorageResult<Range<usize>> {
        let out_of_range = StorageError::OutOfRange {
            address,
            len: u32::try_from(len).unwrap_or(u32::MAX),
        };
        let start = address
            .checked_sub(self.base)
            .ok_or(out_of_range)? as usize;
        let end = start.checked_add(len).ok_or(out_of_range)?;
        if end > self.data.len() {
            return Err(out_of_range);
        }
        Ok(start..end)
    }

    fn region_mut(&mut self, address: u32, len: usize) -> StorageResult<&mut [u8]> {
        let range = self.range(address, len)?;
        self.data
            .get_mut(range)
            .ok_or(StorageError::OutOfRange {
                address,
                len: u32::try_from(len).unwrap_or(u32::MAX),
            })
    }
}

impl Storage for MemoryFlash {
    fn erase_block(&mut self, address: u32) -> StorageResult<()> {
        let offset = address.wrapping_sub(self.base);
        if self.block_size == 0 || offset % self.block_size != 0 {
            return Err(StorageError::Misaligned {
                address,
                alignment: self.block_size,
            });
        }
        if self.fail_erase_at == Some(address) {
            self.fail_erase_at = None;
            return Err(StorageError::EraseFailed { address });
        }
        let len = self.block_size as usize;
        self.region_mut(address, len)?.fill(ERASED);
        self.erase_count = self.erase_count.saturating_add(1);
        Ok(())
    }

    fn program_word(&mut self, address: u32, word: [u8; PROGRAM_UNIT]) -> StorageResult<()> {
        if address.wrapping_sub(self.base) % PROGRAM_UNIT as u32 != 0 {
            return Err(StorageError::Misaligned {
                address,
                alignment: PROGRAM_UNIT as u32,
            });
        }
        if self.fail_program_at == Some(address) {
            return Err(StorageError::ProgramFailed { address });
        }
        let bit_clear = self.bit_clear;
        let cells = self.region_mut(address, PROGRAM_UNIT)?;
        if bit_clear {
            for (cell, new) in cells.iter_mut().zip(word) {
                *cell &= new;
            }
        } else {
            cells.copy_from_slice(&word);
        }
        self.program_count = self.program_count.saturating_add(1);
        Ok(())
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> StorageResult<()> {
        let range = self.range(address, buf.len())?;
        let src = self
            .data
            .get(range)
            .ok_or(StorageError::ReadFailed { address })?;
        buf.copy_from_slice(src);
        Ok(())
    }
}
