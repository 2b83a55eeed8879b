//! Block-granular storage abstraction.
//!
//! The partition manager never dereferences flash addresses directly. It goes
//! through this trait, so the whole core runs unchanged against the on-chip
//! flash controller, an `embedded-storage` device, or [`MemoryFlash`] in tests.
//!
//! [`MemoryFlash`]: crate::memory::MemoryFlash

use crate::error::StorageResult;

/// Width in bytes of one program operation.
pub const PROGRAM_UNIT: usize = 4;

/// Raw erase/program/read access to persistent storage.
///
/// Addresses are absolute (the same values the linker and the memory map use).
/// Implementations block until the hardware operation completes and must not
/// retry on failure.
pub trait Storage {
    /// Erase the block starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is out of range, not block aligned, or
    /// the hardware reports a failure.
    fn erase_block(&mut self, address: u32) -> StorageResult<()>;

    /// Program one [`PROGRAM_UNIT`]-wide word at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is out of range, not word aligned, or
    /// the hardware reports a failure.
    fn program_word(&mut self, address: u32, word: [u8; PROGRAM_UNIT]) -> StorageResult<()>;

    /// Read `buf.len()` bytes starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is outside the device.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> StorageResult<()>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn erase_block(&mut self, address: u32) -> StorageResult<()> {
        (**self).erase_block(address)
    }

    fn program_word(&mut self, address: u32, word: [u8; PROGRAM_UNIT]) -> StorageResult<()> {
        (**self).program_word(address, word)
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> StorageResult<()> {
        (**self).read(address, buf)
    }
}
