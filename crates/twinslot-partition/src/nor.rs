//! [`Storage`] adapter for `embedded-storage` NOR flash drivers.

use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};

use crate::error::{StorageError, StorageResult};
use crate::storage::{PROGRAM_UNIT, Storage};

/// Wraps a [`NorFlash`] device whose offset zero sits at absolute address `base`.
#[derive(Debug)]
pub struct NorFlashStorage<F> {
    flash: F,
    base: u32,
    block_size: u32,
}

impl<F: NorFlash> NorFlashStorage<F> {
    /// Wrap `flash`, mapping device offset 0 to `base`.
    ///
    /// `block_size` is the erase granularity of the memory map and must be a
    /// multiple of the device erase size.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Misaligned`] if the block size or program unit
    /// does not fit the device geometry.
    pub fn new(flash: F, base: u32, block_size: u32) -> StorageResult<Self> {
        let erase_size = u32::try_from(F::ERASE_SIZE).unwrap_or(u32::MAX);
        if erase_size == 0 || block_size == 0 || block_size % erase_size != 0 {
            return Err(StorageError::Misaligned {
                address: base,
                alignment: erase_size,
            });
        }
        if F::WRITE_SIZE == 0 || PROGRAM_UNIT % F::WRITE_SIZE != 0 {
            return Err(StorageError::Misaligned {
                address: base,
                alignment: u32::try_from(F::WRITE_SIZE).unwrap_or(u32::MAX),
            });
        }
        Ok(Self {
            flash,
            base,
            block_size,
        })
    }

    /// Release the wrapped device.
    pub fn into_inner(self) -> F {
        self.flash
    }

    fn offset(&self, address: u32, len: usize) -> StorageResult<u32> {
        address
            .checked_sub(self.base)
            .ok_or(StorageError::OutOfRange {
                address,
                len: u32::try_from(len).unwrap_or(u32::MAX),
            })
    }
}

fn map_error<E: NorFlashError>(err: &E, address: u32, len: usize, fallback: StorageError) -> StorageError {
    match err.kind() {
        NorFlashErrorKind::OutOfBounds => StorageError::OutOfRange {
            address,
            len: u32::try_from(len).unwrap_or(u32::MAX),
        },
        NorFlashErrorKind::NotAligned => StorageError::Misaligned {
            address,
            alignment: PROGRAM_UNIT as u32,
        },
        _ => fallback,
    }
}

impl<F: NorFlash> Storage for NorFlashStorage<F> {
    fn erase_block(&mut self, address: u32) -> StorageResult<()> {
        let len = self.block_size as usize;
        let from = self.offset(address, len)?;
        let to = from.checked_add(self.block_size).ok_or(StorageError::OutOfRange {
            address,
            len: self.block_size,
        })?;
        self.flash
            .erase(from, to)
            .map_err(|e| map_error(&e, address, len, StorageError::EraseFailed { address }))
    }

    fn program_word(&mut self, address: u32, word: [u8; PROGRAM_UNIT]) -> StorageResult<()> {
        let offset = self.offset(address, PROGRAM_UNIT)?;
        self.flash
            .write(offset, &word)
            .map_err(|e| map_error(&e, address, PROGRAM_UNIT, StorageError::ProgramFailed { address }))
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> StorageResult<()> {
        let offset = self.offset(address, buf.len())?;
        let len = buf.len();
        self.flash
            .read(offset, buf)
            .map_err(|e| map_error(&e, address, len, StorageError::ReadFailed { address }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_storage::nor_flash::{ErrorType, ReadNorFlash, check_erase, check_read, check_write};

    struct RamNor {
        cells: [u8; 256],
    }

    impl ErrorType for RamNor {
        type Error = NorFlashErrorKind;
    }

    impl ReadNorFlash for RamNor {
        const READ_SIZE: usize = 1;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            check_read(self, offset, bytes.len())?;
            let start = offset as usize;
            let src = self
                .cells
                .get(start..start + bytes.len())
                .ok_or(NorFlashErrorKind::OutOfBounds)?;
            bytes.copy_from_slice(src);
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.cells.len()
        }
    }

    impl NorFlash for RamNor {
        const WRITE_SIZE: usize = 4;
        const ERASE_SIZE: usize = 64;

        fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            check_erase(self, from, to)?;
            self.cells
                .get_mut(from as usize..to as usize)
                .ok_or(NorFlashErrorKind::OutOfBounds)?
                .fill(0xFF);
            Ok(())
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            check_write(self, offset, bytes.len())?;
            let start = offset as usize;
            self.cells
                .get_mut(start..start + bytes.len())
                .ok_or(NorFlashErrorKind::OutOfBounds)?
                .copy_from_slice(bytes);
            Ok(())
        }
    }

    #[test]
    fn test_translates_absolute_addresses() -> StorageResult<()> {
        let mut storage = NorFlashStorage::new(RamNor { cells: [0; 256] }, 0x0800_0000, 64)?;
        storage.erase_block(0x0800_0040)?;
        storage.program_word(0x0800_0044, [9, 8, 7, 6])?;

        let mut buf = [0u8; 8];
        storage.read(0x0800_0040, &mut buf)?;
        assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFF, 9, 8, 7, 6]);
        Ok(())
    }

    #[test]
    fn test_reports_device_errors() -> StorageResult<()> {
        let mut storage = NorFlashStorage::new(RamNor { cells: [0; 256] }, 0x0800_0000, 64)?;
        assert_eq!(
            storage.program_word(0x0800_0100, [0; 4]),
            Err(StorageError::OutOfRange {
                address: 0x0800_0100,
                len: 4
            })
        );
        assert!(matches!(
            storage.read(0x0700_0000, &mut [0u8; 4]),
            Err(StorageError::OutOfRange { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_rejects_block_size_smaller_than_device_erase() {
        let result = NorFlashStorage::new(RamNor { cells: [0; 256] }, 0, 32);
        assert!(matches!(result, Err(StorageError::Misaligned { .. })));
    }
}
