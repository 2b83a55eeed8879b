//! Slot-level erase, write, verify and status primitives.
//!
//! Nothing here retries. The first failing block or word is reported to the
//! caller with the slot and absolute address it concerns.

use tracing::{debug, info, warn};

use crate::checksum::Checksum;
use crate::error::{LayoutError, PartitionError, PartitionResult, StorageError};
use crate::layout::MemoryMap;
use crate::slot::Slot;
use crate::storage::{PROGRAM_UNIT, Storage};
use crate::trailer::{SlotStatus, TRAILER_SIZE, Trailer};

const UNIT: u32 = PROGRAM_UNIT as u32;
const STATUS_OFFSET: u32 = 16;
const VERIFY_CHUNK: usize = 256;

/// Read path over the two slots.
///
/// This is all the boot selector needs; it never erases or programs.
pub trait SlotReader {
    /// Slot geometry.
    fn layout(&self) -> &MemoryMap;

    /// Slot the running binary was built for, `None` when running from
    /// neither (e.g. the bootloader itself).
    fn current_slot(&self) -> Option<Slot>;

    /// Slot an update is installed into: the other one, or A when the
    /// current slot is unknown.
    fn target_slot(&self) -> Slot {
        self.current_slot().map_or(Slot::A, Slot::other)
    }

    /// Read `buf.len()` bytes starting `offset` bytes into `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::OutOfBounds`] if the range leaves the slot,
    /// or [`PartitionError::ReadFailed`] if storage rejects the read.
    fn read(&mut self, slot: Slot, offset: u32, buf: &mut [u8]) -> PartitionResult<()>;

    /// Read and decode the trailer of `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::BadMagic`] if the stored magic is not the
    /// sentinel, or [`PartitionError::ReadFailed`] on a storage failure.
    fn read_trailer(&mut self, slot: Slot) -> PartitionResult<Trailer>;

    /// Whether `slot` holds a Valid trailer whose checksum matches the body.
    fn verify(&mut self, slot: Slot) -> bool;
}

/// Write path over the two slots.
pub trait SlotWriter: SlotReader {
    /// Erase every block of `slot`, in address order.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::EraseFailed`] for the first block that fails.
    fn erase(&mut self, slot: Slot) -> PartitionResult<()>;

    /// Program `data` into the body of `slot` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::OutOfBounds`] if the data would reach the
    /// trailer, or [`PartitionError::WriteFailed`] for the first failing word.
    fn write(&mut self, slot: Slot, offset: u32, data: &[u8]) -> PartitionResult<()>;

    /// Program the trailer of `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::WriteFailed`] for the first failing word.
    fn write_trailer(&mut self, slot: Slot, trailer: &Trailer) -> PartitionResult<()>;

    /// Set the trailer status of `slot` to Valid.
    ///
    /// On NOR flash the status word can only go from Valid to Invalid without
    /// an erase. Re-validating an invalidated slot fails with
    /// [`PartitionError::WriteFailed`]; erase and reinstall the slot instead.
    ///
    /// # Errors
    ///
    /// Returns [`PartitionError::BadMagic`] if the slot has no trailer,
    /// [`PartitionError::WriteFailed`] if the status word does not read back
    /// as written, or a read/write error from the underlying storage.
    fn mark_valid(&mut self, slot: Slot) -> PartitionResult<()>;

    /// Set the trailer status of `slot` to Invalid.
    ///
    /// # Errors
    ///
    /// Same as [`SlotWriter::mark_valid`].
    fn mark_invalid(&mut self, slot: Slot) -> PartitionResult<()>;
}

impl<R: SlotReader + ?Sized> SlotReader for &mut R {
    fn layout(&self) -> &MemoryMap {
        (**self).layout()
    }

    fn current_slot(&self) -> Option<Slot> {
        (**self).current_slot()
    }

    fn target_slot(&self) -> Slot {
        (**self).target_slot()
    }

    fn read(&mut self, slot: Slot, offset: u32, buf: &mut [u8]) -> PartitionResult<()> {
        (**self).read(slot, offset, buf)
    }

    fn read_trailer(&mut self, slot: Slot) -> PartitionResult<Trailer> {
        (**self).read_trailer(slot)
    }

    fn verify(&mut self, slot: Slot) -> bool {
        (**self).verify(slot)
    }
}

impl<W: SlotWriter + ?Sized> SlotWriter for &mut W {
    fn erase(&mut self, slot: Slot) -> PartitionResult<()> {
        (**self).erase(slot)
    }

    fn write(&mut self, slot: Slot, offset: u32, data: &[u8]) -> PartitionResult<()> {
        (**self).write(slot, offset, data)
    }

    fn write_trailer(&mut self, slot: Slot, trailer: &Trailer) -> PartitionResult<()> {
        (**self).write_trailer(slot, trailer)
    }

    fn mark_valid(&mut self, slot: Slot) -> PartitionResult<()> {
        (**self).mark_valid(slot)
    }

    fn mark_invalid(&mut self, slot: Slot) -> PartitionResult<()> {
        (**self).mark_invalid(slot)
    }
}

/// Partition manager over a [`Storage`] device.
#[derive(Debug)]
pub struct PartitionManager<S> {
    storage: S,
    layout: MemoryMap,
    current: Option<Slot>,
}

impl<S: Storage> PartitionManager<S> {
    /// Create a manager for `layout`, with no current slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout fails [`MemoryMap::validate`].
    pub fn new(storage: S, layout: MemoryMap) -> Result<Self, LayoutError> {
        layout.validate()?;
        Ok(Self {
            storage,
            layout,
            current: None,
        })
    }

    /// Set the slot this binary was linked for.
    #[must_use]
    pub fn running_from(mut self, slot: Option<Slot>) -> Self {
        self.current = slot;
        self
    }

    /// Borrow the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutably borrow the underlying storage.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Consume the manager and return the storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn checked_range(
        &self,
        slot: Slot,
        offset: u32,
        len: usize,
        capacity: u32,
    ) -> PartitionResult<u32> {
        let end = u64::from(offset).saturating_add(len as u64);
        if end > u64::from(capacity) {
            return Err(PartitionError::OutOfBounds {
                slot,
                offset,
                len,
                capacity,
            });
        }
        Ok(self.layout.slot_base(slot).saturating_add(offset))
    }

    fn program(&mut self, slot: Slot, address: u32, word: [u8; PROGRAM_UNIT]) -> PartitionResult<()> {
        self.storage
            .program_word(address, word)
            .map_err(|source| PartitionError::WriteFailed {
                slot,
                address,
                source,
            })
    }

    fn read_at(&mut self, slot: Slot, address: u32, buf: &mut [u8]) -> PartitionResult<()> {
        self.storage
            .read(address, buf)
            .map_err(|source| PartitionError::ReadFailed {
                slot,
                address,
                source,
            })
    }

    fn set_status(&mut self, slot: Slot, status: SlotStatus) -> PartitionResult<()> {
        let trailer = self.read_trailer(slot)?;
        if trailer.status == status {
            debug!("slot {} already marked {:?}", slot, status);
            return Ok(());
        }
        let address = self
            .layout
            .trailer_address(slot)
            .saturating_add(STATUS_OFFSET);
        self.program(slot, address, status.to_raw().to_le_bytes())?;

        let mut stored = [0u8; PROGRAM_UNIT];
        self.read_at(slot, address, &mut stored)?;
        if stored != status.to_raw().to_le_bytes() {
            warn!(
                "slot {} status word reads back {:#010x}, slot needs an erase",
                slot,
                u32::from_le_bytes(stored)
            );
            return Err(PartitionError::WriteFailed {
                slot,
                address,
                source: StorageError::ProgramFailed { address },
            });
        }
        info!("slot {} marked {:?}", slot, status);
        Ok(())
    }

    fn body_checksum(&mut self, slot: Slot, size: u32) -> PartitionResult<u32> {
        let mut hasher = Checksum::new();
        let mut chunk = [0u8; VERIFY_CHUNK];
        let mut offset = 0u32;
        while offset < size {
            let take = (size - offset).min(VERIFY_CHUNK as u32) as usize;
            let (buf, _) = chunk.split_at_mut(take);
            self.read(slot, offset, buf)?;
            hasher.update(buf);
            offset = offset.saturating_add(take as u32);
        }
        Ok(hasher.finalize())
    }
}

impl<S: Storage> SlotReader for PartitionManager<S> {
    fn layout(&self) -> &MemoryMap {
        &self.layout
    }

    fn current_slot(&self) -> Option<Slot> {
        self.current
    }

    fn read(&mut self, slot: Slot, offset: u32, buf: &mut [u8]) -> PartitionResult<()> {
        let address = self.checked_range(slot, offset, buf.len(), self.layout.slot_size)?;
        self.read_at(slot, address, buf)
    }

    fn read_trailer(&mut self, slot: Slot) -> PartitionResult<Trailer> {
        let mut raw = [0u8; TRAILER_SIZE];
        let address = self.layout.trailer_address(slot);
        self.read_at(slot, address, &mut raw)?;

        let trailer = Trailer::from_bytes(&raw);
        if !trailer.has_valid_magic() {
            return Err(PartitionError::BadMagic {
                slot,
                found: trailer.magic,
            });
        }
        Ok(trailer)
    }

    fn verify(&mut self, slot: Slot) -> bool {
        let trailer = match self.read_trailer(slot) {
            Ok(trailer) => trailer,
            Err(err) => {
                debug!("slot {} verify: {}", slot, err);
                return false;
            }
        };
        if trailer.status != SlotStatus::Valid {
            debug!("slot {} verify: status is {:?}", slot, trailer.status);
            return false;
        }
        if trailer.size == 0 || trailer.size > self.layout.body_capacity() {
            debug!("slot {} verify: recorded size {} out of range", slot, trailer.size);
            return false;
        }

        match self.body_checksum(slot, trailer.size) {
            Ok(actual) if actual == trailer.checksum => true,
            Ok(actual) => {
                debug!(
                    "slot {} verify: checksum {:#010x} != recorded {:#010x}",
                    slot, actual, trailer.checksum
                );
                false
            }
            Err(err) => {
                warn!("slot {} verify: body read failed: {}", slot, err);
                false
            }
        }
    }
}

impl<S: Storage> SlotWriter for PartitionManager<S> {
    fn erase(&mut self, slot: Slot) -> PartitionResult<()> {
        let base = self.layout.slot_base(slot);
        let block = self.layout.erase_block_size;
        for index in 0..self.layout.blocks_per_slot() {
            let address = base.saturating_add(index.saturating_mul(block));
            debug!("erasing slot {} block at {:#010x}", slot, address);
            self.storage
                .erase_block(address)
                .map_err(|source| PartitionError::EraseFailed {
                    slot,
                    address,
                    source,
                })?;
        }
        info!("slot {} erased", slot);
        Ok(())
    }

    fn write(&mut self, slot: Slot, offset: u32, data: &[u8]) -> PartitionResult<()> {
        let start = self.checked_range(slot, offset, data.len(), self.layout.body_capacity())?;
        if data.is_empty() {
            return Ok(());
        }

        let lead = (start % UNIT) as usize;
        let mut address = start - start % UNIT;
        let mut rest = data;

        if lead != 0 {
            let mut word = [0u8; PROGRAM_UNIT];
            self.read_at(slot, address, &mut word)?;
            let (head, tail) = rest.split_at(rest.len().min(PROGRAM_UNIT - lead));
            for (dst, src) in word.iter_mut().skip(lead).zip(head) {
                *dst = *src;
            }
            self.program(slot, address, word)?;
            address = address.saturating_add(UNIT);
            rest = tail;
        }

        for chunk in rest.chunks(PROGRAM_UNIT) {
            let mut word = [0u8; PROGRAM_UNIT];
            for (dst, src) in word.iter_mut().zip(chunk) {
                *dst = *src;
            }
            self.program(slot, address, word)?;
            address = address.saturating_add(UNIT);
        }

        debug!(
            "wrote {} bytes to slot {} at offset {:#x}",
            data.len(),
            slot,
            offset
        );
        Ok(())
    }

    fn write_trailer(&mut self, slot: Slot, trailer: &Trailer) -> PartitionResult<()> {
        let mut address = self.layout.trailer_address(slot);
        let bytes = trailer.to_bytes();
        for chunk in bytes.chunks_exact(PROGRAM_UNIT) {
            let mut word = [0u8; PROGRAM_UNIT];
            word.copy_from_slice(chunk);
            self.program(slot, address, word)?;
            address = address.saturating_add(UNIT);
        }
        info!(
            "slot {} trailer written: version {:#010x}, size {}, checksum {:#010x}",
            slot, trailer.version, trailer.size, trailer.checksum
        );
        Ok(())
    }

    fn mark_valid(&mut self, slot: Slot) -> PartitionResult<()> {
        self.set_status(slot, SlotStatus::Valid)
    }

    fn mark_invalid(&mut self, slot: Slot) -> PartitionResult<()> {
        self.set_status(slot, SlotStatus::Invalid)
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use crate::checksum::checksum;
    use crate::memory::MemoryFlash;

    extern crate std;
    use std::boxed::Box;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn manager(current: Option<Slot>) -> Result<PartitionManager<MemoryFlash>, LayoutError> {
        let layout = MemoryMap::DEFAULT;
        Ok(PartitionManager::new(MemoryFlash::for_layout(&layout), layout)?.running_from(current))
    }

    #[test]
    fn test_target_slot_defaults_to_a() -> TestResult {
        assert_eq!(manager(None)?.target_slot(), Slot::A);
        assert_eq!(manager(Some(Slot::A))?.target_slot(), Slot::B);
        assert_eq!(manager(Some(Slot::B))?.target_slot(), Slot::A);
        Ok(())
    }

    #[test]
    fn test_erased_slot_has_bad_magic() -> TestResult {
        let mut partitions = manager(None)?;
        assert_eq!(
            partitions.read_trailer(Slot::B),
            Err(PartitionError::BadMagic {
                slot: Slot::B,
                found: 0xFFFF_FFFF
            })
        );
        assert!(!partitions.verify(Slot::B));
        Ok(())
    }

    #[test]
    fn test_install_then_verify() -> TestResult {
        let mut partitions = manager(Some(Slot::A))?;
        let image = [0xA5u8; 777];
        partitions.erase(Slot::B)?;
        partitions.write(Slot::B, 0, &image)?;
        partitions.write_trailer(Slot::B, &Trailer::new(0x0100_0000, checksum(&image), 777))?;
        assert!(partitions.verify(Slot::B));
        Ok(())
    }

    #[test]
    fn test_unaligned_write_preserves_neighbours() -> TestResult {
        let mut partitions = manager(None)?;
        partitions.write(Slot::A, 0, &[1, 2, 3, 4, 5, 6, 7, 8])?;
        partitions.write(Slot::A, 3, &[0xAA, 0xBB])?;

        let mut back = [0u8; 8];
        partitions.read(Slot::A, 0, &mut back)?;
        assert_eq!(back, [1, 2, 3, 0xAA, 0xBB, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_write_rejects_trailer_overlap() -> TestResult {
        let mut partitions = manager(None)?;
        let capacity = partitions.layout().body_capacity();
        let err = partitions.write(Slot::A, capacity - 2, &[0u8; 4]);
        assert_eq!(
            err,
            Err(PartitionError::OutOfBounds {
                slot: Slot::A,
                offset: capacity - 2,
                len: 4,
                capacity
            })
        );
        Ok(())
    }

    #[test]
    fn test_mark_invalid_only_touches_status() -> TestResult {
        let mut partitions = manager(None)?;
        let mut trailer = Trailer::new(0x0102_0304, 0x1111_2222, 64);
        trailer.reserved = [5, 6, 7];
        partitions.write_trailer(Slot::A, &trailer)?;

        partitions.mark_invalid(Slot::A)?;
        let after = partitions.read_trailer(Slot::A)?;
        assert_eq!(after.status, SlotStatus::Invalid);
        assert_eq!(after.reserved, [5, 6, 7]);
        assert_eq!(after.version, trailer.version);

        partitions.mark_valid(Slot::A)?;
        assert_eq!(partitions.read_trailer(Slot::A)?.status, SlotStatus::Valid);
        Ok(())
    }

    #[test]
    fn test_revalidation_needs_erase_on_nor() -> TestResult {
        let layout = MemoryMap::DEFAULT;
        let mut partitions =
            PartitionManager::new(MemoryFlash::for_layout(&layout).with_bit_clear(), layout)?;
        let body = [0x5Au8; 64];
        partitions.erase(Slot::A)?;
        partitions.write(Slot::A, 0, &body)?;
        partitions.write_trailer(Slot::A, &Trailer::new(1, checksum(&body), 64))?;

        partitions.mark_invalid(Slot::A)?;
        let status = layout.trailer_address(Slot::A) + STATUS_OFFSET;
        assert!(matches!(
            partitions.mark_valid(Slot::A),
            Err(PartitionError::WriteFailed { slot: Slot::A, address, .. }) if address == status
        ));
        assert_eq!(partitions.read_trailer(Slot::A)?.status, SlotStatus::Invalid);
        assert!(!partitions.verify(Slot::A));

        partitions.erase(Slot::A)?;
        partitions.write(Slot::A, 0, &body)?;
        partitions.write_trailer(Slot::A, &Trailer::new(1, checksum(&body), 64))?;
        assert!(partitions.verify(Slot::A));
        Ok(())
    }

    #[test]
    fn test_mark_invalid_without_trailer() -> TestResult {
        let mut partitions = manager(None)?;
        let err = partitions.mark_invalid(Slot::A);
        assert!(matches!(err, Err(ref e) if e.is_bad_magic()));
        Ok(())
    }
}
