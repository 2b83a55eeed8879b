//! Layouts, images and provisioned slots.

use twinslot_boot::VectorTable;
use twinslot_partition::{
    LayoutError, MemoryFlash, MemoryMap, PartitionManager, PartitionResult, Slot, SlotWriter,
    Trailer, checksum,
};
use twinslot_version::{EMBEDDED_VERSION_OFFSET, FirmwareVersion};

/// Initial stack pointer written into fixture images.
pub const FIXTURE_SP: u32 = 0x2000_5000;

/// Offset of the reset handler from the slot base in fixture images.
pub const FIXTURE_RESET_OFFSET: u32 = 0x101;

/// Two 1 KiB slots behind a 1 KiB boot region at address zero.
pub fn small_layout() -> MemoryMap {
    MemoryMap {
        flash_base: 0,
        slot_a_base: 0x400,
        slot_b_base: 0x800,
        slot_size: 0x400,
        erase_block_size: 0x100,
    }
}

/// In-memory partitions over `layout`, running from `running`.
///
/// # Errors
///
/// Returns an error if `layout` is invalid.
pub fn memory_partitions(
    layout: MemoryMap,
    running: Option<Slot>,
) -> Result<PartitionManager<MemoryFlash>, LayoutError> {
    Ok(PartitionManager::new(MemoryFlash::for_layout(&layout), layout)?.running_from(running))
}

/// `len` bytes of filler with `version` embedded at `offset`.
pub fn image_with_version(len: usize, version: FirmwareVersion, offset: u32) -> Vec<u8> {
    let mut image: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    let start = offset as usize;
    if let Some(record) = image.get_mut(start..start + FirmwareVersion::ENCODED_LEN) {
        record.copy_from_slice(&version.to_bytes());
    }
    image
}

/// A bootable image for `slot`: a plausible vector table at offset zero and
/// `version` at the default embedded offset.
pub fn firmware_image(
    layout: &MemoryMap,
    slot: Slot,
    version: FirmwareVersion,
    len: usize,
) -> Vec<u8> {
    let mut image = image_with_version(len, version, EMBEDDED_VERSION_OFFSET);
    let vectors = VectorTable {
        initial_sp: FIXTURE_SP,
        reset_vector: layout.slot_base(slot) + FIXTURE_RESET_OFFSET,
    };
    if let Some(head) = image.get_mut(..VectorTable::LEN) {
        head.copy_from_slice(&vectors.to_bytes());
    }
    image
}

/// Erase `slot`, write `image` and a Valid trailer carrying `version`.
///
/// # Errors
///
/// Returns the first partition error.
pub fn provision<W: SlotWriter + ?Sized>(
    partitions: &mut W,
    slot: Slot,
    image: &[u8],
    version: FirmwareVersion,
) -> PartitionResult<()> {
    partitions.erase(slot)?;
    partitions.write(slot, 0, image)?;
    let trailer = Trailer::new(version.pack(), checksum(image), image.len() as u32);
    partitions.write_trailer(slot, &trailer)
}
