//! Property-based tests for slot read/write and integrity checking.

#![cfg(test)]

use proptest::prelude::*;
use twinslot_partition::prelude::*;

fn small_layout() -> MemoryMap {
    MemoryMap {
        flash_base: 0,
        slot_a_base: 0x400,
        slot_b_base: 0x800,
        slot_size: 0x400,
        erase_block_size: 0x100,
    }
}

fn partitions() -> Result<PartitionManager<MemoryFlash>, LayoutError> {
    let layout = small_layout();
    PartitionManager::new(MemoryFlash::for_layout(&layout), layout)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_write_then_read_is_identity(
        offset in 0u32..0x3E0,
        data in proptest::collection::vec(any::<u8>(), 0..300),
        slot in prop_oneof![Just(Slot::A), Just(Slot::B)],
    ) {
        let mut partitions = partitions()?;
        let capacity = partitions.layout().body_capacity();
        let len = data.len().min((capacity - offset) as usize);
        let data = data.get(..len).unwrap_or_default();

        partitions.write(slot, offset, data)?;
        let mut back = vec![0u8; data.len()];
        partitions.read(slot, offset, &mut back)?;
        prop_assert_eq!(back.as_slice(), data);
    }

    #[test]
    fn prop_single_byte_corruption_fails_verify(
        image in proptest::collection::vec(any::<u8>(), 1..0x3E0),
        index in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let mut partitions = partitions()?.running_from(Some(Slot::A));
        let size = image.len() as u32;
        partitions.erase(Slot::B)?;
        partitions.write(Slot::B, 0, &image)?;
        partitions.write_trailer(Slot::B, &Trailer::new(0x0100_0000, checksum(&image), size))?;
        prop_assert!(partitions.verify(Slot::B));

        let address = small_layout().slot_base(Slot::B) + index.index(image.len()) as u32;
        prop_assert!(partitions.storage_mut().corrupt(address, mask));
        prop_assert!(!partitions.verify(Slot::B));
    }

    #[test]
    fn prop_trailer_encoding_round_trips(
        version in any::<u32>(),
        crc in any::<u32>(),
        size in any::<u32>(),
        reserved in any::<[u32; 3]>(),
    ) {
        let mut trailer = Trailer::new(version, crc, size);
        trailer.reserved = reserved;
        prop_assert_eq!(Trailer::from_bytes(&trailer.to_bytes()), trailer);
    }
}
