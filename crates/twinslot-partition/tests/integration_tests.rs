//! Integration tests for the partition manager against in-memory flash.

#![cfg(test)]

use twinslot_partition::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn partitions(current: Option<Slot>) -> Result<PartitionManager<MemoryFlash>, LayoutError> {
    let layout = MemoryMap::DEFAULT;
    Ok(PartitionManager::new(MemoryFlash::for_layout(&layout), layout)?.running_from(current))
}

mod trailer_format {
    use super::*;

    #[test]
    fn test_trailer_bytes_snapshot() {
        let trailer = Trailer::new(0x0102_0304, 0xDEAD_BEEF, 0x1000);
        insta::assert_snapshot!(
            hex(&trailer.to_bytes()),
            @"3412cdab04030201efbeadde0010000001000000000000000000000000000000"
        );
    }

    #[test]
    fn test_trailer_lands_at_end_of_slot() -> TestResult {
        let mut partitions = partitions(None)?;
        partitions.write_trailer(Slot::B, &Trailer::new(1, 2, 3))?;

        let flash = partitions.storage();
        let stored = flash
            .bytes(0x0800_FFE0, TRAILER_SIZE)
            .ok_or("trailer outside device")?;
        assert_eq!(stored.get(..4), Some(&[0x34, 0x12, 0xCD, 0xAB][..]));
        assert_eq!(flash.bytes(0x0800_FFDC, 4), Some(&[0xFF; 4][..]));
        Ok(())
    }

    #[test]
    fn test_layout_from_json() -> TestResult {
        let json = r#"{
            "flash_base": 134217728,
            "slot_a_base": 134225920,
            "slot_b_base": 134254592,
            "slot_size": 28672,
            "erase_block_size": 1024
        }"#;
        let layout: MemoryMap = serde_json::from_str(json)?;
        assert_eq!(layout, MemoryMap::DEFAULT);
        layout.validate()?;
        Ok(())
    }
}

mod write_path {
    use super::*;

    #[test]
    fn test_tail_is_zero_padded() -> TestResult {
        let mut partitions = partitions(None)?;
        partitions.erase(Slot::A)?;
        partitions.write(Slot::A, 0, &[0x11, 0x22, 0x33, 0x44, 0x55])?;

        let flash = partitions.storage();
        assert_eq!(
            flash.bytes(0x0800_2000, 9),
            Some(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x00, 0x00, 0x00, 0xFF][..])
        );
        Ok(())
    }

    #[test]
    fn test_full_body_capacity_is_writable() -> TestResult {
        let mut partitions = partitions(Some(Slot::A))?;
        let image = vec![0x3C; partitions.layout().body_capacity() as usize];
        partitions.erase(Slot::B)?;
        partitions.write(Slot::B, 0, &image)?;
        partitions.write_trailer(
            Slot::B,
            &Trailer::new(0x0200_0000, checksum(&image), image.len() as u32),
        )?;
        assert!(partitions.verify(Slot::B));
        Ok(())
    }

    #[test]
    fn test_oversized_write_is_rejected() -> TestResult {
        let mut partitions = partitions(None)?;
        let image = vec![0u8; partitions.layout().body_capacity() as usize + 1];
        let result = partitions.write(Slot::A, 0, &image);
        assert!(matches!(result, Err(PartitionError::OutOfBounds { .. })));
        assert_eq!(partitions.storage().program_count(), 0);
        Ok(())
    }

    #[test]
    fn test_erase_stops_at_first_failing_block() -> TestResult {
        let mut partitions = partitions(None)?;
        partitions.storage_mut().fail_erase_at(0x0800_2C00);

        let result = partitions.erase(Slot::A);
        assert_eq!(
            result,
            Err(PartitionError::EraseFailed {
                slot: Slot::A,
                address: 0x0800_2C00,
                source: StorageError::EraseFailed {
                    address: 0x0800_2C00
                },
            })
        );
        assert_eq!(partitions.storage().erase_count(), 3);
        Ok(())
    }

    #[test]
    fn test_program_failure_reports_word_address() -> TestResult {
        let mut partitions = partitions(None)?;
        partitions.storage_mut().fail_program_at(0x0800_2008);

        let result = partitions.write(Slot::A, 0, &[0u8; 16]);
        assert!(matches!(
            result,
            Err(PartitionError::WriteFailed {
                slot: Slot::A,
                address: 0x0800_2008,
                ..
            })
        ));
        assert_eq!(partitions.storage().program_count(), 2);
        Ok(())
    }
}

mod verify_path {
    use super::*;

    fn install(partitions: &mut PartitionManager<MemoryFlash>, slot: Slot, image: &[u8]) -> TestResult {
        partitions.erase(slot)?;
        partitions.write(slot, 0, image)?;
        partitions.write_trailer(
            slot,
            &Trailer::new(0x0100_0000, checksum(image), image.len() as u32),
        )?;
        Ok(())
    }

    #[test]
    fn test_invalid_status_fails_verify() -> TestResult {
        let mut partitions = partitions(None)?;
        install(&mut partitions, Slot::A, &[7u8; 100])?;
        assert!(partitions.verify(Slot::A));

        partitions.mark_invalid(Slot::A)?;
        assert!(!partitions.verify(Slot::A));
        Ok(())
    }

    #[test]
    fn test_zero_or_oversized_recorded_size_fails_verify() -> TestResult {
        let mut partitions = partitions(None)?;
        partitions.write_trailer(Slot::A, &Trailer::new(1, checksum(&[]), 0))?;
        assert!(!partitions.verify(Slot::A));

        partitions.erase(Slot::A)?;
        partitions.write_trailer(Slot::A, &Trailer::new(1, 0, 0x7000))?;
        assert!(!partitions.verify(Slot::A));
        Ok(())
    }

    #[test]
    fn test_bytes_past_recorded_size_are_not_checked() -> TestResult {
        let mut partitions = partitions(None)?;
        install(&mut partitions, Slot::A, &[9u8; 64])?;
        assert!(partitions.storage_mut().corrupt(0x0800_2000 + 200, 0xFF));
        assert!(partitions.verify(Slot::A));
        Ok(())
    }

    #[test]
    fn test_each_slot_verifies_independently() -> TestResult {
        let mut partitions = partitions(None)?;
        install(&mut partitions, Slot::A, &[1u8; 128])?;
        install(&mut partitions, Slot::B, &[2u8; 256])?;
        assert!(partitions.storage_mut().corrupt(0x0800_9000, 0x01));

        assert!(partitions.verify(Slot::A));
        assert!(!partitions.verify(Slot::B));
        Ok(())
    }
}
