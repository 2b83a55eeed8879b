//! Integration tests reading versions back from partition storage.

#![cfg(test)]

use twinslot_partition::prelude::*;
use twinslot_version::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn partitions(current: Option<Slot>) -> Result<PartitionManager<MemoryFlash>, LayoutError> {
    let layout = MemoryMap::DEFAULT;
    Ok(PartitionManager::new(MemoryFlash::for_layout(&layout), layout)?.running_from(current))
}

#[test]
fn test_current_version_reads_running_slot() -> TestResult {
    let mut partitions = partitions(Some(Slot::B))?;
    let mut image = vec![0u8; 0x400];
    if let Some(record) = image.get_mut(0x200..0x204) {
        record.copy_from_slice(&FirmwareVersion::new(2, 5, 0, 11).to_bytes());
    }
    partitions.erase(Slot::B)?;
    partitions.write(Slot::B, 0, &image)?;

    let version = current_version(&mut partitions, EMBEDDED_VERSION_OFFSET)?;
    assert_eq!(version.to_string(), "2.5.0.11");
    Ok(())
}

#[test]
fn test_current_version_without_running_slot() -> TestResult {
    let mut partitions = partitions(None)?;
    assert_eq!(
        current_version(&mut partitions, EMBEDDED_VERSION_OFFSET),
        Err(VersionUnavailable::NoRunningSlot)
    );
    Ok(())
}

#[test]
fn test_embedded_and_trailer_versions_are_independent() -> TestResult {
    let mut partitions = partitions(Some(Slot::A))?;
    let mut image = vec![0u8; 0x300];
    if let Some(record) = image.get_mut(0x200..0x204) {
        record.copy_from_slice(&[1, 0, 0, 0]);
    }
    partitions.erase(Slot::A)?;
    partitions.write(Slot::A, 0, &image)?;
    partitions.write_trailer(
        Slot::A,
        &Trailer::new(
            FirmwareVersion::new(9, 9, 9, 9).pack(),
            checksum(&image),
            image.len() as u32,
        ),
    )?;

    let embedded = current_version(&mut partitions, EMBEDDED_VERSION_OFFSET)?;
    let packed = FirmwareVersion::from_packed(partitions.read_trailer(Slot::A)?.version);
    assert_eq!(embedded, FirmwareVersion::new(1, 0, 0, 0));
    assert_eq!(packed, FirmwareVersion::new(9, 9, 9, 9));
    Ok(())
}

#[test]
fn test_version_serializes_as_fields() -> TestResult {
    let v = FirmwareVersion::new(1, 2, 3, 4);
    let json = serde_json::to_string(&v)?;
    assert_eq!(json, r#"{"major":1,"minor":2,"revision":3,"build":4}"#);
    assert_eq!(serde_json::from_str::<FirmwareVersion>(&json)?, v);
    Ok(())
}
