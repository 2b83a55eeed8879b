//! The version record embedded in the firmware body.

use tracing::debug;
use twinslot_partition::SlotReader;

use crate::error::VersionUnavailable;
use crate::version::FirmwareVersion;

/// Default offset of the embedded record from the start of the body.
pub const EMBEDDED_VERSION_OFFSET: u32 = 0x200;

/// Read the embedded version from a staged image.
///
/// # Errors
///
/// Returns [`VersionUnavailable::ImageTooShort`] if the record does not fit
/// inside `image`.
pub fn extract_embedded_version(
    image: &[u8],
    offset: u32,
) -> Result<FirmwareVersion, VersionUnavailable> {
    let too_short = VersionUnavailable::ImageTooShort {
        offset,
        len: image.len(),
    };
    let start = offset as usize;
    let end = start
        .checked_add(FirmwareVersion::ENCODED_LEN)
        .ok_or(too_short)?;
    let record = image.get(start..end).ok_or(too_short)?;

    let mut bytes = [0u8; FirmwareVersion::ENCODED_LEN];
    bytes.copy_from_slice(record);
    Ok(FirmwareVersion::from_bytes(bytes))
}

/// Read the embedded version of the running slot.
///
/// # Errors
///
/// Returns [`VersionUnavailable::NoRunningSlot`] when the reader has no
/// current slot, or [`VersionUnavailable::Read`] if the slot read fails.
pub fn current_version<R: SlotReader + ?Sized>(
    reader: &mut R,
    offset: u32,
) -> Result<FirmwareVersion, VersionUnavailable> {
    let slot = reader
        .current_slot()
        .ok_or(VersionUnavailable::NoRunningSlot)?;

    let mut bytes = [0u8; FirmwareVersion::ENCODED_LEN];
    reader
        .read(slot, offset, &mut bytes)
        .map_err(VersionUnavailable::Read)?;

    let version = FirmwareVersion::from_bytes(bytes);
    debug!("running slot {} reports version {}", slot, version);
    Ok(version)
}
