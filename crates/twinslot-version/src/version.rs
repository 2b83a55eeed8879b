//! The four-field firmware version.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VersionParseError;

/// Firmware version `major.minor.revision.build`, each field 0-255.
///
/// Ordering is lexicographic over the fields in declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct FirmwareVersion {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Revision
    pub revision: u8,
    /// Build number
    pub build: u8,
}

impl FirmwareVersion {
    /// Size of the embedded record in bytes.
    pub const ENCODED_LEN: usize = 4;

    /// Create a version from its fields.
    #[must_use]
    pub const fn new(major: u8, minor: u8, revision: u8, build: u8) -> Self {
        Self {
            major,
            minor,
            revision,
            build,
        }
    }

    /// Pack into the trailer encoding `major << 24 | minor << 16 | revision << 8 | build`.
    #[must_use]
    pub const fn pack(self) -> u32 {
        u32::from_be_bytes(self.to_bytes())
    }

    /// Unpack the trailer encoding.
    #[must_use]
    pub const fn from_packed(packed: u32) -> Self {
        Self::from_bytes(packed.to_be_bytes())
    }

    /// Embedded record bytes, in field order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.major, self.minor, self.revision, self.build]
    }

    /// Decode an embedded record.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        let [major, minor, revision, build] = bytes;
        Self::new(major, minor, revision, build)
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.revision, self.build
        )
    }
}

impl FromStr for FirmwareVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = [0u8; 4];
        let mut count = 0usize;

        for (index, part) in s.split('.').enumerate() {
            count = index.saturating_add(1);
            let Some(slot) = fields.get_mut(index) else {
                continue;
            };
            *slot = parse_field(index, part)?;
        }

        if count != fields.len() {
            return Err(VersionParseError::FieldCount(count));
        }
        Ok(Self::from_bytes(fields))
    }
}

fn parse_field(index: usize, part: &str) -> Result<u8, VersionParseError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::NotDecimal { index });
    }
    part.parse::<u8>()
        .or(Err(VersionParseError::OutOfRange { index }))
}

/// Compare two versions field by field.
#[must_use]
pub fn compare(a: &FirmwareVersion, b: &FirmwareVersion) -> Ordering {
    a.cmp(b)
}

/// Whether `target` should replace `current`.
///
/// Any difference counts, so downgrades are allowed. Only an identical
/// version blocks the update.
#[must_use]
pub fn needs_update(current: &FirmwareVersion, target: &FirmwareVersion) -> bool {
    compare(target, current) != Ordering::Equal
}
