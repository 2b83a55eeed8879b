//! Metadata trailer stored in the last bytes of every slot.
//!
//! The bootloader and the application are built separately and agree on this
//! record only through its byte layout, so the encoding here is the contract:
//!
//! | offset | field      | encoding                                          |
//! |--------|------------|---------------------------------------------------|
//! | 0      | magic      | `0xABCD1234`, little-endian                       |
//! | 4      | version    | `major << 24 \| minor << 16 \| revision << 8 \| build` |
//! | 8      | checksum   | CRC-32 of the first `size` body bytes             |
//! | 12     | size       | body length in bytes                              |
//! | 16     | status     | `1` = Valid, anything else = Invalid              |
//! | 20     | reserved   | three words, preserved across status updates      |

use serde::{Deserialize, Serialize};

/// Sentinel distinguishing an initialised trailer from erased or garbage storage.
pub const TRAILER_MAGIC: u32 = 0xABCD_1234;

/// Size of the trailer record in bytes.
pub const TRAILER_SIZE: usize = 32;

const WORDS: usize = TRAILER_SIZE / 4;

/// Boot eligibility flag recorded in the trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum SlotStatus {
    /// Slot must not be booted.
    #[default]
    Invalid = 0,
    /// Slot holds a complete image.
    Valid = 1,
}

impl SlotStatus {
    /// Decode the raw status word.
    ///
    /// Only the exact Valid value counts as Valid; erased (`0xFFFFFFFF`) or
    /// garbage words decode as Invalid.
    #[must_use]
    pub fn from_raw(value: u32) -> Self {
        if value == SlotStatus::Valid as u32 {
            SlotStatus::Valid
        } else {
            SlotStatus::Invalid
        }
    }

    /// Raw value written to storage.
    #[must_use]
    pub fn to_raw(self) -> u32 {
        self as u32
    }
}

/// Decoded metadata trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
    /// Sentinel, [`TRAILER_MAGIC`] when initialised
    pub magic: u32,
    /// Packed firmware version
    pub version: u32,
    /// CRC-32 of the body
    pub checksum: u32,
    /// Body length in bytes
    pub size: u32,
    /// Boot eligibility
    pub status: SlotStatus,
    /// Reserved words, kept as read
    pub reserved: [u32; 3],
}

impl Trailer {
    /// Build a Valid trailer for a freshly written body.
    #[must_use]
    pub fn new(version: u32, checksum: u32, size: u32) -> Self {
        Self {
            magic: TRAILER_MAGIC,
            version,
            checksum,
            size,
            status: SlotStatus::Valid,
            reserved: [0; 3],
        }
    }

    /// Whether the magic field carries the sentinel.
    #[must_use]
    pub fn has_valid_magic(&self) -> bool {
        self.magic == TRAILER_MAGIC
    }

    /// Whether the trailer marks the slot as bootable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.has_valid_magic() && self.status == SlotStatus::Valid
    }

    /// Encode to the on-storage byte layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; TRAILER_SIZE] {
        let [r0, r1, r2] = self.reserved;
        let words: [u32; WORDS] = [
            self.magic,
            self.version,
            self.checksum,
            self.size,
            self.status.to_raw(),
            r0,
            r1,
            r2,
        ];

        let mut out = [0u8; TRAILER_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    /// Decode from the on-storage byte layout without validating the magic.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; TRAILER_SIZE]) -> Self {
        let mut words = [0u32; WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(chunk);
            *word = u32::from_le_bytes(raw);
        }

        let [magic, version, checksum, size, status, r0, r1, r2] = words;
        Self {
            magic,
            version,
            checksum,
            size,
            status: SlotStatus::from_raw(status),
            reserved: [r0, r1, r2],
        }
    }
}
