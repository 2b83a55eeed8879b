//! Cortex-M style vector table at the start of a slot.

use serde::{Deserialize, Serialize};
use twinslot_partition::{MemoryMap, PartitionResult, Slot, SlotReader};

const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// First two words of an image: initial stack pointer and reset handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VectorTable {
    /// Value loaded into the main stack pointer
    pub initial_sp: u32,
    /// Address of the reset handler (Thumb bit set)
    pub reset_vector: u32,
}

impl VectorTable {
    /// Size of the two words in bytes.
    pub const LEN: usize = 8;

    /// Decode from little-endian bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        let [s0, s1, s2, s3, r0, r1, r2, r3] = bytes;
        Self {
            initial_sp: u32::from_le_bytes([s0, s1, s2, s3]),
            reset_vector: u32::from_le_bytes([r0, r1, r2, r3]),
        }
    }

    /// Encode to little-endian bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let [s0, s1, s2, s3] = self.initial_sp.to_le_bytes();
        let [r0, r1, r2, r3] = self.reset_vector.to_le_bytes();
        [s0, s1, s2, s3, r0, r1, r2, r3]
    }

    /// Read the vector table of `slot`.
    ///
    /// # Errors
    ///
    /// Returns the partition error if the read fails.
    pub fn read<R: SlotReader + ?Sized>(reader: &mut R, slot: Slot) -> PartitionResult<Self> {
        let mut bytes = [0u8; Self::LEN];
        reader.read(slot, 0, &mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    /// Whether the table could belong to an image linked for `slot`: the
    /// stack pointer is neither zero nor erased, and the reset handler lies
    /// inside the slot.
    #[must_use]
    pub fn is_plausible_for(&self, layout: &MemoryMap, slot: Slot) -> bool {
        let handler = self.reset_vector & !1;
        self.initial_sp != 0
            && self.initial_sp != ERASED_WORD
            && (layout.slot_base(slot)..layout.trailer_address(slot)).contains(&handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order() {
        let table = VectorTable::from_bytes([0x00, 0x50, 0x00, 0x20, 0x01, 0x21, 0x00, 0x08]);
        assert_eq!(table.initial_sp, 0x2000_5000);
        assert_eq!(table.reset_vector, 0x0800_2101);
        assert_eq!(VectorTable::from_bytes(table.to_bytes()), table);
    }

    #[test]
    fn test_plausibility() {
        let layout = MemoryMap::DEFAULT;
        let table = VectorTable {
            initial_sp: 0x2000_5000,
            reset_vector: 0x0800_2101,
        };
        assert!(table.is_plausible_for(&layout, Slot::A));
        assert!(!table.is_plausible_for(&layout, Slot::B));

        let erased = VectorTable::from_bytes([0xFF; 8]);
        assert!(!erased.is_plausible_for(&layout, Slot::A));
    }
}
