//! Integrity values for slot bodies.
//!
//! CRC-32 (IEEE 802.3 polynomial, reflected, `0xFFFFFFFF` init and final xor).
//! This detects corruption only; it is not an authentication mechanism.

/// Compute the integrity value of a complete image.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Incremental checksum for bodies read back from storage in chunks.
#[derive(Clone)]
pub struct Checksum {
    hasher: crc32fast::Hasher,
}

impl Checksum {
    /// Start a new checksum.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Feed the next chunk of the body.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Finish and return the integrity value.
    #[must_use]
    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Checksum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Checksum").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data: [u8; 300] = core::array::from_fn(|i| (i % 251) as u8);
        let mut incremental = Checksum::new();
        for chunk in data.chunks(64) {
            incremental.update(chunk);
        }
        assert_eq!(incremental.finalize(), checksum(&data));
    }
}
