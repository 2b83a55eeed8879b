//! Configuration types for the update orchestrator.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use twinslot_version::EMBEDDED_VERSION_OFFSET;

use crate::error::{UpdateError, UpdateResult};

/// When the running slot is marked Invalid during an install.
///
/// Invalidating before the erase means a failed or interrupted install can
/// leave no bootable slot; the boot selector then halts instead of silently
/// falling back to the old image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationPolicy {
    /// Invalidate the running slot before the target is erased.
    #[default]
    BeforeErase,
    /// Invalidate the running slot only after the target verifies.
    AfterVerify,
    /// Never touch the running slot.
    Never,
}

/// Update orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Time allowed for acquiring a locator, in milliseconds.
    ///
    /// Default: 30 000 ms.
    pub acquisition_timeout_ms: u32,

    /// Delay between reaching `Complete` and resetting, in milliseconds.
    ///
    /// Default: 2 000 ms.
    pub reset_delay_ms: u32,

    /// Offset of the embedded version record inside the image.
    pub embedded_version_offset: u32,

    /// Locator prefixes accepted as update sources.
    pub accepted_schemes: Vec<String>,

    /// Longest locator accepted, in bytes.
    pub max_locator_len: usize,

    /// When the running slot is invalidated.
    pub invalidation: InvalidationPolicy,
}

impl UpdateConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> UpdateConfigBuilder {
        UpdateConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> UpdateResult<()> {
        if self.acquisition_timeout_ms == 0 {
            return Err(UpdateError::InvalidConfiguration(
                "acquisition_timeout_ms must be non-zero",
            ));
        }
        if self.reset_delay_ms > 60_000 {
            return Err(UpdateError::InvalidConfiguration(
                "reset_delay_ms must not exceed 60000",
            ));
        }
        if self.accepted_schemes.is_empty() {
            return Err(UpdateError::InvalidConfiguration(
                "accepted_schemes must not be empty",
            ));
        }
        if self.accepted_schemes.iter().any(String::is_empty) {
            return Err(UpdateError::InvalidConfiguration(
                "accepted_schemes must not contain an empty scheme",
            ));
        }
        if self.max_locator_len == 0 {
            return Err(UpdateError::InvalidConfiguration(
                "max_locator_len must be non-zero",
            ));
        }
        Ok(())
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            acquisition_timeout_ms: 30_000,
            reset_delay_ms: 2_000,
            embedded_version_offset: EMBEDDED_VERSION_OFFSET,
            accepted_schemes: vec![String::from("http://"), String::from("https://")],
            max_locator_len: 256,
            invalidation: InvalidationPolicy::BeforeErase,
        }
    }
}

/// Builder for `UpdateConfig`.
#[derive(Debug, Default)]
pub struct UpdateConfigBuilder {
    config: UpdateConfig,
}

impl UpdateConfigBuilder {
    /// Set the acquisition timeout in milliseconds.
    #[must_use]
    pub fn acquisition_timeout_ms(mut self, ms: u32) -> Self {
        self.config.acquisition_timeout_ms = ms;
        self
    }

    /// Set the reset delay in milliseconds.
    #[must_use]
    pub fn reset_delay_ms(mut self, ms: u32) -> Self {
        self.config.reset_delay_ms = ms;
        self
    }

    /// Set the embedded version offset.
    #[must_use]
    pub fn embedded_version_offset(mut self, offset: u32) -> Self {
        self.config.embedded_version_offset = offset;
        self
    }

    /// Replace the accepted locator schemes.
    #[must_use]
    pub fn accepted_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.accepted_schemes = schemes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum locator length.
    #[must_use]
    pub fn max_locator_len(mut self, len: usize) -> Self {
        self.config.max_locator_len = len;
        self
    }

    /// Set the invalidation policy.
    #[must_use]
    pub fn invalidation(mut self, policy: InvalidationPolicy) -> Self {
        self.config.invalidation = policy;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> UpdateResult<UpdateConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UpdateConfig::default();
        assert_eq!(config.acquisition_timeout_ms, 30_000);
        assert_eq!(config.reset_delay_ms, 2_000);
        assert_eq!(config.embedded_version_offset, 0x200);
        assert_eq!(config.invalidation, InvalidationPolicy::BeforeErase);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_builder_validates() {
        assert_eq!(
            UpdateConfig::builder().acquisition_timeout_ms(0).build(),
            Err(UpdateError::InvalidConfiguration(
                "acquisition_timeout_ms must be non-zero"
            ))
        );
        assert_eq!(
            UpdateConfig::builder()
                .accepted_schemes(Vec::<String>::new())
                .build(),
            Err(UpdateError::InvalidConfiguration(
                "accepted_schemes must not be empty"
            ))
        );
        assert_eq!(
            UpdateConfig::builder().accepted_schemes([""]).build(),
            Err(UpdateError::InvalidConfiguration(
                "accepted_schemes must not contain an empty scheme"
            ))
        );
    }

    #[test]
    fn test_builder_sets_fields() -> UpdateResult<()> {
        let config = UpdateConfig::builder()
            .reset_delay_ms(0)
            .accepted_schemes(["https://"])
            .invalidation(InvalidationPolicy::AfterVerify)
            .build()?;
        assert_eq!(config.reset_delay_ms, 0);
        assert_eq!(config.accepted_schemes, vec![String::from("https://")]);
        assert_eq!(config.invalidation, InvalidationPolicy::AfterVerify);
        Ok(())
    }
}
