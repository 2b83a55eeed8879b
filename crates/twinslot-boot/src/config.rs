//! Boot selector configuration.

use serde::{Deserialize, Serialize};

use crate::error::{BootError, BootResult};

/// Boot selector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    /// Length of the maintenance window before selection, in milliseconds.
    ///
    /// Default: 0 (the window is skipped).
    pub maintenance_window_ms: u32,

    /// How often the maintenance request is polled during the window.
    ///
    /// Default: 10 ms.
    pub poll_interval_ms: u32,
}

impl BootConfig {
    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> BootConfigBuilder {
        BootConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is too long or the poll interval is
    /// unusable for a non-empty window.
    pub fn validate(&self) -> BootResult<()> {
        if self.maintenance_window_ms > 60_000 {
            return Err(BootError::InvalidConfiguration(
                "maintenance_window_ms must not exceed 60000",
            ));
        }
        if self.maintenance_window_ms > 0
            && (self.poll_interval_ms == 0 || self.poll_interval_ms > self.maintenance_window_ms)
        {
            return Err(BootError::InvalidConfiguration(
                "poll_interval_ms must be between 1 and maintenance_window_ms",
            ));
        }
        Ok(())
    }

    /// Whether the maintenance window is skipped.
    #[must_use]
    pub fn skips_maintenance(&self) -> bool {
        self.maintenance_window_ms == 0
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            maintenance_window_ms: 0,
            poll_interval_ms: 10,
        }
    }
}

/// Builder for `BootConfig`.
#[derive(Debug, Default)]
pub struct BootConfigBuilder {
    config: BootConfig,
}

impl BootConfigBuilder {
    /// Set the maintenance window in milliseconds.
    #[must_use]
    pub fn maintenance_window_ms(mut self, ms: u32) -> Self {
        self.config.maintenance_window_ms = ms;
        self
    }

    /// Set the poll interval in milliseconds.
    #[must_use]
    pub fn poll_interval_ms(mut self, ms: u32) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> BootResult<BootConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_skips_window() {
        let config = BootConfig::default();
        assert!(config.skips_maintenance());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            BootConfig::builder().maintenance_window_ms(70_000).build(),
            Err(BootError::InvalidConfiguration(
                "maintenance_window_ms must not exceed 60000"
            ))
        );
        assert_eq!(
            BootConfig::builder()
                .maintenance_window_ms(100)
                .poll_interval_ms(0)
                .build(),
            Err(BootError::InvalidConfiguration(
                "poll_interval_ms must be between 1 and maintenance_window_ms"
            ))
        );
        assert_eq!(
            BootConfig::builder()
                .maintenance_window_ms(500)
                .poll_interval_ms(50)
                .build()
                .map(|c| c.skips_maintenance()),
            Ok(false)
        );
    }
}
