//! Validated update source locators.

use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::UpdateConfig;
use crate::error::LocatorError;

/// A source locator that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// Validate `text` against the locator rules in `config`.
    ///
    /// The text must be non-empty, no longer than `max_locator_len`, start
    /// with one of `accepted_schemes` and contain no whitespace or control
    /// characters.
    ///
    /// # Errors
    ///
    /// Returns the first rule the text breaks.
    pub fn parse(text: &str, config: &UpdateConfig) -> Result<Self, LocatorError> {
        if text.is_empty() {
            return Err(LocatorError::Empty);
        }
        if text.len() > config.max_locator_len {
            return Err(LocatorError::TooLong {
                len: text.len(),
                max: config.max_locator_len,
            });
        }
        if let Some((index, _)) = text
            .char_indices()
            .find(|(_, c)| c.is_whitespace() || c.is_control())
        {
            return Err(LocatorError::InvalidCharacter(index));
        }
        if !config
            .accepted_schemes
            .iter()
            .any(|scheme| text.starts_with(scheme.as_str()))
        {
            return Err(LocatorError::UnsupportedScheme);
        }
        Ok(Self(String::from(text)))
    }

    /// The locator text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
