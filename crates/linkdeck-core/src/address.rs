//! Device and group addresses.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

use crate::error::CoreError;

/// Group (scene) number of a controller or device.
pub type GroupNumber = u8;

/// Raw byte stored in an ALDB record field (`data_1`, `data_2`, `data_3`).
pub type Raw = u8;

/// Group number under which a controller or device addresses itself.
pub const BASE_GROUP: GroupNumber = 1;

const ADDRESS_LEN: usize = 6;

/// Insteon device address, stored upper-case so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(SmolStr);

impl Address {
    /// Normalises `text` without validating it.
    ///
    /// Catalog and link documents are accepted as served; only page locations
    /// and user input go through [`Address::parse`].
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self(SmolStr::new(text.trim().to_ascii_uppercase()))
    }

    /// Parses a six-digit hexadecimal address.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let trimmed = text.trim();
        if trimmed.len() != ADDRESS_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAddress(SmolStr::new(text)));
        }
        Ok(Self::new(trimmed))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0.as_str())
    }
}

impl From<&str> for Address {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::new(&text))
    }
}
