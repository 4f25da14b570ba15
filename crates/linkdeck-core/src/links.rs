//! Link collections as served per scope.
//!
//! The server keys every category by identifier (`{"123456": {...}}`); mock
//! servers and fixtures often use plain arrays carrying an `id`/`key` field.
//! Both forms are accepted and the JSON order is kept.

#![allow(missing_docs)]

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;

use crate::address::{Address, GroupNumber, Raw};
use crate::error::CoreError;

/// Server-side state of a link.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SmolStr", into = "SmolStr")]
pub enum LinkStatus {
    #[default]
    Good,
    Broken,
    Working,
    Failed,
    Other(SmolStr),
}

impl LinkStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Good => "Good",
            Self::Broken => "Broken",
            Self::Working => "Working",
            Self::Failed => "Failed",
            Self::Other(text) => text.as_str(),
        }
    }

    /// Whether the link should be flagged and offer a fix.
    #[must_use]
    pub fn needs_fix(&self) -> bool {
        matches!(self, Self::Broken | Self::Failed)
    }
}

impl From<SmolStr> for LinkStatus {
    fn from(text: SmolStr) -> Self {
        match text.as_str() {
            "Good" => Self::Good,
            "Broken" => Self::Broken,
            "Working" => Self::Working,
            "Failed" => Self::Failed,
            _ => Self::Other(text),
        }
    }
}

impl From<LinkStatus> for SmolStr {
    fn from(status: LinkStatus) -> Self {
        match status {
            LinkStatus::Other(text) => text,
            other => SmolStr::new(other.as_str()),
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A link with a local record on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedLink {
    #[serde(default, deserialize_with = "identifier")]
    pub id: SmolStr,
    pub responder_id: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder_name: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder_group: Option<GroupNumber>,
    #[serde(default)]
    pub responder_key: Option<SmolStr>,
    #[serde(default)]
    pub controller_key: Option<SmolStr>,
    #[serde(default)]
    pub data_1: Raw,
    #[serde(default)]
    pub data_2: Raw,
    #[serde(default)]
    pub data_3: GroupNumber,
    #[serde(default)]
    pub status: LinkStatus,
}

/// A link present on the devices but without a local record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndefinedLink {
    #[serde(default, deserialize_with = "identifier")]
    pub key: SmolStr,
    #[serde(alias = "address")]
    pub responder_id: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder_name: Option<SmolStr>,
    #[serde(default)]
    pub data_1: Raw,
    #[serde(default)]
    pub data_2: Raw,
    #[serde(default)]
    pub data_3: GroupNumber,
    #[serde(default)]
    pub responder_key: Option<SmolStr>,
    #[serde(default)]
    pub controller_key: Option<SmolStr>,
}

/// A link record naming a device the catalog does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownLink {
    #[serde(default, deserialize_with = "identifier")]
    pub key: SmolStr,
    pub device: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LinkStatus>,
}

trait Keyed {
    fn assign_key(&mut self, key: SmolStr);
}

impl Keyed for DefinedLink {
    fn assign_key(&mut self, key: SmolStr) {
        if self.id.is_empty() {
            self.id = key;
        }
    }
}

impl Keyed for UndefinedLink {
    fn assign_key(&mut self, key: SmolStr) {
        if self.key.is_empty() {
            self.key = key;
        }
    }
}

impl Keyed for UnknownLink {
    fn assign_key(&mut self, key: SmolStr) {
        if self.key.is_empty() {
            self.key = key;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entries<T> {
    List(Vec<T>),
    Keyed(IndexMap<SmolStr, T>),
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl<T: Keyed> Entries<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::Keyed(items) => items
                .into_iter()
                .map(|(key, mut item)| {
                    item.assign_key(key);
                    item
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLinks {
    #[serde(rename = "definedLinks", default)]
    defined: Entries<DefinedLink>,
    #[serde(rename = "undefinedLinks", default)]
    undefined: Entries<UndefinedLink>,
    #[serde(rename = "unknownLinks", default)]
    unknown: Entries<UnknownLink>,
}

/// The `{scope}/links.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawLinks")]
pub struct LinksCollection {
    #[serde(rename = "definedLinks")]
    pub defined: Vec<DefinedLink>,
    #[serde(rename = "undefinedLinks")]
    pub undefined: Vec<UndefinedLink>,
    #[serde(rename = "unknownLinks")]
    pub unknown: Vec<UnknownLink>,
}

impl From<RawLinks> for LinksCollection {
    fn from(raw: RawLinks) -> Self {
        Self {
            defined: raw.defined.into_vec(),
            undefined: raw.undefined.into_vec(),
            unknown: raw.unknown.into_vec(),
        }
    }
}

impl LinksCollection {
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text)
            .map_err(|err| CoreError::InvalidPayload(format!("links: {err}").into()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defined.is_empty() && self.undefined.is_empty() && self.unknown.is_empty()
    }
}

fn identifier<'de, D>(deserializer: D) -> Result<SmolStr, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Identifier {
        Text(SmolStr),
        Number(u64),
    }

    Ok(match Identifier::deserialize(deserializer)? {
        Identifier::Text(text) => text,
        Identifier::Number(number) => SmolStr::new(number.to_string()),
    })
}
