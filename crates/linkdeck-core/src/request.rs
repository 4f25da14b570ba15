//! Outbound API requests.

#![allow(missing_docs)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::address::{Address, GroupNumber, Raw};
use crate::scope::LinkScope;

pub const CATALOG_PATH: &str = "/modems.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Which document the server answers a request with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Catalog,
    Links,
}

/// Body of `PATCH {scope}/links/definedLinks/{id}.json`.
///
/// `data_3` always carries the responder group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdit {
    pub responder_id: Address,
    pub data_1: Raw,
    pub data_2: Raw,
    pub data_3: GroupNumber,
}

/// Body of `POST {scope}/links/definedLinks.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkImport {
    #[serde(alias = "address")]
    pub responder_id: Address,
    pub group: GroupNumber,
    pub data_1: Raw,
    pub data_2: Raw,
    pub data_3: GroupNumber,
}

/// Settings collection patched by [`ApiRequest::UpdateSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsTarget {
    Modems,
    ModemGroups { modem: Address },
    Devices { modem: Address },
    DeviceGroups { modem: Address, device: Address },
}

impl SettingsTarget {
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Modems => CATALOG_PATH.to_string(),
            Self::ModemGroups { modem } => format!("/modems/{modem}/groups.json"),
            Self::Devices { modem } => format!("/modems/{modem}/devices.json"),
            Self::DeviceGroups { modem, device } => {
                format!("/modems/{modem}/devices/{device}/groups.json")
            }
        }
    }
}

/// Attribute updates keyed by address or group number.
pub type SettingsPatch = IndexMap<SmolStr, IndexMap<SmolStr, Value>>;

/// Every request the console sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    FetchCatalog,
    FetchLinks {
        scope: LinkScope,
    },
    EditLink {
        scope: LinkScope,
        id: SmolStr,
        body: LinkEdit,
    },
    ImportLink {
        scope: LinkScope,
        body: LinkImport,
    },
    DeleteDefinedLink {
        scope: LinkScope,
        id: SmolStr,
    },
    DeleteUndefinedLink {
        scope: LinkScope,
        key: SmolStr,
    },
    DeleteUnknownLink {
        scope: LinkScope,
        key: SmolStr,
    },
    AddDevice {
        modem: Address,
        device: Address,
    },
    UpdateSettings {
        target: SettingsTarget,
        patch: SettingsPatch,
    },
}

impl ApiRequest {
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::FetchCatalog | Self::FetchLinks { .. } => HttpMethod::Get,
            Self::EditLink { .. } | Self::UpdateSettings { .. } => HttpMethod::Patch,
            Self::ImportLink { .. } | Self::AddDevice { .. } => HttpMethod::Post,
            Self::DeleteDefinedLink { .. }
            | Self::DeleteUndefinedLink { .. }
            | Self::DeleteUnknownLink { .. } => HttpMethod::Delete,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::FetchCatalog => CATALOG_PATH.to_string(),
            Self::FetchLinks { scope } => format!("{scope}/links.json"),
            Self::EditLink { scope, id, .. } | Self::DeleteDefinedLink { scope, id } => {
                format!("{scope}/links/definedLinks/{id}.json")
            }
            Self::ImportLink { scope, .. } => format!("{scope}/links/definedLinks.json"),
            Self::DeleteUndefinedLink { scope, key } => {
                format!("{scope}/links/undefinedLinks/{key}.json")
            }
            Self::DeleteUnknownLink { scope, key } => {
                format!("{scope}/links/unknownLinks/{key}.json")
            }
            Self::AddDevice { modem, device } => format!("/modems/{modem}/devices/{device}.json"),
            Self::UpdateSettings { target, .. } => target.path(),
        }
    }

    /// JSON body, if the request carries one.
    #[must_use]
    pub fn body(&self) -> Option<Value> {
        match self {
            Self::EditLink { body, .. } => serde_json::to_value(body).ok(),
            Self::ImportLink { body, .. } => serde_json::to_value(body).ok(),
            Self::UpdateSettings { patch, .. } => serde_json::to_value(patch).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn response_kind(&self) -> ResponseKind {
        match self {
            Self::FetchCatalog | Self::AddDevice { .. } | Self::UpdateSettings { .. } => {
                ResponseKind::Catalog
            }
            _ => ResponseKind::Links,
        }
    }
}
