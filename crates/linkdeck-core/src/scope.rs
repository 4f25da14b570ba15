//! Link scopes (controller groups) and page locations.

#![allow(missing_docs)]

use std::fmt;

use smol_str::SmolStr;

use crate::address::{Address, GroupNumber, BASE_GROUP};
use crate::catalog::CatalogIndex;
use crate::error::CoreError;

/// The controller group whose links are listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// A group of a modem: `/modems/{modem}/groups/{group}`.
    Modem { modem: Address, group: GroupNumber },
    /// A group of a device: `/modems/{modem}/devices/{device}/groups/{group}`.
    Device {
        modem: Address,
        device: Address,
        group: GroupNumber,
    },
}

impl LinkScope {
    /// Parses a page location such as `/modems/AABBCC/devices/112233/groups/1/`.
    ///
    /// A location without a group (`/modems/AABBCC`,
    /// `/modems/AABBCC/devices/112233`) scopes group 1. Use
    /// [`LinkScope::from_location_in`] to honour the entity's declared base
    /// group instead.
    pub fn from_location(location: &str) -> Result<Self, CoreError> {
        let (entity, group) = parse_location(location)?;
        Ok(entity.with_group(group.unwrap_or(BASE_GROUP)))
    }

    /// Like [`LinkScope::from_location`], but a location without a group
    /// scopes the entity's `base_group_number` from `index`.
    pub fn from_location_in(location: &str, index: &CatalogIndex) -> Result<Self, CoreError> {
        let (entity, group) = parse_location(location)?;
        let group = group.unwrap_or_else(|| index.base_group(entity.controller()));
        Ok(entity.with_group(group))
    }

    fn with_group(self, group: GroupNumber) -> Self {
        match self {
            Self::Modem { modem, .. } => Self::Modem { modem, group },
            Self::Device { modem, device, .. } => Self::Device {
                modem,
                device,
                group,
            },
        }
    }

    #[must_use]
    pub fn modem(&self) -> &Address {
        match self {
            Self::Modem { modem, .. } | Self::Device { modem, .. } => modem,
        }
    }

    /// Address of the controlling entity (the modem or the device).
    #[must_use]
    pub fn controller(&self) -> &Address {
        match self {
            Self::Modem { modem, .. } => modem,
            Self::Device { device, .. } => device,
        }
    }

    #[must_use]
    pub fn group(&self) -> GroupNumber {
        match self {
            Self::Modem { group, .. } | Self::Device { group, .. } => *group,
        }
    }

    /// Scope path without a trailing slash.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Modem { modem, group } => format!("/modems/{modem}/groups/{group}"),
            Self::Device {
                modem,
                device,
                group,
            } => format!("/modems/{modem}/devices/{device}/groups/{group}"),
        }
    }
}

impl fmt::Display for LinkScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// Entity of the location plus its group, when the location names one.
fn parse_location(location: &str) -> Result<(LinkScope, Option<GroupNumber>), CoreError> {
    let invalid = || CoreError::InvalidScope(SmolStr::new(location));
    let address = |text: &str| Address::parse(text).map_err(|_| invalid());
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    let (entity, rest) = match segments.as_slice() {
        ["modems", modem, "devices", device, rest @ ..] => {
            (device_scope(address(modem)?, address(device)?), rest)
        }
        ["modems", modem, rest @ ..] => (modem_scope(address(modem)?), rest),
        _ => return Err(invalid()),
    };
    let group = match rest {
        [] => None,
        ["groups", number] => Some(parse_group(number).ok_or_else(invalid)?),
        _ => return Err(invalid()),
    };
    Ok((entity, group))
}

fn modem_scope(modem: Address) -> LinkScope {
    LinkScope::Modem {
        modem,
        group: BASE_GROUP,
    }
}

fn device_scope(modem: Address, device: Address) -> LinkScope {
    LinkScope::Device {
        modem,
        device,
        group: BASE_GROUP,
    }
}

fn parse_group(text: &str) -> Option<GroupNumber> {
    if text.is_empty() || text.len() > 3 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
