//! Catalog snapshot model, detail resolver and responder roster.

#![allow(missing_docs)]

use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::address::{Address, GroupNumber, Raw, BASE_GROUP};
use crate::error::CoreError;

static EMPTY_DETAILS: EndpointDetails = EndpointDetails {
    name: None,
    responder: false,
    data_1: None,
    data_2: None,
};

/// One of the two schema-interpreted link data fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    /// `data_1`, usually the on level.
    Data1,
    /// `data_2`, usually the ramp rate.
    Data2,
}

impl FieldSlot {
    /// Both slots in rendering order.
    pub const ALL: [FieldSlot; 2] = [FieldSlot::Data1, FieldSlot::Data2];

    /// JSON key of the slot.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Data1 => "data_1",
            Self::Data2 => "data_2",
        }
    }
}

impl fmt::Display for FieldSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

/// Declared schema of a link data field: display name plus label -> raw value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Raw>,
    #[serde(default)]
    pub values: IndexMap<SmolStr, Raw>,
}

impl FieldSchema {
    /// First label declared for `raw`.
    #[must_use]
    pub fn label_for(&self, raw: Raw) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, value)| **value == raw)
            .map(|(label, _)| label.as_str())
    }
}

/// Responder flag and field schemas shared by controllers, devices and groups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndpointDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
    #[serde(default)]
    pub responder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_1: Option<FieldSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_2: Option<FieldSchema>,
}

impl EndpointDetails {
    /// The record returned for endpoints missing from the catalog.
    #[must_use]
    pub fn empty() -> &'static Self {
        &EMPTY_DETAILS
    }

    #[must_use]
    pub fn schema(&self, slot: FieldSlot) -> Option<&FieldSchema> {
        match slot {
            FieldSlot::Data1 => self.data_1.as_ref(),
            FieldSlot::Data2 => self.data_2.as_ref(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &EMPTY_DETAILS
    }
}

/// A numbered group (scene) of a controller or device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(flatten)]
    pub details: EndpointDetails,
    #[serde(flatten)]
    pub attributes: IndexMap<SmolStr, serde_json::Value>,
}

/// A device owned by a controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Device {
    #[serde(flatten)]
    pub details: EndpointDetails,
    #[serde(default, deserialize_with = "group_map")]
    pub groups: IndexMap<GroupNumber, Group>,
    #[serde(flatten)]
    pub attributes: IndexMap<SmolStr, serde_json::Value>,
}

/// A controller ("modem"). Connection settings stay opaque in `settings`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Controller {
    #[serde(flatten)]
    pub details: EndpointDetails,
    #[serde(default, deserialize_with = "group_map")]
    pub groups: IndexMap<GroupNumber, Group>,
    #[serde(default)]
    pub devices: IndexMap<Address, Device>,
    #[serde(flatten)]
    pub settings: IndexMap<SmolStr, serde_json::Value>,
}

// Structs with flattened fields buffer their input, which turns every map key
// into a string; group numbers are parsed here instead.
fn group_map<'de, D>(deserializer: D) -> Result<IndexMap<GroupNumber, Group>, D::Error>
where
    D: Deserializer<'de>,
{
    IndexMap::<SmolStr, Group>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, group)| {
            key.trim()
                .parse::<GroupNumber>()
                .map(|number| (number, group))
                .map_err(|_| serde::de::Error::custom(format!("invalid group number '{key}'")))
        })
        .collect()
}

/// The `/modems.json` document, in served order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    pub controllers: IndexMap<Address, Controller>,
}

impl CatalogSnapshot {
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text)
            .map_err(|err| CoreError::InvalidPayload(format!("catalog: {err}").into()))
    }

    #[must_use]
    pub fn controller(&self, address: &Address) -> Option<&Controller> {
        self.controllers.get(address)
    }
}

/// A `(address, group)` link endpoint that can be selected as a responder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponderRef {
    pub address: Address,
    pub group: GroupNumber,
}

impl ResponderRef {
    #[must_use]
    pub fn new(address: Address, group: GroupNumber) -> Self {
        Self { address, group }
    }

    /// Roster key, `ADDRESS_group`.
    #[must_use]
    pub fn key(&self) -> SmolStr {
        format!("{}_{}", self.address, self.group).into()
    }
}

impl fmt::Display for ResponderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.address, self.group)
    }
}

/// One selectable responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub key: SmolStr,
    pub name: SmolStr,
    pub address: Address,
    pub group: GroupNumber,
}

impl RosterEntry {
    #[must_use]
    pub fn endpoint(&self) -> ResponderRef {
        ResponderRef::new(self.address.clone(), self.group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointSlot {
    Controller(usize),
    Device { controller: usize, device: usize },
}

/// Lookup structures derived from one catalog snapshot.
///
/// The index owns the snapshot it was built from; [`CatalogIndex::load`]
/// replaces both wholesale.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    snapshot: CatalogSnapshot,
    endpoints: IndexMap<Address, EndpointSlot>,
    roster: IndexMap<SmolStr, RosterEntry>,
}

impl CatalogIndex {
    #[must_use]
    pub fn build(snapshot: CatalogSnapshot) -> Self {
        let mut index = Self::default();
        index.load(snapshot);
        index
    }

    /// Replaces the held snapshot and rebuilds the resolver and roster.
    pub fn load(&mut self, snapshot: CatalogSnapshot) {
        self.endpoints = index_endpoints(&snapshot);
        self.roster = IndexMap::new();
        self.snapshot = snapshot;
        self.roster = build_roster(self);
        debug!(
            controllers = self.snapshot.controllers.len(),
            endpoints = self.endpoints.len(),
            responders = self.roster.len(),
            "catalog index rebuilt"
        );
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.controllers.is_empty()
    }

    /// Record that supplies the schema for the endpoint `(address, group)`.
    ///
    /// A declared group wins over the owner's own record. Controllers are
    /// matched before devices, and of several controllers holding the same
    /// device address the first in snapshot order wins. Missing endpoints
    /// resolve to [`EndpointDetails::empty`].
    #[must_use]
    pub fn resolve(&self, address: &Address, group: GroupNumber) -> &EndpointDetails {
        let Some((own, groups)) = self.owner(address) else {
            return EndpointDetails::empty();
        };
        groups.get(&group).map_or(own, |group| &group.details)
    }

    #[must_use]
    pub fn schema(
        &self,
        address: &Address,
        group: GroupNumber,
        slot: FieldSlot,
    ) -> Option<&FieldSchema> {
        self.resolve(address, group).schema(slot)
    }

    /// Name shown for an endpoint: group name, else owner name, else address.
    #[must_use]
    pub fn display_name(&self, address: &Address, group: GroupNumber) -> SmolStr {
        if let Some(name) = &self.resolve(address, group).name {
            return name.clone();
        }
        self.owner(address)
            .and_then(|(own, _)| own.name.clone())
            .unwrap_or_else(|| SmolStr::new(address.as_str()))
    }

    /// Controller owning `address` (the address itself for a controller).
    #[must_use]
    pub fn controller_for(&self, address: &Address) -> Option<&Address> {
        let index = match self.endpoints.get(address)? {
            EndpointSlot::Controller(index) => *index,
            EndpointSlot::Device { controller, .. } => *controller,
        };
        self.snapshot
            .controllers
            .get_index(index)
            .map(|(address, _)| address)
    }

    /// Responders in snapshot order.
    pub fn responders(&self) -> impl Iterator<Item = &RosterEntry> {
        self.roster.values()
    }

    #[must_use]
    pub fn responder(&self, key: &str) -> Option<&RosterEntry> {
        self.roster.get(key)
    }

    #[must_use]
    pub fn responder_count(&self) -> usize {
        self.roster.len()
    }

    /// Group scoped by the bare page of a controller or device: its declared
    /// `base_group_number`, else [`BASE_GROUP`].
    #[must_use]
    pub fn base_group(&self, address: &Address) -> GroupNumber {
        self.attributes(address)
            .and_then(|attributes| attributes.get("base_group_number"))
            .and_then(serde_json::Value::as_u64)
            .and_then(|number| GroupNumber::try_from(number).ok())
            .unwrap_or(BASE_GROUP)
    }

    fn owner(
        &self,
        address: &Address,
    ) -> Option<(&EndpointDetails, &IndexMap<GroupNumber, Group>)> {
        match *self.endpoints.get(address)? {
            EndpointSlot::Controller(index) => {
                let (_, controller) = self.snapshot.controllers.get_index(index)?;
                Some((&controller.details, &controller.groups))
            }
            EndpointSlot::Device { controller, device } => {
                let (_, controller) = self.snapshot.controllers.get_index(controller)?;
                let (_, device) = controller.devices.get_index(device)?;
                Some((&device.details, &device.groups))
            }
        }
    }

    fn attributes(&self, address: &Address) -> Option<&IndexMap<SmolStr, serde_json::Value>> {
        match *self.endpoints.get(address)? {
            EndpointSlot::Controller(index) => {
                let (_, controller) = self.snapshot.controllers.get_index(index)?;
                Some(&controller.settings)
            }
            EndpointSlot::Device { controller, device } => {
                let (_, controller) = self.snapshot.controllers.get_index(controller)?;
                let (_, device) = controller.devices.get_index(device)?;
                Some(&device.attributes)
            }
        }
    }
}

fn index_endpoints(snapshot: &CatalogSnapshot) -> IndexMap<Address, EndpointSlot> {
    let mut endpoints = IndexMap::new();
    for (index, address) in snapshot.controllers.keys().enumerate() {
        endpoints.insert(address.clone(), EndpointSlot::Controller(index));
    }
    for (controller_index, controller) in snapshot.controllers.values().enumerate() {
        for (device_index, address) in controller.devices.keys().enumerate() {
            if let Entry::Vacant(slot) = endpoints.entry(address.clone()) {
                slot.insert(EndpointSlot::Device {
                    controller: controller_index,
                    device: device_index,
                });
            }
        }
    }
    endpoints
}

fn build_roster(index: &CatalogIndex) -> IndexMap<SmolStr, RosterEntry> {
    let mut roster = IndexMap::new();
    for (address, controller) in &index.snapshot.controllers {
        register_owner(&mut roster, index, address, &controller.groups);
        for (device_address, device) in &controller.devices {
            register_owner(&mut roster, index, device_address, &device.groups);
        }
    }
    roster
}

fn register_owner(
    roster: &mut IndexMap<SmolStr, RosterEntry>,
    index: &CatalogIndex,
    address: &Address,
    groups: &IndexMap<GroupNumber, Group>,
) {
    register(roster, index, address, BASE_GROUP);
    for group in groups.keys().filter(|group| **group != BASE_GROUP) {
        register(roster, index, address, *group);
    }
}

// Flags come from the resolved record so the roster agrees with `resolve`,
// including for duplicated addresses where the first owner wins.
fn register(
    roster: &mut IndexMap<SmolStr, RosterEntry>,
    index: &CatalogIndex,
    address: &Address,
    group: GroupNumber,
) {
    if !index.resolve(address, group).responder {
        return;
    }
    let endpoint = ResponderRef::new(address.clone(), group);
    if let Entry::Vacant(slot) = roster.entry(endpoint.key()) {
        let key = slot.key().clone();
        slot.insert(RosterEntry {
            key,
            name: index.display_name(address, group),
            address: endpoint.address,
            group,
        });
    }
}
