//! Row view-models and the link edit state machine.
//!
//! A [`Reconciler`] holds the rows of one scope. Rows are rebuilt wholesale
//! from every links collection the server returns; edits never touch the
//! collection itself, they produce an [`ApiRequest`] whose response is
//! reconciled again.

#![allow(missing_docs)]

use smol_str::SmolStr;
use tracing::debug;

use crate::address::{Address, GroupNumber, Raw};
use crate::catalog::{CatalogIndex, FieldSlot, ResponderRef};
use crate::error::CoreError;
use crate::fields::{render_field, FieldControl, SelectControl};
use crate::links::{DefinedLink, LinkStatus, LinksCollection, UndefinedLink, UnknownLink};
use crate::request::{ApiRequest, LinkEdit, LinkImport};
use crate::scope::LinkScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode {
    Viewing,
    Editing,
}

/// Affordances a renderer offers on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Save,
    Cancel,
    Fix,
    Delete,
    Import,
    AddDevice,
}

impl RowAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Edit => "Edit",
            Self::Save => "Save",
            Self::Cancel => "Cancel",
            Self::Fix => "Fix",
            Self::Delete => "Delete",
            Self::Import => "Import",
            Self::AddDevice => "Add Device",
        }
    }
}

/// Stored values of a defined link. `group` is the link's `data_3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkValues {
    pub responder: Address,
    pub group: GroupNumber,
    pub data_1: Raw,
    pub data_2: Raw,
}

impl LinkValues {
    #[must_use]
    pub fn endpoint(&self) -> ResponderRef {
        ResponderRef::new(self.responder.clone(), self.group)
    }

    fn stored(&self, slot: FieldSlot) -> Raw {
        match slot {
            FieldSlot::Data1 => self.data_1,
            FieldSlot::Data2 => self.data_2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowControls {
    pub responder: SelectControl<ResponderRef>,
    pub data_1: FieldControl,
    pub data_2: FieldControl,
}

impl RowControls {
    #[must_use]
    pub fn field(&self, slot: FieldSlot) -> &FieldControl {
        match slot {
            FieldSlot::Data1 => &self.data_1,
            FieldSlot::Data2 => &self.data_2,
        }
    }

    fn field_mut(&mut self, slot: FieldSlot) -> &mut FieldControl {
        match slot {
            FieldSlot::Data1 => &mut self.data_1,
            FieldSlot::Data2 => &mut self.data_2,
        }
    }
}

/// An editable row for a defined link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedRow {
    pub id: SmolStr,
    pub responder_name: SmolStr,
    pub original: LinkValues,
    pub status: LinkStatus,
    pub mode: RowMode,
    pub controls: RowControls,
    initial_controls: RowControls,
}

impl DefinedRow {
    fn build(index: &CatalogIndex, link: &DefinedLink) -> Self {
        let original = LinkValues {
            responder: link.responder_id.clone(),
            group: link.data_3,
            data_1: link.data_1,
            data_2: link.data_2,
        };
        let responder_name = link
            .responder_name
            .clone()
            .unwrap_or_else(|| index.display_name(&original.responder, original.group));
        let controls = RowControls {
            responder: responder_select(index, &original, &responder_name),
            data_1: stored_field(index, &original, FieldSlot::Data1),
            data_2: stored_field(index, &original, FieldSlot::Data2),
        };
        Self {
            id: link.id.clone(),
            responder_name,
            original,
            status: link.status.clone(),
            mode: RowMode::Viewing,
            initial_controls: controls.clone(),
            controls,
        }
    }

    /// Controls are only interactive while editing.
    #[must_use]
    pub fn disabled(&self) -> bool {
        self.mode == RowMode::Viewing
    }

    /// Warning style for broken links; cleared while editing.
    #[must_use]
    pub fn warning(&self) -> bool {
        self.mode == RowMode::Viewing && self.status.needs_fix()
    }

    #[must_use]
    pub fn actions(&self) -> Vec<RowAction> {
        match self.mode {
            RowMode::Editing => vec![RowAction::Save, RowAction::Cancel],
            RowMode::Viewing if self.status.needs_fix() => {
                vec![RowAction::Fix, RowAction::Edit, RowAction::Delete]
            }
            RowMode::Viewing => vec![RowAction::Edit, RowAction::Delete],
        }
    }

    /// Selected responder, falling back to the stored one.
    #[must_use]
    pub fn selected_responder(&self) -> ResponderRef {
        self.controls
            .responder
            .effective_value()
            .cloned()
            .unwrap_or_else(|| self.original.endpoint())
    }

    /// Values a save would submit.
    #[must_use]
    pub fn current_values(&self) -> LinkValues {
        let responder = self.selected_responder();
        let value = |slot: FieldSlot| {
            self.controls
                .field(slot)
                .select
                .effective_value()
                .copied()
                .unwrap_or_else(|| self.original.stored(slot))
        };
        LinkValues {
            responder: responder.address,
            group: responder.group,
            data_1: value(FieldSlot::Data1),
            data_2: value(FieldSlot::Data2),
        }
    }

    fn expect_mode(&self, expected: RowMode) -> Result<(), CoreError> {
        if self.mode == expected {
            return Ok(());
        }
        Err(CoreError::InvalidRowMode {
            id: self.id.clone(),
            expected,
            actual: self.mode,
        })
    }
}

/// Read-only row for a link known only to the devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedRow {
    pub link: UndefinedLink,
    pub responder_name: SmolStr,
    pub data_1_label: Option<SmolStr>,
    pub data_2_label: Option<SmolStr>,
}

impl UndefinedRow {
    fn build(index: &CatalogIndex, link: &UndefinedLink) -> Self {
        let details = index.resolve(&link.responder_id, link.data_3);
        let label = |slot: FieldSlot, raw: Raw| {
            details
                .schema(slot)
                .and_then(|schema| schema.label_for(raw))
                .map(SmolStr::new)
        };
        Self {
            responder_name: link
                .responder_name
                .clone()
                .unwrap_or_else(|| index.display_name(&link.responder_id, link.data_3)),
            data_1_label: label(FieldSlot::Data1, link.data_1),
            data_2_label: label(FieldSlot::Data2, link.data_2),
            link: link.clone(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &SmolStr {
        &self.link.key
    }

    #[must_use]
    pub fn actions(&self) -> Vec<RowAction> {
        vec![RowAction::Import, RowAction::Delete]
    }
}

/// Row for a link record naming an address the catalog lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRow {
    pub link: UnknownLink,
}

impl UnknownRow {
    #[must_use]
    pub fn key(&self) -> &SmolStr {
        &self.link.key
    }

    #[must_use]
    pub fn device(&self) -> &Address {
        &self.link.device
    }

    #[must_use]
    pub fn actions(&self) -> Vec<RowAction> {
        vec![RowAction::AddDevice, RowAction::Delete]
    }
}

/// Rows of one link scope.
#[derive(Debug, Clone)]
pub struct Reconciler {
    scope: LinkScope,
    defined: Vec<DefinedRow>,
    undefined: Vec<UndefinedRow>,
    unknown: Vec<UnknownRow>,
}

impl Reconciler {
    #[must_use]
    pub fn new(scope: LinkScope) -> Self {
        Self {
            scope,
            defined: Vec::new(),
            undefined: Vec::new(),
            unknown: Vec::new(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> &LinkScope {
        &self.scope
    }

    #[must_use]
    pub fn fetch_request(&self) -> ApiRequest {
        ApiRequest::FetchLinks {
            scope: self.scope.clone(),
        }
    }

    /// Replaces every row with the classification of `links`.
    pub fn reconcile(&mut self, index: &CatalogIndex, links: &LinksCollection) {
        self.defined = links
            .defined
            .iter()
            .map(|link| DefinedRow::build(index, link))
            .collect();
        self.undefined = links
            .undefined
            .iter()
            .map(|link| UndefinedRow::build(index, link))
            .collect();
        self.unknown = links
            .unknown
            .iter()
            .map(|link| UnknownRow { link: link.clone() })
            .collect();
        debug!(
            scope = %self.scope,
            defined = self.defined.len(),
            undefined = self.undefined.len(),
            unknown = self.unknown.len(),
            "links reconciled"
        );
    }

    #[must_use]
    pub fn defined(&self) -> &[DefinedRow] {
        &self.defined
    }

    #[must_use]
    pub fn undefined(&self) -> &[UndefinedRow] {
        &self.undefined
    }

    #[must_use]
    pub fn unknown(&self) -> &[UnknownRow] {
        &self.unknown
    }

    #[must_use]
    pub fn row(&self, id: &str) -> Option<&DefinedRow> {
        self.defined.iter().find(|row| row.id == id)
    }

    /// Viewing -> Editing.
    pub fn begin_edit(&mut self, id: &str) -> Result<(), CoreError> {
        let row = self.row_mut(id)?;
        row.expect_mode(RowMode::Viewing)?;
        row.mode = RowMode::Editing;
        Ok(())
    }

    /// Switches the responder and regenerates both field controls.
    ///
    /// The new controls are rendered from the selected responder's schema with
    /// the row's stored values pre-selected where that schema offers them.
    pub fn select_responder(
        &mut self,
        index: &CatalogIndex,
        id: &str,
        key: &str,
    ) -> Result<(), CoreError> {
        let row = self.row_mut(id)?;
        row.expect_mode(RowMode::Editing)?;
        let Some(endpoint) = row
            .controls
            .responder
            .options
            .iter()
            .map(|option| option.value.clone())
            .find(|endpoint| endpoint.key() == key)
        else {
            return Err(CoreError::UnknownResponder {
                id: row.id.clone(),
                key: SmolStr::new(key),
            });
        };
        row.controls.responder.select(&endpoint);
        let details = index.resolve(&endpoint.address, endpoint.group);
        for slot in FieldSlot::ALL {
            let stored = Some(row.original.stored(slot));
            *row.controls.field_mut(slot) = render_field(slot, details.schema(slot), stored);
        }
        debug!(link = %row.id, responder = %endpoint, "responder changed");
        Ok(())
    }

    pub fn select_field(&mut self, id: &str, slot: FieldSlot, raw: Raw) -> Result<(), CoreError> {
        let row = self.row_mut(id)?;
        row.expect_mode(RowMode::Editing)?;
        if !row.controls.field_mut(slot).select.select(&raw) {
            return Err(CoreError::OptionNotOffered {
                id: row.id.clone(),
                slot,
                value: raw,
            });
        }
        Ok(())
    }

    /// Editing -> Viewing, producing the edit request for the selected values.
    ///
    /// The row keeps showing the edit until the server's collection is
    /// reconciled.
    pub fn save(&mut self, id: &str) -> Result<ApiRequest, CoreError> {
        let scope = self.scope.clone();
        let row = self.row_mut(id)?;
        row.expect_mode(RowMode::Editing)?;
        let values = row.current_values();
        row.mode = RowMode::Viewing;
        Ok(ApiRequest::EditLink {
            scope,
            id: row.id.clone(),
            body: LinkEdit {
                responder_id: values.responder,
                data_1: values.data_1,
                data_2: values.data_2,
                data_3: values.group,
            },
        })
    }

    /// Editing -> Viewing, restoring the controls rendered with the row.
    pub fn cancel(&mut self, id: &str) -> Result<(), CoreError> {
        let row = self.row_mut(id)?;
        row.expect_mode(RowMode::Editing)?;
        row.controls = row.initial_controls.clone();
        row.mode = RowMode::Viewing;
        Ok(())
    }

    /// Re-submits the stored values of a broken or failed link.
    pub fn fix(&self, id: &str) -> Result<ApiRequest, CoreError> {
        let row = self.defined_row(id)?;
        row.expect_mode(RowMode::Viewing)?;
        if !row.status.needs_fix() {
            return Err(CoreError::NothingToFix(row.id.clone()));
        }
        Ok(ApiRequest::EditLink {
            scope: self.scope.clone(),
            id: row.id.clone(),
            body: LinkEdit {
                responder_id: row.original.responder.clone(),
                data_1: row.original.data_1,
                data_2: row.original.data_2,
                data_3: row.original.group,
            },
        })
    }

    pub fn delete_defined(&self, id: &str) -> Result<ApiRequest, CoreError> {
        let row = self.defined_row(id)?;
        Ok(ApiRequest::DeleteDefinedLink {
            scope: self.scope.clone(),
            id: row.id.clone(),
        })
    }

    /// Creates a defined link from the raw fields of an undefined one.
    pub fn import_undefined(&self, key: &str) -> Result<ApiRequest, CoreError> {
        let row = self.undefined_row(key)?;
        Ok(ApiRequest::ImportLink {
            scope: self.scope.clone(),
            body: LinkImport {
                responder_id: row.link.responder_id.clone(),
                group: self.scope.group(),
                data_1: row.link.data_1,
                data_2: row.link.data_2,
                data_3: row.link.data_3,
            },
        })
    }

    pub fn delete_undefined(&self, key: &str) -> Result<ApiRequest, CoreError> {
        let row = self.undefined_row(key)?;
        Ok(ApiRequest::DeleteUndefinedLink {
            scope: self.scope.clone(),
            key: row.key().clone(),
        })
    }

    pub fn delete_unknown(&self, key: &str) -> Result<ApiRequest, CoreError> {
        let row = self.unknown_row(key)?;
        Ok(ApiRequest::DeleteUnknownLink {
            scope: self.scope.clone(),
            key: row.key().clone(),
        })
    }

    /// Adds the unknown address as a device of the scope's modem.
    pub fn add_unknown_device(&self, key: &str) -> Result<ApiRequest, CoreError> {
        let row = self.unknown_row(key)?;
        Ok(ApiRequest::AddDevice {
            modem: self.scope.modem().clone(),
            device: row.device().clone(),
        })
    }

    fn row_mut(&mut self, id: &str) -> Result<&mut DefinedRow, CoreError> {
        self.defined
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| CoreError::UnknownLink(id.into()))
    }

    fn defined_row(&self, id: &str) -> Result<&DefinedRow, CoreError> {
        self.defined
            .iter()
            .find(|row| row.id == id)
            .ok_or_else(|| CoreError::UnknownLink(id.into()))
    }

    fn undefined_row(&self, key: &str) -> Result<&UndefinedRow, CoreError> {
        self.undefined
            .iter()
            .find(|row| row.link.key == key)
            .ok_or_else(|| CoreError::UnknownKey(key.into()))
    }

    fn unknown_row(&self, key: &str) -> Result<&UnknownRow, CoreError> {
        self.unknown
            .iter()
            .find(|row| row.link.key == key)
            .ok_or_else(|| CoreError::UnknownKey(key.into()))
    }
}

fn stored_field(index: &CatalogIndex, values: &LinkValues, slot: FieldSlot) -> FieldControl {
    render_field(
        slot,
        index.schema(&values.responder, values.group, slot),
        Some(values.stored(slot)),
    )
}

// A responder missing from the roster keeps its own option so the stored
// identity stays selected.
fn responder_select(
    index: &CatalogIndex,
    values: &LinkValues,
    name: &SmolStr,
) -> SelectControl<ResponderRef> {
    let current = values.endpoint();
    let mut options = index
        .responders()
        .map(|entry| (entry.name.clone(), entry.endpoint()))
        .collect::<Vec<_>>();
    if !options.iter().any(|(_, endpoint)| endpoint == &current) {
        options.push((name.clone(), current.clone()));
    }
    SelectControl::from_options(options, Some(&current))
}
