//! Schema-driven select controls.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::address::Raw;
use crate::catalog::{FieldSchema, FieldSlot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption<V> {
    pub label: SmolStr,
    pub value: V,
    pub selected: bool,
}

/// An ordered list of options with at most one marked selected.
///
/// When nothing is marked, a rendered control shows its first option, so
/// [`SelectControl::effective_value`] falls back to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectControl<V> {
    pub options: Vec<SelectOption<V>>,
}

impl<V> Default for SelectControl<V> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
        }
    }
}

impl<V: PartialEq + Clone> SelectControl<V> {
    /// Builds a control marking the first option whose value equals `current`.
    pub fn from_options(
        options: impl IntoIterator<Item = (SmolStr, V)>,
        current: Option<&V>,
    ) -> Self {
        let mut marked = false;
        let options = options
            .into_iter()
            .map(|(label, value)| {
                let selected = !marked && current == Some(&value);
                marked |= selected;
                SelectOption {
                    label,
                    value,
                    selected,
                }
            })
            .collect();
        Self { options }
    }

    #[must_use]
    pub fn selected(&self) -> Option<&SelectOption<V>> {
        self.options.iter().find(|option| option.selected)
    }

    #[must_use]
    pub fn effective_value(&self) -> Option<&V> {
        self.selected()
            .or_else(|| self.options.first())
            .map(|option| &option.value)
    }

    #[must_use]
    pub fn contains(&self, value: &V) -> bool {
        self.options.iter().any(|option| &option.value == value)
    }

    /// Marks the first option holding `value`; returns `false` if none does.
    pub fn select(&mut self, value: &V) -> bool {
        if !self.contains(value) {
            return false;
        }
        let mut marked = false;
        for option in &mut self.options {
            option.selected = !marked && &option.value == value;
            marked |= option.selected;
        }
        true
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// A labelled select control for one link data field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldControl {
    pub slot: FieldSlot,
    pub label: SmolStr,
    pub select: SelectControl<Raw>,
}

impl FieldControl {
    /// Label of the option currently shown.
    #[must_use]
    pub fn shown_label(&self) -> Option<&str> {
        self.select
            .selected()
            .or_else(|| self.select.options.first())
            .map(|option| option.label.as_str())
    }
}

/// Renders the control for `slot` from `schema` with `current` pre-selected.
///
/// Options follow the schema's declaration order. A missing schema yields an
/// unlabelled control without options.
#[must_use]
pub fn render_field(
    slot: FieldSlot,
    schema: Option<&FieldSchema>,
    current: Option<Raw>,
) -> FieldControl {
    let Some(schema) = schema else {
        return FieldControl {
            slot,
            label: SmolStr::default(),
            select: SelectControl::default(),
        };
    };
    let options = schema
        .values
        .iter()
        .map(|(label, value)| (label.clone(), *value));
    FieldControl {
        slot,
        label: schema.name.clone(),
        select: SelectControl::from_options(options, current.as_ref()),
    }
}
