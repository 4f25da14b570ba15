//! HTML rendering of link rows.
//!
//! Produces the three `<tbody>` sections of the links page
//! (`#definedLinks`, `#undefinedLinks`, `#unknownLinks`). Rows carry
//! `data-id` / `data-key` attributes and every action button a
//! `data-action` attribute; scripting and styling live with the page.

use linkdeck_core::fields::{FieldControl, SelectControl};
use linkdeck_core::{DefinedRow, Reconciler, RowAction, UndefinedRow, UnknownRow};

/// Renders every row of `reconciler`.
#[must_use]
pub fn render_links(reconciler: &Reconciler) -> String {
    let mut out = String::new();
    out.push_str("<tbody id=\"definedLinks\">\n");
    for row in reconciler.defined() {
        out.push_str(&render_defined_row(row));
    }
    out.push_str("</tbody>\n<tbody id=\"undefinedLinks\">\n");
    for row in reconciler.undefined() {
        out.push_str(&render_undefined_row(row));
    }
    out.push_str("</tbody>\n<tbody id=\"unknownLinks\">\n");
    for row in reconciler.unknown() {
        out.push_str(&render_unknown_row(row));
    }
    out.push_str("</tbody>\n");
    out
}

#[must_use]
pub fn render_defined_row(row: &DefinedRow) -> String {
    let class = if row.warning() { " class=\"warning\"" } else { "" };
    let disabled = row.disabled();
    let responder = render_select(
        "responder",
        &row.controls.responder,
        |endpoint| endpoint.key().to_string(),
        disabled,
    );
    format!(
        "<tr data-id=\"{id}\"{class}>\
         <td>{responder}</td>\
         <td>{data_1}</td>\
         <td>{data_2}</td>\
         <td>{status}</td>\
         <td>{actions}</td></tr>\n",
        id = escape_html(&row.id),
        data_1 = render_field(&row.controls.data_1, disabled),
        data_2 = render_field(&row.controls.data_2, disabled),
        status = escape_html(row.status.as_str()),
        actions = render_actions(&row.actions()),
    )
}

#[must_use]
pub fn render_undefined_row(row: &UndefinedRow) -> String {
    let link = &row.link;
    format!(
        "<tr data-key=\"{key}\">\
         <td>{name}</td>\
         <td>{address}</td>\
         <td>{group}</td>\
         <td>{data_1}</td>\
         <td>{data_2}</td>\
         <td>{actions}</td></tr>\n",
        key = escape_html(row.key()),
        name = escape_html(&row.responder_name),
        address = escape_html(link.responder_id.as_str()),
        group = link.data_3,
        data_1 = raw_with_label(link.data_1, row.data_1_label.as_deref()),
        data_2 = raw_with_label(link.data_2, row.data_2_label.as_deref()),
        actions = render_actions(&row.actions()),
    )
}

#[must_use]
pub fn render_unknown_row(row: &UnknownRow) -> String {
    let status = row
        .link
        .status
        .as_ref()
        .map(|status| escape_html(status.as_str()))
        .unwrap_or_default();
    format!(
        "<tr data-key=\"{key}\"><td>{device}</td><td>{status}</td><td>{actions}</td></tr>\n",
        key = escape_html(row.key()),
        device = escape_html(row.device().as_str()),
        actions = render_actions(&row.actions()),
    )
}

fn render_field(field: &FieldControl, disabled: bool) -> String {
    let select = render_select(field.slot.key(), &field.select, u8::to_string, disabled);
    if field.label.is_empty() {
        return select;
    }
    format!("<label>{}</label>{select}", escape_html(&field.label))
}

fn render_select<V>(
    name: &str,
    control: &SelectControl<V>,
    value_text: impl Fn(&V) -> String,
    disabled: bool,
) -> String {
    let mut out = format!("<select name=\"{name}\"");
    if disabled {
        out.push_str(" disabled");
    }
    out.push('>');
    for option in &control.options {
        out.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            escape_html(&value_text(&option.value)),
            if option.selected { " selected" } else { "" },
            escape_html(&option.label),
        ));
    }
    out.push_str("</select>");
    out
}

fn render_actions(actions: &[RowAction]) -> String {
    actions
        .iter()
        .map(|action| {
            format!(
                "<button data-action=\"{}\">{}</button>",
                action_name(*action),
                action.label()
            )
        })
        .collect()
}

fn action_name(action: RowAction) -> &'static str {
    match action {
        RowAction::Edit => "edit",
        RowAction::Save => "save",
        RowAction::Cancel => "cancel",
        RowAction::Fix => "fix",
        RowAction::Delete => "delete",
        RowAction::Import => "import",
        RowAction::AddDevice => "add-device",
    }
}

fn raw_with_label(raw: u8, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{} ({raw})", escape_html(label)),
        None => raw.to_string(),
    }
}

/// Escapes text for element content and double- or single-quoted attributes.
#[must_use]
pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
}
