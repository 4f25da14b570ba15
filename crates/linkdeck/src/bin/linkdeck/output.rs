//! Terminal and JSON output of catalog entries and link rows.

use linkdeck_core::catalog::FieldSchema;
use linkdeck_core::fields::FieldControl;
use linkdeck_core::{
    Address, CatalogIndex, DefinedRow, GroupNumber, Reconciler, RowAction, UndefinedRow, UnknownRow,
};
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::style;

pub fn print_responders(index: &CatalogIndex) {
    if index.responder_count() == 0 {
        println!("{}", style::dim("no responders"));
        return;
    }
    for entry in index.responders() {
        println!("{:<10} {}", entry.key, entry.name);
    }
}

pub fn print_details(index: &CatalogIndex, address: &Address, group: GroupNumber) {
    let details = index.resolve(address, group);
    if details.is_empty() {
        let note = format!("{address} group {group}: not in catalog");
        println!("{}", style::warning(note));
        return;
    }
    println!(
        "{} {}",
        style::heading(format!("{address}_{group}")),
        index.display_name(address, group)
    );
    if let Some(controller) = index.controller_for(address) {
        println!("  controller  {controller}");
    }
    println!("  responder   {}", details.responder);
    for (key, schema) in [("data_1", &details.data_1), ("data_2", &details.data_2)] {
        match schema {
            Some(schema) => println!("  {key}      {}", describe_schema(schema)),
            None => println!("  {key}      {}", style::dim("-")),
        }
    }
}

fn describe_schema(schema: &FieldSchema) -> String {
    let values = schema
        .values
        .iter()
        .map(|(label, raw)| format!("{label}={raw}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} [{values}]", schema.name)
}

pub fn print_links(reconciler: &Reconciler, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Html => print!("{}", linkdeck::html::render_links(reconciler)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&links_json(reconciler))?;
            println!("{json}");
        }
        OutputFormat::Text => print_links_text(reconciler),
    }
    Ok(())
}

fn print_links_text(reconciler: &Reconciler) {
    let title = format!("Links of {}", reconciler.scope());
    println!("{}", style::heading(title));
    println!("{}", style::heading("Defined"));
    if reconciler.defined().is_empty() {
        println!("  {}", style::dim("none"));
    }
    for row in reconciler.defined() {
        let line = defined_line(row);
        if row.warning() {
            println!("{}", style::warning(line));
        } else {
            println!("{line}");
        }
    }
    println!("{}", style::heading("Undefined"));
    if reconciler.undefined().is_empty() {
        println!("  {}", style::dim("none"));
    }
    for row in reconciler.undefined() {
        println!("{}", undefined_line(row));
    }
    println!("{}", style::heading("Unknown"));
    if reconciler.unknown().is_empty() {
        println!("  {}", style::dim("none"));
    }
    for row in reconciler.unknown() {
        println!("{}", unknown_line(row));
    }
}

fn defined_line(row: &DefinedRow) -> String {
    let responder = row.selected_responder();
    format!(
        "  {:<8} {:<20} {:<10} {:<24} {:<24} {:<8} {}",
        row.id,
        row.responder_name,
        responder.key(),
        field_text(&row.controls.data_1, row.original.data_1),
        field_text(&row.controls.data_2, row.original.data_2),
        row.status,
        actions_text(&row.actions())
    )
}

fn undefined_line(row: &UndefinedRow) -> String {
    let link = &row.link;
    let labelled = |raw: u8, label: Option<&str>| match label {
        Some(label) => format!("{label} ({raw})"),
        None => raw.to_string(),
    };
    format!(
        "  {:<16} {:<20} {}_{:<7} data_1={:<14} data_2={:<14} {}",
        row.key(),
        row.responder_name,
        link.responder_id,
        link.data_3,
        labelled(link.data_1, row.data_1_label.as_deref()),
        labelled(link.data_2, row.data_2_label.as_deref()),
        actions_text(&row.actions())
    )
}

fn unknown_line(row: &UnknownRow) -> String {
    let status = row
        .link
        .status
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    format!(
        "  {:<16} {:<8} {:<8} {}",
        row.key(),
        row.device(),
        status,
        actions_text(&row.actions())
    )
}

fn field_text(field: &FieldControl, stored: u8) -> String {
    match field.shown_label() {
        Some(shown) if field.label.is_empty() => shown.to_string(),
        Some(shown) => format!("{}: {shown}", field.label),
        None => stored.to_string(),
    }
}

fn actions_text(actions: &[RowAction]) -> String {
    let labels = actions
        .iter()
        .map(|action| action.label())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{labels}]")
}

fn links_json(reconciler: &Reconciler) -> Value {
    let field = |control: &FieldControl| {
        json!({
            "label": control.label.as_str(),
            "value": control.select.effective_value(),
            "shown": control.shown_label(),
        })
    };
    let defined = reconciler
        .defined()
        .iter()
        .map(|row| {
            json!({
                "id": row.id.as_str(),
                "responder": row.selected_responder().key().as_str(),
                "responder_name": row.responder_name.as_str(),
                "data_1": field(&row.controls.data_1),
                "data_2": field(&row.controls.data_2),
                "status": row.status.as_str(),
                "warning": row.warning(),
            })
        })
        .collect::<Vec<_>>();
    let undefined = reconciler
        .undefined()
        .iter()
        .map(|row| {
            json!({
                "key": row.key().as_str(),
                "responder_id": row.link.responder_id.as_str(),
                "responder_name": row.responder_name.as_str(),
                "data_1": row.link.data_1,
                "data_2": row.link.data_2,
                "data_3": row.link.data_3,
            })
        })
        .collect::<Vec<_>>();
    let unknown = reconciler
        .unknown()
        .iter()
        .map(|row| {
            json!({
                "key": row.key().as_str(),
                "device": row.device().as_str(),
                "status": row.link.status.as_ref().map(|status| status.as_str()),
            })
        })
        .collect::<Vec<_>>();
    json!({
        "scope": reconciler.scope().path(),
        "definedLinks": defined,
        "undefinedLinks": undefined,
        "unknownLinks": unknown,
    })
}
