//! CLI definitions for linkdeck.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "linkdeck",
    version,
    about = "Link management console for Insteon modems and devices",
    after_help = "Examples:\n  linkdeck responders\n  linkdeck links --scope /modems/AABBCC/groups/1\n  linkdeck edit 000101 --responder 112233_1 --data-1 255\n  linkdeck import 1122330FF8---- --scope /modems/AABBCC/devices/445566"
)]
pub struct Cli {
    /// Configuration file (defaults to ./linkdeck.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Server base URL (overrides the configuration file).
    #[arg(long, global = true)]
    pub server: Option<String>,
    /// Show debug logs.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Seconds to wait for the server before giving up.
    #[arg(long, global = true, default_value = "10")]
    pub wait: u64,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every selectable responder in catalog order.
    Responders,
    /// Show the record that supplies the schema for an endpoint.
    Resolve {
        /// Device or modem address.
        address: String,
        /// Group number of the endpoint.
        #[arg(long, default_value = "1")]
        group: u8,
    },
    /// Show the links of a scope.
    Links {
        #[command(flatten)]
        scope: ScopeArg,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Change the responder or data fields of a defined link.
    Edit {
        /// Defined link id.
        id: String,
        /// Responder roster key (ADDRESS_group).
        #[arg(long)]
        responder: Option<String>,
        /// Raw data_1 value.
        #[arg(long = "data-1")]
        data_1: Option<u8>,
        /// Raw data_2 value.
        #[arg(long = "data-2")]
        data_2: Option<u8>,
        #[command(flatten)]
        scope: ScopeArg,
    },
    /// Re-apply a broken or failed link.
    Fix {
        /// Defined link id.
        id: String,
        #[command(flatten)]
        scope: ScopeArg,
    },
    /// Delete a defined link.
    Delete {
        /// Defined link id.
        id: String,
        #[command(flatten)]
        scope: ScopeArg,
    },
    /// Create a defined link from an undefined one.
    Import {
        /// Undefined link key.
        key: String,
        #[command(flatten)]
        scope: ScopeArg,
    },
    /// Delete an undefined link from the devices.
    DeleteUndefined {
        /// Undefined link key.
        key: String,
        #[command(flatten)]
        scope: ScopeArg,
    },
    /// Delete a link record naming an unknown device.
    DeleteUnknown {
        /// Unknown link key.
        key: String,
        #[command(flatten)]
        scope: ScopeArg,
    },
    /// Add the device named by an unknown link to the modem.
    AddDevice {
        /// Unknown link key.
        key: String,
        #[command(flatten)]
        scope: ScopeArg,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct ScopeArg {
    /// Scope location such as /modems/AABBCC/groups/1 (defaults to the configured scope).
    #[arg(long)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Html,
    Json,
}
