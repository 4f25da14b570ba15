//! CLI entrypoint for linkdeck.

#[path = "linkdeck/cli.rs"]
mod cli;
#[path = "linkdeck/output.rs"]
mod output;
#[path = "linkdeck/style.rs"]
mod style;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use linkdeck::{ApiResponse, ClientConfig, Console, ConsoleCommand, HttpApi, LinkApi};
use linkdeck_core::{Address, ApiRequest, CatalogIndex, FieldSlot, LinkScope};
use smol_str::SmolStr;
use tracing::info;

use cli::{Cli, Command, OutputFormat, ScopeArg};

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", style::error(format!("Error: {err:#}")));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ClientConfig::load_or_default(cli.config.as_deref())?;
    if let Some(server) = cli.server.as_deref() {
        config.override_base_url(server)?;
    }
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level
    };
    init_logging(level);
    info!(server = %config.server.base_url, "linkdeck starting");
    let wait = Duration::from_secs(cli.wait.max(1));
    let api = Arc::new(HttpApi::new(&config.server));

    match cli.command {
        Command::Responders => {
            let index = fetch_index(api.as_ref())?;
            output::print_responders(&index);
        }
        Command::Resolve { address, group } => {
            let address = Address::parse(&address)?;
            let index = fetch_index(api.as_ref())?;
            output::print_details(&index, &address, group);
        }
        Command::Links { scope, format } => {
            let console = open_console(api, &config, &scope, wait)?;
            output::print_links(console.reconciler(), format)?;
        }
        Command::Edit {
            id,
            responder,
            data_1,
            data_2,
            scope,
        } => {
            let mut console = open_console(api, &config, &scope, wait)?;
            let id = SmolStr::new(id);
            console.execute(ConsoleCommand::BeginEdit { id: id.clone() })?;
            if let Some(key) = responder {
                console.execute(ConsoleCommand::SelectResponder {
                    id: id.clone(),
                    key: key.into(),
                })?;
            }
            for (slot, value) in [(FieldSlot::Data1, data_1), (FieldSlot::Data2, data_2)] {
                if let Some(value) = value {
                    console.execute(ConsoleCommand::SelectField {
                        id: id.clone(),
                        slot,
                        value,
                    })?;
                }
            }
            console.execute(ConsoleCommand::Save { id })?;
            apply(&mut console, wait, "Link saved")?;
        }
        Command::Fix { id, scope } => {
            let mut console = open_console(api, &config, &scope, wait)?;
            console.execute(ConsoleCommand::Fix { id: id.into() })?;
            apply(&mut console, wait, "Link re-applied")?;
        }
        Command::Delete { id, scope } => {
            let mut console = open_console(api, &config, &scope, wait)?;
            console.execute(ConsoleCommand::DeleteDefined { id: id.into() })?;
            apply(&mut console, wait, "Link deleted")?;
        }
        Command::Import { key, scope } => {
            let mut console = open_console(api, &config, &scope, wait)?;
            console.execute(ConsoleCommand::ImportUndefined { key: key.into() })?;
            apply(&mut console, wait, "Link imported")?;
        }
        Command::DeleteUndefined { key, scope } => {
            let mut console = open_console(api, &config, &scope, wait)?;
            console.execute(ConsoleCommand::DeleteUndefined { key: key.into() })?;
            apply(&mut console, wait, "Undefined link deleted")?;
        }
        Command::DeleteUnknown { key, scope } => {
            let mut console = open_console(api, &config, &scope, wait)?;
            console.execute(ConsoleCommand::DeleteUnknown { key: key.into() })?;
            apply(&mut console, wait, "Unknown link deleted")?;
        }
        Command::AddDevice { key, scope } => {
            let mut console = open_console(api, &config, &scope, wait)?;
            console.execute(ConsoleCommand::AddUnknownDevice { key: key.into() })?;
            apply(&mut console, wait, "Device added")?;
        }
    }
    Ok(())
}

fn init_logging(level: tracing::Level) {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fetch_index(api: &dyn LinkApi) -> anyhow::Result<CatalogIndex> {
    match api.execute(&ApiRequest::FetchCatalog)? {
        ApiResponse::Catalog(snapshot) => Ok(CatalogIndex::build(snapshot)),
        ApiResponse::Links(_) => anyhow::bail!("catalog request answered with a links collection"),
    }
}

// A location without a group scopes the entity's base group, which only the
// catalog knows.
fn resolve_scope(
    api: &dyn LinkApi,
    config: &ClientConfig,
    arg: &ScopeArg,
) -> anyhow::Result<LinkScope> {
    let location = arg
        .scope
        .as_deref()
        .or(config.default_scope.as_deref())
        .context("no scope given; pass --scope or set default_scope in linkdeck.toml")?;
    let index = fetch_index(api)?;
    Ok(LinkScope::from_location_in(location, &index)?)
}

fn open_console(
    api: Arc<HttpApi>,
    config: &ClientConfig,
    scope: &ScopeArg,
    wait: Duration,
) -> anyhow::Result<Console> {
    let scope = resolve_scope(api.as_ref(), config, scope)?;
    let mut console = Console::new(api, scope);
    console.refresh();
    settle(&mut console, wait)?;
    Ok(console)
}

fn settle(console: &mut Console, wait: Duration) -> anyhow::Result<()> {
    if !console.run_until_idle(wait) {
        anyhow::bail!("server did not answer within {}s", wait.as_secs());
    }
    if let Some(err) = console.take_error() {
        return Err(err.into());
    }
    Ok(())
}

fn apply(console: &mut Console, wait: Duration, done: &str) -> anyhow::Result<()> {
    settle(console, wait)?;
    println!("{}", style::success(done));
    output::print_links(console.reconciler(), OutputFormat::Text)
}
