mod common;

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use linkdeck::{ApiError, Console, ConsoleCommand};
use linkdeck_core::request::SettingsTarget;
use linkdeck_core::{FieldSlot, RowMode};
use serde_json::json;

use common::{hub_scope, start_mock_server, MockServer, MockState, CATALOG, LINKS};

const WAIT: Duration = Duration::from_secs(5);
const LAMP: &str = "000101";

fn loaded_console(server: &MockServer) -> Console {
    let mut console = Console::new(Arc::new(server.api()), hub_scope());
    console.refresh();
    assert!(console.run_until_idle(WAIT), "initial fetch did not finish");
    assert!(console.last_error().is_none());
    console
}

#[test]
fn refresh_reconciles_links_against_catalog() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let console = loaded_console(&server);

    let rows = console.reconciler();
    assert_eq!(rows.defined().len(), 1);
    assert_eq!(rows.undefined().len(), 1);
    assert_eq!(rows.unknown().len(), 1);
    let lamp = rows.row("000101").expect("defined row");
    assert_eq!(lamp.controls.data_1.shown_label(), Some("On"));
    assert_eq!(console.index().responder_count(), 3);
    assert_eq!(console.revision(), 2);

    let gets = server.state().requests_matching("GET");
    let mut urls = gets
        .iter()
        .map(|request| request.url.as_str())
        .collect::<Vec<_>>();
    urls.sort_unstable();
    assert_eq!(
        urls,
        vec!["/modems.json", "/modems/AABBCC/groups/1/links.json"]
    );
}

#[test]
fn import_moves_entry_from_undefined_to_defined() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let mut console = loaded_console(&server);

    console
        .execute(ConsoleCommand::ImportUndefined {
            key: "778899----0FF0".into(),
        })
        .expect("import");
    assert!(console.run_until_idle(WAIT));

    let posts = server.state().requests_matching("POST");
    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0].url,
        "/modems/AABBCC/groups/1/links/definedLinks.json"
    );
    assert_eq!(
        posts[0].body,
        Some(json!({"responder_id": "778899", "group": 1, "data_1": 191, "data_2": 0, "data_3": 1}))
    );

    let rows = console.reconciler();
    assert!(rows.undefined().is_empty());
    assert_eq!(rows.defined().len(), 2);
    let imported = &rows.defined()[1];
    assert_eq!(imported.responder_name, "Fan");
    assert_eq!(imported.controls.data_1.shown_label(), Some("Medium"));
    let selected = imported.controls.responder.selected();
    let key = selected.map(|option| option.value.key());
    assert_eq!(key, Some("778899_1".into()));
}

#[test]
fn save_sends_selected_values_and_applies_response() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let mut console = loaded_console(&server);

    for command in [
        ConsoleCommand::BeginEdit { id: LAMP.into() },
        ConsoleCommand::SelectResponder {
            id: "000101".into(),
            key: "778899_1".into(),
        },
        ConsoleCommand::SelectField {
            id: "000101".into(),
            slot: FieldSlot::Data1,
            value: 255,
        },
    ] {
        assert_eq!(console.execute(command), Ok(None));
    }
    let seq = console
        .execute(ConsoleCommand::Save { id: LAMP.into() })
        .expect("save");
    assert!(seq.is_some());
    assert!(console.run_until_idle(WAIT));

    let patches = server.state().requests_matching("PATCH");
    assert_eq!(patches.len(), 1);
    assert_eq!(
        patches[0].url,
        "/modems/AABBCC/groups/1/links/definedLinks/000101.json"
    );
    assert_eq!(
        patches[0].body,
        Some(json!({"responder_id": "778899", "data_1": 255, "data_2": 0, "data_3": 1}))
    );

    let row = console.reconciler().row("000101").expect("row");
    assert_eq!(row.mode, RowMode::Viewing);
    assert_eq!(row.responder_name, "Fan");
    assert_eq!(row.controls.data_1.shown_label(), Some("High"));
}

#[test]
fn fix_reapplies_broken_link() {
    let links = LINKS.replace("\"status\": \"Good\"", "\"status\": \"Broken\"");
    let server = start_mock_server(MockState::new(CATALOG, &links));
    let mut console = loaded_console(&server);
    assert!(console.reconciler().row("000101").expect("row").warning());

    console
        .execute(ConsoleCommand::Fix { id: LAMP.into() })
        .expect("fix");
    assert!(console.run_until_idle(WAIT));

    let patches = server.state().requests_matching("PATCH");
    assert_eq!(
        patches[0].body,
        Some(json!({"responder_id": "112233", "data_1": 255, "data_2": 0, "data_3": 1}))
    );
    assert!(!console.reconciler().row("000101").expect("row").warning());
}

#[test]
fn failed_fetch_leaves_rows_untouched() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let mut console = loaded_console(&server);
    let before = console.reconciler().defined().to_vec();
    let html_before = console.render_html();
    let revision = console.revision();

    server.state().fail_status = Some(500);
    console.fetch_links();
    assert!(console.run_until_idle(WAIT));

    assert_eq!(console.reconciler().defined(), before.as_slice());
    assert_eq!(console.render_html(), html_before);
    assert_eq!(console.revision(), revision);
    match console.take_error() {
        Some(ApiError::Status { status, url, .. }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/modems/AABBCC/groups/1/links.json"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(console.last_error().is_none());
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let mut console = loaded_console(&server);
    let api = linkdeck::HttpApi::new(&linkdeck::ServerConfig {
        base_url: "http://127.0.0.1:9".into(),
        connect_timeout: Duration::from_millis(200),
        read_timeout: Duration::from_millis(200),
    });
    let mut offline = Console::new(Arc::new(api), hub_scope());
    offline.refresh();
    assert!(offline.run_until_idle(WAIT));
    assert!(matches!(offline.take_error(), Some(ApiError::Transport { .. })));
    assert!(offline.reconciler().defined().is_empty());
    assert!(offline.index().is_empty());

    // The healthy console is unaffected.
    console.fetch_links();
    assert!(console.run_until_idle(WAIT));
    assert_eq!(console.reconciler().defined().len(), 1);
}

#[test]
fn add_device_reloads_catalog_and_links() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let mut console = loaded_console(&server);
    assert_eq!(console.reconciler().unknown().len(), 1);

    console
        .execute(ConsoleCommand::AddUnknownDevice { key: "0FE8".into() })
        .expect("add device");
    assert!(console.run_until_idle(WAIT));

    assert!(console.reconciler().unknown().is_empty());
    assert!(console.index().responder("A1B2C3_1").is_some());
    let state = server.state();
    let posts = state.requests_matching("POST");
    assert_eq!(posts[0].url, "/modems/AABBCC/devices/A1B2C3.json");
    let link_fetches = state
        .requests_matching("GET")
        .iter()
        .filter(|request| request.url.ends_with("/links.json"))
        .count();
    // Initial refresh plus the refetch after the catalog changed.
    assert_eq!(link_fetches, 2);
}

#[test]
fn settings_update_reloads_catalog() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let mut console = loaded_console(&server);

    let mut patch = IndexMap::new();
    patch.insert(
        "AABBCC".into(),
        IndexMap::from([("name".into(), json!("Main Hub"))]),
    );
    console
        .execute(ConsoleCommand::UpdateSettings {
            target: SettingsTarget::Modems,
            patch,
        })
        .expect("update settings");
    assert!(console.run_until_idle(WAIT));

    let patches = server.state().requests_matching("PATCH");
    assert_eq!(patches[0].url, "/modems.json");
    assert_eq!(
        patches[0].body,
        Some(json!({"AABBCC": {"name": "Main Hub"}}))
    );
    let hub = console.index().responder("AABBCC_1").expect("hub");
    assert_eq!(hub.name.as_str(), "Main Hub");
}

#[test]
fn deletes_remove_rows_on_the_server() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let mut console = loaded_console(&server);

    console
        .execute(ConsoleCommand::DeleteDefined { id: LAMP.into() })
        .expect("delete defined");
    assert!(console.run_until_idle(WAIT));
    console
        .execute(ConsoleCommand::DeleteUndefined {
            key: "778899----0FF0".into(),
        })
        .expect("delete undefined");
    assert!(console.run_until_idle(WAIT));

    let deletes = server.state().requests_matching("DELETE");
    let urls = deletes
        .iter()
        .map(|request| request.url.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        urls,
        vec![
            "/modems/AABBCC/groups/1/links/definedLinks/000101.json",
            "/modems/AABBCC/groups/1/links/undefinedLinks/778899----0FF0.json",
        ]
    );
    assert!(deletes.iter().all(|request| request.body.is_none()));

    let rows = console.reconciler();
    assert!(rows.defined().is_empty());
    assert!(rows.undefined().is_empty());
    assert_eq!(rows.unknown().len(), 1);
}

#[test]
fn row_errors_do_not_dispatch() {
    let server = start_mock_server(MockState::new(CATALOG, LINKS));
    let mut console = loaded_console(&server);
    let sent = server.state().requests.len();

    assert!(console
        .execute(ConsoleCommand::Save { id: LAMP.into() })
        .is_err());
    assert!(console
        .execute(ConsoleCommand::DeleteUnknown { key: "nope".into() })
        .is_err());
    assert_eq!(console.in_flight(), 0);
    assert_eq!(server.state().requests.len(), sent);
}
