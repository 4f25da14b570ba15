#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use linkdeck::{HttpApi, ServerConfig};
use linkdeck_core::request::{LinkEdit, LinkImport};
use linkdeck_core::{Address, DefinedLink, LinkScope, LinkStatus, LinksCollection};
use serde::Serialize;
use serde_json::{json, Value};
use tiny_http::{Header, Method, Response, Server};

pub const CATALOG: &str = r#"{
    "AABBCC": {
        "name": "Hub",
        "responder": true,
        "groups": {},
        "devices": {
            "112233": {
                "name": "Lamp",
                "responder": true,
                "data_1": {"name": "On/Off", "values": {"On": 255, "Off": 0}},
                "groups": {}
            },
            "778899": {
                "name": "Fan",
                "responder": true,
                "data_1": {"name": "Speed", "values": {"Low": 63, "Medium": 191, "High": 255}},
                "data_2": {"name": "None", "values": {"None": 0}},
                "groups": {}
            }
        }
    }
}"#;

pub const LINKS: &str = r#"{
    "definedLinks": {
        "000101": {"responder_id": "112233", "responder_name": "Lamp",
                   "data_1": 255, "data_2": 0, "data_3": 1, "status": "Good"}
    },
    "undefinedLinks": {
        "778899----0FF0": {"responder_id": "778899", "responder_name": "Fan",
                           "data_1": 191, "data_2": 0, "data_3": 1,
                           "responder_key": null, "controller_key": "0FF0"}
    },
    "unknownLinks": {
        "0FE8": {"device": "A1B2C3", "status": null}
    }
}"#;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
}

/// In-memory link server state for one scope.
#[derive(Debug)]
pub struct MockState {
    pub catalog: Value,
    pub links: LinksCollection,
    pub requests: Vec<RecordedRequest>,
    /// Status returned for every request while set.
    pub fail_status: Option<u16>,
    next_id: u32,
}

impl MockState {
    pub fn new(catalog: &str, links: &str) -> Self {
        Self {
            catalog: serde_json::from_str(catalog).expect("parse catalog fixture"),
            links: LinksCollection::from_json(links).expect("parse links fixture"),
            requests: Vec::new(),
            fail_status: None,
            next_id: 0x200,
        }
    }

    pub fn requests_matching(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests
            .iter()
            .filter(|request| request.method == method)
            .cloned()
            .collect()
    }

    fn handle(&mut self, method: &Method, url: &str, body: &str) -> (u16, String) {
        self.requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body: serde_json::from_str(body).ok(),
        });
        if let Some(status) = self.fail_status {
            return (status, "server error".to_string());
        }
        if url == "/modems.json" && *method == Method::Get {
            return (200, self.catalog.to_string());
        }
        if url == "/modems.json" && *method == Method::Patch {
            let Ok(Value::Object(patch)) = serde_json::from_str::<Value>(body) else {
                return (400, "invalid json".to_string());
            };
            self.patch_modems(patch);
            return (200, self.catalog.to_string());
        }
        if let Some((_, rest)) = url.split_once("/links") {
            return self.handle_links(method, rest, body);
        }
        if *method == Method::Post {
            if let Some((modem, device)) = parse_device_path(url) {
                self.add_device(&modem, &device);
                return (200, self.catalog.to_string());
            }
        }
        (404, "not found".to_string())
    }

    fn handle_links(&mut self, method: &Method, rest: &str, body: &str) -> (u16, String) {
        let rest = rest.trim_end_matches(".json");
        match (method, rest) {
            (Method::Get, "") => {}
            (Method::Post, "/definedLinks") => {
                let Ok(import) = serde_json::from_str::<LinkImport>(body) else {
                    return (400, "invalid json".to_string());
                };
                self.import(&import);
            }
            (Method::Patch, path) if path.starts_with("/definedLinks/") => {
                let id = &path["/definedLinks/".len()..];
                let Ok(edit) = serde_json::from_str::<LinkEdit>(body) else {
                    return (400, "invalid json".to_string());
                };
                let Some(link) = self.links.defined.iter_mut().find(|link| link.id == id) else {
                    return (404, "not found".to_string());
                };
                link.responder_id = edit.responder_id;
                link.responder_name = None;
                link.data_1 = edit.data_1;
                link.data_2 = edit.data_2;
                link.data_3 = edit.data_3;
                link.status = LinkStatus::Good;
            }
            (Method::Delete, path) if path.starts_with("/definedLinks/") => {
                let id = &path["/definedLinks/".len()..];
                self.links.defined.retain(|link| link.id != id);
            }
            (Method::Delete, path) if path.starts_with("/undefinedLinks/") => {
                let key = &path["/undefinedLinks/".len()..];
                self.links.undefined.retain(|link| link.key != key);
            }
            (Method::Delete, path) if path.starts_with("/unknownLinks/") => {
                let key = &path["/unknownLinks/".len()..];
                self.links.unknown.retain(|link| link.key != key);
            }
            _ => return (404, "not found".to_string()),
        }
        (200, self.keyed_links().to_string())
    }

    fn import(&mut self, import: &LinkImport) {
        self.links.undefined.retain(|link| {
            !(link.responder_id == import.responder_id
                && link.data_1 == import.data_1
                && link.data_2 == import.data_2
                && link.data_3 == import.data_3)
        });
        self.next_id += 1;
        self.links.defined.push(DefinedLink {
            id: format!("{:06X}", self.next_id).into(),
            responder_id: import.responder_id.clone(),
            responder_name: None,
            responder_group: Some(import.data_3),
            responder_key: None,
            controller_key: None,
            data_1: import.data_1,
            data_2: import.data_2,
            data_3: import.data_3,
            status: LinkStatus::Good,
        });
    }

    fn patch_modems(&mut self, patch: serde_json::Map<String, Value>) {
        for (address, attributes) in patch {
            let Some(Value::Object(modem)) = self.catalog.get_mut(&address) else {
                continue;
            };
            if let Value::Object(attributes) = attributes {
                modem.extend(attributes);
            }
        }
    }

    fn add_device(&mut self, modem: &str, device: &str) {
        if let Some(devices) = self
            .catalog
            .get_mut(modem)
            .and_then(|controller| controller.get_mut("devices"))
            .and_then(Value::as_object_mut)
        {
            devices.insert(
                device.to_string(),
                json!({"name": format!("Device {device}"), "responder": true, "groups": {}}),
            );
        }
        let address = Address::new(device);
        self.links.unknown.retain(|link| link.device != address);
    }

    /// Serialises the links the way the server does: keyed by id / key.
    fn keyed_links(&self) -> Value {
        json!({
            "definedLinks": keyed(&self.links.defined, |link| link.id.as_str()),
            "undefinedLinks": keyed(&self.links.undefined, |link| link.key.as_str()),
            "unknownLinks": keyed(&self.links.unknown, |link| link.key.as_str()),
        })
    }
}

fn keyed<T: Serialize>(entries: &[T], key: impl Fn(&T) -> &str) -> Value {
    Value::Object(
        entries
            .iter()
            .map(|entry| {
                let value = serde_json::to_value(entry).expect("serialise link");
                (key(entry).to_string(), value)
            })
            .collect(),
    )
}

fn parse_device_path(url: &str) -> Option<(String, String)> {
    let path = url.strip_prefix("/modems/")?.strip_suffix(".json")?;
    let (modem, device) = path.split_once("/devices/")?;
    if device.contains('/') {
        return None;
    }
    Some((modem.to_string(), device.to_string()))
}

pub struct MockServer {
    pub base: String,
    pub state: Arc<Mutex<MockState>>,
}

impl MockServer {
    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state")
    }

    pub fn api(&self) -> HttpApi {
        HttpApi::new(&ServerConfig {
            base_url: self.base.as_str().into(),
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_secs(2),
        })
    }
}

fn reserve_loopback_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let port = listener.local_addr().expect("read local addr").port();
    drop(listener);
    port
}

pub fn start_mock_server(state: MockState) -> MockServer {
    let port = reserve_loopback_port();
    let listen = format!("127.0.0.1:{port}");
    let server = Server::http(&listen).expect("start mock server");
    let state = Arc::new(Mutex::new(state));
    let shared = Arc::clone(&state);
    thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let method = request.method().clone();
            let url = request.url().to_string();
            let mut body = String::new();
            if request.as_reader().read_to_string(&mut body).is_err() {
                let rejected = Response::from_string("invalid body").with_status_code(400);
                let _ = request.respond(rejected);
                continue;
            }
            let (status, payload) = shared
                .lock()
                .expect("mock state")
                .handle(&method, &url, &body);
            let response = Response::from_string(payload)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes("Content-Type", "application/json").expect("header"),
                );
            let _ = request.respond(response);
        }
    });
    let base = format!("http://{listen}");
    wait_for_server(&base);
    state.lock().expect("mock state").requests.clear();
    MockServer { base, state }
}

fn wait_for_server(base: &str) {
    for _ in 0..80 {
        if ureq::get(&format!("{base}/modems.json")).call().is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(25));
    }
    panic!("mock server did not become reachable at {base}");
}

pub fn hub_scope() -> LinkScope {
    LinkScope::Modem {
        modem: Address::new("AABBCC"),
        group: 1,
    }
}
