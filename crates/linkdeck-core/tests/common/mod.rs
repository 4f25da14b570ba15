#![allow(dead_code)]

use linkdeck_core::{Address, CatalogIndex, CatalogSnapshot, LinkScope, LinksCollection};

/// One hub with one lamp.
pub const HUB_AND_LAMP: &str = r#"{
    "AABBCC": {
        "name": "Hub",
        "responder": true,
        "groups": {},
        "devices": {
            "112233": {
                "name": "Lamp",
                "responder": true,
                "data_1": {"name": "On/Off", "values": {"On": 1, "Off": 0}},
                "groups": {}
            }
        }
    }
}"#;

/// Two hubs, groups at both levels and a device address shared by both hubs.
pub const HOUSE: &str = r#"{
    "AABBCC": {
        "name": "Hub",
        "responder": true,
        "ip": "192.168.1.20",
        "port": 25105,
        "data_1": {"name": "On/Off", "values": {"ON": 255, "OFF": 0}},
        "data_2": {"name": "None", "values": {"None": 0}},
        "groups": {
            "2": {
                "name": "Evening",
                "responder": true,
                "data_1": {"name": "Scene Level", "values": {"Full": 255, "Dim": 64}}
            }
        },
        "devices": {
            "112233": {
                "name": "Lamp",
                "responder": true,
                "data_1": {"name": "On/Off", "values": {"On": 1, "Off": 0}},
                "groups": {}
            },
            "445566": {
                "name": "Keypad",
                "responder": false,
                "groups": {
                    "3": {
                        "name": "Button C",
                        "responder": true,
                        "data_1": {
                            "name": "On Level",
                            "values": {"Full": 255, "Half": 127, "Off": 0}
                        },
                        "data_2": {"name": "Ramp Rate", "values": {"2 sec": 27, "0.5 sec": 28}}
                    },
                    "4": {"name": "Button D", "responder": false}
                }
            }
        }
    },
    "DDEEFF": {
        "name": "Garage Hub",
        "responder": false,
        "groups": {},
        "devices": {
            "112233": {
                "name": "Lamp Elsewhere",
                "responder": true,
                "data_1": {"name": "Level", "values": {"High": 200}},
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

pub fn index(json: &str) -> CatalogIndex {
    CatalogIndex::build(CatalogSnapshot::from_json(json).expect("parse catalog fixture"))
}

pub fn links(json: &str) -> LinksCollection {
    LinksCollection::from_json(json).expect("parse links fixture")
}

pub fn hub_scope() -> LinkScope {
    LinkScope::Modem {
        modem: Address::new("AABBCC"),
        group: 1,
    }
}
