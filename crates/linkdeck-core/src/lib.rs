//! `linkdeck-core` - catalog indexing and link reconciliation for Insteon link consoles.
//!
//! The crate is free of I/O. It turns two independently fetched JSON documents,
//! the catalog snapshot (`/modems.json`) and the links collection of one scope
//! (`{scope}/links.json`), into row view-models that a renderer can display and
//! a console can edit:
//!
//! - [`catalog::CatalogIndex`] resolves the schema of any link endpoint and
//!   lists every responder in snapshot order.
//! - [`reconcile::Reconciler`] classifies defined, undefined and unknown links
//!   into rows and runs the per-row edit state machine.
//! - [`fields::render_field`] builds the select controls used for the
//!   `data_1`/`data_2` fields.
//!
//! Every edit is expressed as an outbound [`request::ApiRequest`]; the server's
//! response is fed back through the same pipeline.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

/// Device and group addresses.
pub mod address;
/// Catalog snapshot model, detail resolver and responder roster.
pub mod catalog;
/// Core errors.
pub mod error;
/// Schema-driven select controls.
pub mod fields;
/// Link collections as served per scope.
pub mod links;
/// Row view-models and the link edit state machine.
pub mod reconcile;
/// Outbound API requests.
pub mod request;
/// Link scopes (controller groups) and page locations.
pub mod scope;

pub use address::{Address, GroupNumber, Raw, BASE_GROUP};
pub use catalog::{CatalogIndex, CatalogSnapshot, EndpointDetails, FieldSchema, FieldSlot};
pub use error::CoreError;
pub use links::{DefinedLink, LinkStatus, LinksCollection, UndefinedLink, UnknownLink};
pub use reconcile::{DefinedRow, Reconciler, RowAction, RowMode, UndefinedRow, UnknownRow};
pub use request::{ApiRequest, HttpMethod, ResponseKind};
pub use scope::LinkScope;
