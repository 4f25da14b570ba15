//! Console event loop.
//!
//! The console owns the catalog index and the rows of one scope. Requests run
//! on short-lived worker threads; their completions come back as
//! [`ConsoleEvent`]s on the console's channel and are applied one at a time by
//! the thread that owns the console:
//!
//! `dispatch -> worker -> Completed event -> apply (index / reconcile) -> render`
//!
//! Responses are stamped per stream (catalog, links) with the order their
//! requests were issued in. A response older than the newest one already
//! completed on its stream is dropped, so a slow early fetch never overwrites
//! a later one.

#![allow(missing_docs)]

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use linkdeck_core::catalog::CatalogIndex;
use linkdeck_core::request::{SettingsPatch, SettingsTarget};
use linkdeck_core::{
    ApiRequest, CoreError, FieldSlot, LinkScope, LinksCollection, Raw, Reconciler, ResponseKind,
};
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiResponse, LinkApi};
use crate::html;

/// User actions accepted by the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Fetch the catalog and the scope's links.
    Refresh,
    /// Unlock a defined row for editing.
    BeginEdit { id: SmolStr },
    /// Pick a responder by roster key.
    SelectResponder { id: SmolStr, key: SmolStr },
    /// Pick a `data_1`/`data_2` option by raw value.
    SelectField {
        id: SmolStr,
        slot: FieldSlot,
        value: Raw,
    },
    /// Submit the edited row.
    Save { id: SmolStr },
    /// Drop the edit.
    Cancel { id: SmolStr },
    /// Re-submit a broken link.
    Fix { id: SmolStr },
    /// Delete a defined link.
    DeleteDefined { id: SmolStr },
    /// Turn an undefined link into a defined one.
    ImportUndefined { key: SmolStr },
    /// Remove an undefined link from the devices.
    DeleteUndefined { key: SmolStr },
    /// Remove a link naming an unknown device.
    DeleteUnknown { key: SmolStr },
    /// Add the unknown device to the scope's modem.
    AddUnknownDevice { key: SmolStr },
    /// Patch a settings collection.
    UpdateSettings {
        target: SettingsTarget,
        patch: SettingsPatch,
    },
}

#[derive(Debug)]
pub enum ConsoleEvent {
    Command(ConsoleCommand),
    /// A dispatched request finished.
    Completed {
        seq: u64,
        kind: ResponseKind,
        request: ApiRequest,
        result: Result<ApiResponse, ApiError>,
    },
}

#[derive(Debug, Default, Clone, Copy)]
struct Stream {
    issued: u64,
    completed: u64,
}

impl Stream {
    fn next(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.completed {
            return false;
        }
        self.completed = seq;
        true
    }
}

pub struct Console {
    api: Arc<dyn LinkApi>,
    index: CatalogIndex,
    reconciler: Reconciler,
    last_links: Option<LinksCollection>,
    events_tx: Sender<ConsoleEvent>,
    events_rx: Receiver<ConsoleEvent>,
    catalog_stream: Stream,
    links_stream: Stream,
    in_flight: usize,
    revision: u64,
    last_error: Option<ApiError>,
}

impl Console {
    #[must_use]
    pub fn new(api: Arc<dyn LinkApi>, scope: LinkScope) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            api,
            index: CatalogIndex::default(),
            reconciler: Reconciler::new(scope),
            last_links: None,
            events_tx,
            events_rx,
            catalog_stream: Stream::default(),
            links_stream: Stream::default(),
            in_flight: 0,
            revision: 0,
            last_error: None,
        }
    }

    #[must_use]
    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    #[must_use]
    pub fn scope(&self) -> &LinkScope {
        self.reconciler.scope()
    }

    /// Bumped every time the index or the rows are replaced.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// The most recent request failure not yet taken.
    #[must_use]
    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<ApiError> {
        self.last_error.take()
    }

    /// Channel for posting commands from other threads.
    #[must_use]
    pub fn sender(&self) -> Sender<ConsoleEvent> {
        self.events_tx.clone()
    }

    #[must_use]
    pub fn render_html(&self) -> String {
        html::render_links(&self.reconciler)
    }

    pub fn refresh(&mut self) {
        self.fetch_catalog();
        self.fetch_links();
    }

    pub fn fetch_catalog(&mut self) -> u64 {
        self.dispatch(ApiRequest::FetchCatalog)
    }

    pub fn fetch_links(&mut self) -> u64 {
        self.dispatch(self.reconciler.fetch_request())
    }

    /// Applies a user action, dispatching the request it produces.
    ///
    /// Returns the sequence number of the dispatched request, if any.
    pub fn execute(&mut self, command: ConsoleCommand) -> Result<Option<u64>, CoreError> {
        let request = match command {
            ConsoleCommand::Refresh => {
                self.refresh();
                return Ok(None);
            }
            ConsoleCommand::BeginEdit { id } => {
                self.reconciler.begin_edit(&id)?;
                return Ok(None);
            }
            ConsoleCommand::SelectResponder { id, key } => {
                self.reconciler.select_responder(&self.index, &id, &key)?;
                return Ok(None);
            }
            ConsoleCommand::SelectField { id, slot, value } => {
                self.reconciler.select_field(&id, slot, value)?;
                return Ok(None);
            }
            ConsoleCommand::Cancel { id } => {
                self.reconciler.cancel(&id)?;
                return Ok(None);
            }
            ConsoleCommand::Save { id } => self.reconciler.save(&id)?,
            ConsoleCommand::Fix { id } => self.reconciler.fix(&id)?,
            ConsoleCommand::DeleteDefined { id } => self.reconciler.delete_defined(&id)?,
            ConsoleCommand::ImportUndefined { key } => self.reconciler.import_undefined(&key)?,
            ConsoleCommand::DeleteUndefined { key } => self.reconciler.delete_undefined(&key)?,
            ConsoleCommand::DeleteUnknown { key } => self.reconciler.delete_unknown(&key)?,
            ConsoleCommand::AddUnknownDevice { key } => self.reconciler.add_unknown_device(&key)?,
            ConsoleCommand::UpdateSettings { target, patch } => {
                ApiRequest::UpdateSettings { target, patch }
            }
        };
        Ok(Some(self.dispatch(request)))
    }

    /// Runs `request` on a worker thread.
    pub fn dispatch(&mut self, request: ApiRequest) -> u64 {
        let kind = request.response_kind();
        let seq = self.stream_mut(kind).next();
        let api = Arc::clone(&self.api);
        let events = self.events_tx.clone();
        self.in_flight += 1;
        debug!(
            seq,
            method = request.method().as_str(),
            path = %request.path(),
            "dispatching request"
        );
        thread::spawn(move || {
            let result = api.execute(&request);
            let _ = events.send(ConsoleEvent::Completed {
                seq,
                kind,
                request,
                result,
            });
        });
        seq
    }

    /// Handles every queued event without blocking. Returns the count.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for one event and handles it.
    pub fn process_next(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle(event);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Handles events until no request is in flight or `timeout` elapses.
    ///
    /// Returns `false` on timeout.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump();
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.process_next(remaining) {
                warn!(in_flight = self.in_flight, "console did not become idle");
                return false;
            }
        }
        true
    }

    pub fn handle(&mut self, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Command(command) => {
                if let Err(err) = self.execute(command) {
                    warn!(%err, "command rejected");
                }
            }
            ConsoleEvent::Completed {
                seq,
                kind,
                request,
                result,
            } => self.complete(seq, kind, &request, result),
        }
    }

    fn complete(
        &mut self,
        seq: u64,
        kind: ResponseKind,
        request: &ApiRequest,
        result: Result<ApiResponse, ApiError>,
    ) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if !self.stream_mut(kind).accept(seq) {
            debug!(seq, ?kind, path = %request.path(), "discarding stale response");
            return;
        }
        match result {
            Err(err) => {
                warn!(%err, "request failed; keeping current view");
                self.last_error = Some(err);
            }
            Ok(ApiResponse::Catalog(snapshot)) => {
                self.index.load(snapshot);
                if let Some(links) = &self.last_links {
                    self.reconciler.reconcile(&self.index, links);
                }
                self.applied();
                info!(responders = self.index.responder_count(), "catalog loaded");
                // New devices or names can reclassify links.
                if matches!(
                    request,
                    ApiRequest::AddDevice { .. } | ApiRequest::UpdateSettings { .. }
                ) {
                    self.fetch_links();
                }
            }
            Ok(ApiResponse::Links(links)) => {
                self.reconciler.reconcile(&self.index, &links);
                self.last_links = Some(links);
                self.applied();
            }
        }
    }

    fn applied(&mut self) {
        self.revision += 1;
    }

    fn stream_mut(&mut self, kind: ResponseKind) -> &mut Stream {
        match kind {
            ResponseKind::Catalog => &mut self.catalog_stream,
            ResponseKind::Links => &mut self.links_stream,
        }
    }
}
