//! HTTP boundary of the console.

#![allow(missing_docs)]

use std::fmt;

use linkdeck_core::{ApiRequest, CatalogSnapshot, LinksCollection, ResponseKind};
use smol_str::SmolStr;
use thiserror::Error;
use tracing::debug;

use crate::config::ServerConfig;

/// Failures of a single request. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection, timeout or body read failure.
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: &'static str,
        url: SmolStr,
        message: SmolStr,
    },

    /// Non-2xx response.
    #[error("{method} {url} returned status {status}")]
    Status {
        method: &'static str,
        url: SmolStr,
        status: u16,
    },

    /// Body is not the expected document.
    #[error("invalid response from {url}: {message}")]
    Decode { url: SmolStr, message: SmolStr },
}

/// A decoded response document.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Catalog(CatalogSnapshot),
    Links(LinksCollection),
}

impl ApiResponse {
    #[must_use]
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::Catalog(_) => ResponseKind::Catalog,
            Self::Links(_) => ResponseKind::Links,
        }
    }

    /// Decodes `text` as the document `kind` names.
    pub fn decode(kind: ResponseKind, url: &str, text: &str) -> Result<Self, ApiError> {
        let decode_error = |message: String| ApiError::Decode {
            url: SmolStr::new(url),
            message: message.into(),
        };
        match kind {
            ResponseKind::Catalog => CatalogSnapshot::from_json(text)
                .map(Self::Catalog)
                .map_err(|err| decode_error(err.to_string())),
            ResponseKind::Links => LinksCollection::from_json(text)
                .map(Self::Links)
                .map_err(|err| decode_error(err.to_string())),
        }
    }
}

/// Executes console requests. Implementations are called from worker threads.
pub trait LinkApi: Send + Sync {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Blocking HTTP client for the link server.
#[derive(Debug, Clone)]
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: SmolStr,
}

impl HttpApi {
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .build();
        Self {
            agent,
            base_url: SmolStr::new(config.base_url.trim_end_matches('/')),
        }
    }

    #[must_use]
    pub fn url(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }
}

impl LinkApi for HttpApi {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url(request);
        let method = request.method().as_str();
        debug!(method, %url, "sending request");
        let builder = self.agent.request(method, &url);
        let result = match request.body() {
            Some(body) => builder
                .set("Content-Type", "application/json")
                .send_string(&body.to_string()),
            None => builder.call(),
        };
        let response = result.map_err(|err| request_error(method, &url, err))?;
        let text = response
            .into_string()
            .map_err(|err| transport_error(method, &url, &err))?;
        ApiResponse::decode(request.response_kind(), &url, &text)
    }
}

fn request_error(method: &'static str, url: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, _) => ApiError::Status {
            method,
            url: SmolStr::new(url),
            status,
        },
        ureq::Error::Transport(transport) => transport_error(method, url, &transport),
    }
}

fn transport_error(method: &'static str, url: &str, err: &dyn fmt::Display) -> ApiError {
    ApiError::Transport {
        method,
        url: SmolStr::new(url),
        message: err.to_string().into(),
    }
}
