//! Origin descriptor attached to every dispatched call.
//!
//! The call surface — not the caller — decides what goes in here: the
//! content-script binding injects the page origin ahead of caller-supplied
//! arguments so an untrusted page can never spoof where a request came from.

use serde::{Deserialize, Serialize};

/// Which call surface a request entered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallSource {
    /// Same-process direct call (wallet UI or internal code).
    Internal,
    /// Extension content-script bridge (untrusted page).
    Page,
    /// Background-worker message bridge.
    Worker,
}

/// Origin descriptor for one dispatched call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDappRequest {
    /// Surface the call entered through.
    pub source: CallSource,
    /// Verified origin of the requesting context, when the surface knows it.
    /// Trusted: set by the binding, never by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ApiDappRequest {
    /// Request from trusted in-process code.
    pub fn internal() -> Self {
        Self {
            source: CallSource::Internal,
            origin: None,
        }
    }

    /// Request from an untrusted page, with the origin the content script
    /// observed.
    pub fn from_page(origin: impl Into<String>) -> Self {
        Self {
            source: CallSource::Page,
            origin: Some(origin.into()),
        }
    }

    /// Request from the background worker.
    pub fn from_worker(origin: Option<String>) -> Self {
        Self {
            source: CallSource::Worker,
            origin,
        }
    }
}
