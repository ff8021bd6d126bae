//! Cassette data model: recorded interactions and their on-disk shape

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded HTTP request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// HTTP method (e.g. "GET", "POST")
    pub method: String,
    /// Full request URL
    pub url: String,
    /// Request headers, one value per key, sensitive values redacted
    pub headers: BTreeMap<String, String>,
    /// Request body
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// A recorded HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// HTTP status code
    pub status_code: u16,
    /// Status line (e.g. "200 OK")
    pub status: String,
    /// Response headers, one value per key, sensitive values redacted
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub body: String,
}

/// One request/response pair plus its capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Request as sent
    pub request: RequestSnapshot,
    /// Response as received
    pub response: ResponseSnapshot,
    /// When the interaction was captured (RFC3339)
    pub timestamp: DateTime<Utc>,
}

/// A named, ordered collection of recorded interactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cassette {
    /// Cassette name (also the file name under the cassette directory)
    pub name: String,
    /// Interactions in recorded order
    pub interactions: Vec<Interaction>,
    /// When recording started (RFC3339)
    pub recorded_at: DateTime<Utc>,
}

impl Cassette {
    /// Create an empty cassette stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interactions: Vec::new(),
            recorded_at: Utc::now(),
        }
    }
}
