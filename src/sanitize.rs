//! Credential scrubbing for recorded traffic
//!
//! Sensitive header values are replaced with a fixed marker before anything
//! is persisted. Sensitive query parameters are never rewritten in place;
//! naming and matching exclude them entirely instead.

use std::collections::BTreeMap;

use crate::config::VcrConfig;

/// Marker written in place of a redacted value
pub const REDACTED: &str = "[REDACTED]";

/// Decides which header and parameter names are sensitive and scrubs values
#[derive(Debug, Clone)]
pub struct Sanitizer {
    sanitize_headers: bool,
    sanitize_params: bool,
    header_substrings: Vec<String>,
    param_substrings: Vec<String>,
}

impl Sanitizer {
    /// Build a sanitizer from configuration, lowercasing the substring lists
    /// once up front
    pub fn from_config(config: &VcrConfig) -> Self {
        Self {
            sanitize_headers: config.sanitize_headers,
            sanitize_params: config.sanitize_params,
            header_substrings: config
                .redact_headers
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            param_substrings: config
                .redact_params
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        }
    }

    /// Whether a header name matches a configured sensitive substring
    pub fn is_sensitive_header(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.header_substrings.iter().any(|s| lower.contains(s))
    }

    /// Whether a query parameter name matches a configured sensitive substring
    pub fn is_sensitive_param(&self, name: &str) -> bool {
        if !self.sanitize_params {
            return false;
        }
        let lower = name.to_lowercase();
        self.param_substrings.iter().any(|s| lower.contains(s))
    }

    /// Collapse a header list to one value per key, redacting sensitive
    /// values. The first value wins for multi-valued headers.
    pub fn sanitize_headers(&self, headers: &[(String, String)]) -> BTreeMap<String, String> {
        let mut sanitized = BTreeMap::new();

        for (name, value) in headers {
            if sanitized.contains_key(name) {
                continue;
            }
            let stored = if self.sanitize_headers && self.is_sensitive_header(name) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            sanitized.insert(name.clone(), stored);
        }

        sanitized
    }
}
