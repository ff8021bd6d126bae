//! Playback matching: selecting a recorded interaction for a live request

use std::collections::BTreeMap;

use crate::cassette::{Cassette, Interaction, RequestSnapshot};
use crate::config::VcrConfig;
use crate::naming::{query_set, split_url};
use crate::network::HttpRequest;
use crate::sanitize::Sanitizer;

/// Find the first interaction whose recorded request satisfies every
/// enabled match criterion against the live request.
///
/// Recorded order is scanned front to back; repeated identical requests
/// always replay the first match. There is no consume-and-advance
/// semantics for sequences of same-shape calls.
pub fn find_matching<'a>(
    config: &VcrConfig,
    sanitizer: &Sanitizer,
    cassette: &'a Cassette,
    live: &HttpRequest,
) -> Option<&'a Interaction> {
    cassette
        .interactions
        .iter()
        .find(|interaction| request_matches(config, sanitizer, &interaction.request, live))
}

/// Check a recorded request against a live one under the enabled criteria
pub fn request_matches(
    config: &VcrConfig,
    sanitizer: &Sanitizer,
    recorded: &RequestSnapshot,
    live: &HttpRequest,
) -> bool {
    if config.match_method && !recorded.method.eq_ignore_ascii_case(&live.method) {
        return false;
    }

    let (recorded_path, recorded_query) = split_url(&recorded.url);
    let (live_path, live_query) = split_url(&live.url);

    if config.match_uri && recorded_path != live_path {
        return false;
    }

    // Order-independent, multi-value-aware set equality, sensitive
    // parameters excluded on both sides
    if config.match_query {
        let recorded_params = query_set(recorded_query.as_deref(), sanitizer);
        let live_params = query_set(live_query.as_deref(), sanitizer);
        if recorded_params != live_params {
            return false;
        }
    }

    // Every non-sensitive header present on the recorded request must be
    // present on the live request with the same value
    if config.match_headers {
        let live_headers = first_values(&live.headers);
        for (name, recorded_value) in &recorded.headers {
            if sanitizer.is_sensitive_header(name) {
                continue;
            }
            match live_headers.get(name.to_lowercase().as_str()) {
                Some(live_value) if *live_value == recorded_value.as_str() => {}
                _ => return false,
            }
        }
    }

    if config.match_body && recorded.body != String::from_utf8_lossy(&live.body) {
        return false;
    }

    true
}

/// Collapse a live header list to lowercase-name -> first-value
fn first_values(headers: &[(String, String)]) -> BTreeMap<String, &str> {
    let mut map = BTreeMap::new();
    for (name, value) in headers {
        map.entry(name.to_lowercase()).or_insert(value.as_str());
    }
    map
}
