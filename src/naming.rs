//! Deterministic cassette naming
//!
//! A cassette name is a human-readable prefix (method plus the first path
//! segments) followed by a truncated SHA-256 digest over method, path, and
//! the sorted set of non-sensitive query parameters. Sensitive parameters
//! are excluded entirely so their values can neither influence nor leak
//! into the derived name.

use std::collections::{BTreeMap, BTreeSet};

use sha2::{Digest, Sha256};

use crate::sanitize::Sanitizer;

/// Hex characters of the digest kept in the name
const DIGEST_LEN: usize = 12;

/// Path segments included in the readable prefix
const PREFIX_SEGMENTS: usize = 3;

/// Derive the cassette file name for a request
pub fn cassette_name(sanitizer: &Sanitizer, method: &str, url: &str) -> String {
    let (path, query) = split_url(url);
    let params = query_set(query.as_deref(), sanitizer);

    let mut hasher = Sha256::new();
    hasher.update(method.to_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(path.as_bytes());
    hasher.update(b"|");
    for (key, values) in &params {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        let joined = values.iter().cloned().collect::<Vec<_>>().join(",");
        hasher.update(joined.as_bytes());
        hasher.update(b"&");
    }
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}_{}.json",
        readable_prefix(method, &path),
        &digest[..DIGEST_LEN]
    )
}

/// Build the readable prefix from the method and leading path segments
fn readable_prefix(method: &str, path: &str) -> String {
    let mut prefix = method.to_lowercase();

    for segment in path
        .split('/')
        .filter(|s| !s.is_empty())
        .take(PREFIX_SEGMENTS)
    {
        prefix.push('_');
        for c in segment.chars() {
            if c.is_ascii_alphanumeric() {
                prefix.push(c.to_ascii_lowercase());
            } else {
                prefix.push('_');
            }
        }
    }

    prefix
}

/// Split a URL into its path and raw query string
pub(crate) fn split_url(url: &str) -> (String, Option<String>) {
    match url.parse::<hyper::Uri>() {
        Ok(uri) => (uri.path().to_string(), uri.query().map(str::to_string)),
        Err(_) => (url.to_string(), None),
    }
}

/// Parse a raw query string into a sorted key -> value-set map, dropping
/// sensitive keys. Duplicate key/value pairs collapse so duplication never
/// changes naming or matching.
pub(crate) fn query_set(
    query: Option<&str>,
    sanitizer: &Sanitizer,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut params: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    let Some(query) = query else {
        return params;
    };

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        if sanitizer.is_sensitive_param(&key) {
            continue;
        }
        params.entry(key).or_default().insert(decode_component(value));
    }

    params
}

/// Percent-decode one query component, treating `+` as a space
fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    urlencoding::decode(&plus_decoded)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or(plus_decoded)
}
