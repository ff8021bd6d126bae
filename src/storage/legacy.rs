//! Legacy YAML cassette shape, accepted on read only
//!
//! The legacy shape carries multi-valued header arrays, a nested body
//! wrapper on responses, and may omit the status code. It is normalized
//! into the canonical [`Cassette`] here; nothing past this module ever
//! sees its structure.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::Deserialize;

use crate::cassette::{Cassette, Interaction, RequestSnapshot, ResponseSnapshot};
use crate::network::status_line;
use crate::{Result, TapeError};

#[derive(Debug, Deserialize)]
struct LegacyCassette {
    #[serde(default)]
    interactions: Vec<LegacyInteraction>,
}

#[derive(Debug, Deserialize)]
struct LegacyInteraction {
    request: LegacyRequest,
    response: LegacyResponse,
}

#[derive(Debug, Deserialize)]
struct LegacyRequest {
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    headers: HashMap<String, Vec<String>>,
    #[serde(rename = "uri")]
    url: String,
    method: String,
}

#[derive(Debug, Deserialize)]
struct LegacyResponse {
    #[serde(default)]
    body: LegacyBody,
    #[serde(default)]
    code: u16,
    #[serde(default)]
    headers: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyBody {
    #[serde(default)]
    string: String,
}

/// Parse a legacy YAML cassette and normalize it into the canonical shape
pub(super) fn parse(name: &str, data: &str) -> Result<Cassette> {
    let legacy: LegacyCassette =
        serde_yaml::from_str(data).map_err(|e| TapeError::MalformedCassette {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    Ok(convert(name, legacy))
}

fn convert(name: &str, legacy: LegacyCassette) -> Cassette {
    let now = Utc::now();
    let interactions = legacy
        .interactions
        .into_iter()
        .map(|interaction| {
            // Absent status code defaults to 200 with a synthesized line
            let status_code = if interaction.response.code == 0 {
                200
            } else {
                interaction.response.code
            };

            Interaction {
                request: RequestSnapshot {
                    method: interaction.request.method,
                    url: interaction.request.url,
                    headers: first_values(interaction.request.headers),
                    body: interaction.request.body.unwrap_or_default(),
                },
                response: ResponseSnapshot {
                    status_code,
                    status: status_line(status_code),
                    headers: first_values(interaction.response.headers),
                    body: interaction.response.body.string,
                },
                timestamp: now,
            }
        })
        .collect();

    Cassette {
        name: name.to_string(),
        interactions,
        recorded_at: now,
    }
}

/// Collapse multi-valued legacy headers to their first value
fn first_values(headers: HashMap<String, Vec<String>>) -> BTreeMap<String, String> {
    headers
        .into_iter()
        .filter_map(|(name, values)| values.into_iter().next().map(|first| (name, first)))
        .collect()
}
