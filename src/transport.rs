//! Mode state machine and transport interceptor
//!
//! [`VcrTransport`] is the public entry point: it wraps a live transport and
//! answers each intercepted call according to the configured mode. Playback
//! never touches the network; recording never lets a persistence failure
//! break the live code path.

use std::path::PathBuf;

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cassette::{Interaction, RequestSnapshot, ResponseSnapshot};
use crate::config::{Mode, VcrConfig};
use crate::matching::find_matching;
use crate::naming::cassette_name;
use crate::network::{HttpRequest, HttpResponse, LiveTransport};
use crate::sanitize::Sanitizer;
use crate::storage::CassetteStore;
use crate::{Result, TapeError};

/// Record-replay transport wrapping a live transport
pub struct VcrTransport<T> {
    config: VcrConfig,
    sanitizer: Sanitizer,
    store: CassetteStore,
    live: T,
}

impl<T: LiveTransport> VcrTransport<T> {
    /// Create a transport from configuration and the live transport it wraps
    #[must_use]
    pub fn new(config: VcrConfig, live: T) -> Self {
        let sanitizer = Sanitizer::from_config(&config);
        let store = CassetteStore::new(config.cassette_dir.clone());
        Self {
            config,
            sanitizer,
            store,
            live,
        }
    }

    /// Answer an intercepted HTTP call according to the configured mode
    pub async fn intercept(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if !self.config.enabled || self.config.mode == Mode::Off {
            return self.live.execute(request).await;
        }

        let cassette = match &self.config.cassette_name {
            Some(name) => name.clone(),
            None => cassette_name(&self.sanitizer, &request.method, &request.url),
        };

        debug!(
            cassette = %cassette,
            method = %request.method,
            url = %request.url,
            mode = %self.config.mode,
            "intercepting request"
        );

        match self.config.mode {
            Mode::Off => self.live.execute(request).await,
            Mode::Record => self.record(&cassette, request).await,
            Mode::Playback => self.playback(&cassette, Mode::Playback, request),
            Mode::RecordOnce => {
                if self.store.exists(&cassette) {
                    self.playback(&cassette, Mode::RecordOnce, request)
                } else {
                    self.record(&cassette, request).await
                }
            }
        }
    }

    /// Serve the first recorded interaction matching the live request
    fn playback(
        &self,
        cassette: &str,
        mode: Mode,
        request: &HttpRequest,
    ) -> Result<HttpResponse> {
        let loaded = self.store.load(cassette, mode)?;

        let Some(interaction) = find_matching(&self.config, &self.sanitizer, &loaded, request)
        else {
            return Err(TapeError::PlaybackMiss {
                cassette: cassette.to_string(),
                method: request.method.clone(),
                url: request.url.clone(),
            });
        };

        debug!(
            cassette = %cassette,
            status_code = interaction.response.status_code,
            "playing back interaction"
        );

        Ok(synthesize(&interaction.response))
    }

    /// Execute the live call, persist the sanitized interaction, and return
    /// the live response
    async fn record(&self, cassette: &str, request: &HttpRequest) -> Result<HttpResponse> {
        let response = self.live.execute(request).await?;

        let interaction = Interaction {
            request: RequestSnapshot {
                method: request.method.clone(),
                url: request.url.clone(),
                headers: self.sanitizer.sanitize_headers(&request.headers),
                body: String::from_utf8_lossy(&request.body).into_owned(),
            },
            response: ResponseSnapshot {
                status_code: response.status_code,
                status: response.status.clone(),
                headers: self.sanitizer.sanitize_headers(&response.headers),
                body: String::from_utf8_lossy(&response.body).into_owned(),
            },
            timestamp: Utc::now(),
        };

        // Recording is best-effort: the live response is returned even if
        // persistence fails
        if let Err(e) = self.store.append(cassette, interaction) {
            warn!("failed to record interaction to {cassette}: {e}");
        }

        Ok(response)
    }

    /// Diagnostics snapshot; informational only
    pub fn stats(&self) -> VcrStats {
        VcrStats {
            mode: self.config.mode,
            enabled: self.config.enabled,
            cassette_dir: self.config.cassette_dir.clone(),
            loaded_cassettes: self.store.loaded_count(),
            total_interactions: self.store.total_interactions(),
        }
    }
}

/// Build a caller-facing response from a recorded snapshot
fn synthesize(snapshot: &ResponseSnapshot) -> HttpResponse {
    HttpResponse {
        status_code: snapshot.status_code,
        status: snapshot.status.clone(),
        headers: snapshot
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        body: Bytes::from(snapshot.body.clone().into_bytes()),
    }
}

/// Diagnostics for the transport and its cassette cache
#[derive(Debug, Clone, Serialize)]
pub struct VcrStats {
    /// Configured mode
    pub mode: Mode,
    /// Whether interception is enabled
    pub enabled: bool,
    /// Cassette directory
    pub cassette_dir: PathBuf,
    /// Cassettes currently loaded in memory
    pub loaded_cassettes: usize,
    /// Total interactions across loaded cassettes
    pub total_interactions: usize,
}
