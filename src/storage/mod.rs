//! Cassette persistence: per-instance in-memory cache plus on-disk files
//!
//! The native shape is pretty-printed JSON, one file per cassette. A legacy
//! YAML shape is accepted on read only and normalized behind
//! [`legacy`]'s adapter boundary.

mod legacy;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::cassette::{Cassette, Interaction};
use crate::config::Mode;
use crate::{Result, TapeError};

/// In-memory cache plus on-disk persistence of named cassettes.
///
/// The cache is owned by the store instance, never process-global, so
/// parallel transports cannot cross-contaminate. Concurrent appends to the
/// same cassette name race on the full-file rewrite: last writer wins and
/// earlier appends can be lost. Callers needing concurrent recording should
/// keep one cassette per logical scenario.
pub struct CassetteStore {
    dir: PathBuf,
    cache: DashMap<String, Arc<Cassette>>,
}

impl CassetteStore {
    /// Create a store over the given cassette directory
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            cache: DashMap::new(),
        }
    }

    /// Whether the cassette file exists on disk
    pub fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Load a cassette by name.
    ///
    /// A cache hit returns immediately without disk access. On a miss the
    /// file is read and parsed: a `.yaml`/`.yml` extension selects the
    /// legacy shape, anything else the native JSON shape. An absent file is
    /// reported with the recording workflow needed to produce it; `mode` is
    /// only used to make that message concrete.
    pub fn load(&self, name: &str, mode: Mode) -> Result<Arc<Cassette>> {
        if let Some(cassette) = self.cache.get(name) {
            return Ok(Arc::clone(cassette.value()));
        }

        let path = self.path(name);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TapeError::CassetteMissing {
                    name: name.to_string(),
                    path,
                    mode,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let cassette = if name.ends_with(".yaml") || name.ends_with(".yml") {
            legacy::parse(name, &data)?
        } else {
            serde_json::from_str::<Cassette>(&data).map_err(|e| TapeError::MalformedCassette {
                name: name.to_string(),
                reason: e.to_string(),
            })?
        };

        debug!(
            "loaded cassette {name}: {} interactions",
            cassette.interactions.len()
        );

        let cassette = Arc::new(cassette);
        self.cache.insert(name.to_string(), Arc::clone(&cassette));
        Ok(cassette)
    }

    /// Append an interaction to a cassette and persist the whole cassette.
    ///
    /// The cassette is created in memory if neither the cache nor the disk
    /// has it yet. Every append rewrites the full file; there is no partial
    /// or merge write path.
    pub fn append(&self, name: &str, interaction: Interaction) -> Result<()> {
        let mut cassette = if let Some(entry) = self.cache.get(name) {
            (**entry.value()).clone()
        } else if self.exists(name) {
            (*self.load(name, Mode::Record)?).clone()
        } else {
            Cassette::new(name)
        };

        cassette.interactions.push(interaction);
        self.save(name, cassette)
    }

    /// Serialize a cassette to the native shape, overwriting the file
    fn save(&self, name: &str, cassette: Cassette) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let data = serde_json::to_string_pretty(&cassette)
            .map_err(|e| TapeError::Other(format!("failed to serialize cassette {name}: {e}")))?;
        std::fs::write(self.path(name), data)?;

        debug!(
            "saved cassette {name}: {} interactions",
            cassette.interactions.len()
        );

        self.cache.insert(name.to_string(), Arc::new(cassette));
        Ok(())
    }

    /// Number of cassettes currently held in the cache
    pub fn loaded_count(&self) -> usize {
        self.cache.len()
    }

    /// Total interactions across all cached cassettes
    pub fn total_interactions(&self) -> usize {
        self.cache
            .iter()
            .map(|entry| entry.value().interactions.len())
            .sum()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}
