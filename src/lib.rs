//! httptape - Deterministic HTTP record-replay transport
//!
//! Records live HTTP interactions into named cassette files and replays them
//! later, so tests of code that calls external APIs run without network
//! access. Credentials are scrubbed before anything touches disk.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    async_fn_in_trait,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::multiple_crate_versions
)]

pub mod cassette;
pub mod config;
pub mod error;
pub mod matching;
pub mod naming;
pub mod network;
pub mod sanitize;
pub mod storage;
pub mod transport;

pub use cassette::{Cassette, Interaction, RequestSnapshot, ResponseSnapshot};
pub use config::{Mode, VcrConfig};
pub use error::{Result, TapeError};
pub use network::{HttpRequest, HttpResponse, HyperTransport, LiveTransport};
pub use transport::{VcrStats, VcrTransport};
