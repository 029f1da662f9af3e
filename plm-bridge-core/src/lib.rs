#![doc = "plm-bridge-core: client, automation and transcription logic for plm-bridge."]

//! - [`client`]: REST client for a Teamcenter-style PLM server.
//! - [`contract`]: the [`contract::PlmApi`] trait the client implements and the
//!   automation is written against.
//! - [`assembly`]: plan-driven assembly build and reporting.
//! - [`transcribe`]: markdown templates and the `sources.json` ledger for
//!   training-video transcription.

pub mod assembly;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod model;
pub mod session;
pub mod transcribe;

pub use client::TeamcenterClient;
pub use contract::PlmApi;
pub use error::{BestEffort, PlmError, TranscribeError};
