//! # sentra-core
//!
//! Core types, traits, errors, config, and constants for the Sentra
//! intelligence fusion platform.
//!
//! ## Modules
//!
//! - `models` — signals, entities, correlations, fused alerts, routed alerts,
//!   scoring rules, risk profiles
//! - `value` — dot-path resolution over attribute trees
//! - `config` — per-subsystem configuration with a single defaults table
//! - `errors` — typed error enums and the `SentraResult` alias
//! - `traits` — seams to external collaborators (knowledge graph, audit log,
//!   delivery handlers, normalizers)
//! - `tracing_setup` — structured logging initialization

pub mod config;
pub mod errors;
pub mod models;
pub mod tracing_setup;
pub mod traits;
pub mod value;

pub use config::SentraConfig;
pub use errors::{SentraError, SentraResult};
