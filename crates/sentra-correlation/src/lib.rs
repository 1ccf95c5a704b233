//! # sentra-correlation
//!
//! Matches entities extracted from signals against an in-process entity
//! pool using four independent strategies (exact field overlap, fuzzy
//! character-set similarity, temporal proximity, geographic proximity),
//! detects temporal/geographic clusters, and infers threat trajectories
//! from repeated temporal correlations.
//!
//! ## Modules
//!
//! - `engine` — `CorrelationEngine` with the entity pool and result cache
//! - `extract` — entity candidate extraction from signal attributes
//! - `strategies` — the four match strategies
//! - `patterns` — cluster detection over filtered correlations
//! - `trajectory` — threat trajectory inference

pub mod engine;
pub mod extract;
pub mod patterns;
pub mod strategies;
pub mod trajectory;

pub use engine::{CorrelationEngine, CorrelationResult, CorrelationStats, EntityCorrelations};
pub use patterns::CorrelationPattern;
pub use trajectory::{ThreatTrajectory, TrajectoryDirection};
