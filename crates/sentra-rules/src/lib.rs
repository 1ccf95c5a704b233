//! # sentra-rules
//!
//! Scores signals against a declarative rule set into a bounded priority
//! number, with per-rule contribution clamps, custom evaluators, an
//! optional (source, category, entity) score cache, and per-entity risk
//! profiles.
//!
//! ## Modules
//!
//! - `engine` — `RulesEngine` with rule management and scoring
//! - `conditions` — dot-path condition evaluation
//! - `builtin` — the stock rule set
//! - `risk` — risk profile trend derivation and recommendation templates

pub mod builtin;
pub mod conditions;
pub mod engine;
pub mod risk;

pub use engine::{CustomEvaluator, RulesEngine, RulesReport};
