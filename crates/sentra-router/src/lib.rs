//! # sentra-router
//!
//! Fans fused alerts out to destinations: tier table ∪ explicit
//! destinations ∪ configured defaults, minus feature-flagged-off entries.
//! A bounded worker pool delivers each routed alert under a timeout with a
//! fixed-delay bounded retry; acknowledgment is tracked independently of
//! delivery outcome.
//!
//! ## Modules
//!
//! - `router` — `AlertRouter`: destination resolution, delivery pool,
//!   retry, acknowledgment, expiry sweep
//! - `advisory` — derived advisory bulletins for a destination subset

pub mod advisory;
pub mod router;

pub use router::{AlertRouter, RouterMetrics};
