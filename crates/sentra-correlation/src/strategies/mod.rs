//! The four match strategies. Each returns a raw score in [0, 1] or `None`
//! when the pair cannot be compared; the engine applies the qualification
//! thresholds from config.

pub mod exact;
pub mod fuzzy;
pub mod geographic;
pub mod temporal;

pub use exact::exact_score;
pub use fuzzy::fuzzy_score;
pub use geographic::{geographic_score, haversine_meters};
pub use temporal::temporal_score;
