//! Temporal proximity with linear decay across the window.

use sentra_core::models::EntityRef;

/// Score = 1 − Δt / window. Exactly 1.0 at Δt = 0, reaching 0 at the window
/// edge; `None` beyond the window.
pub fn temporal_score(a: &EntityRef, b: &EntityRef, window_hours: f64) -> Option<f64> {
    if window_hours <= 0.0 {
        return None;
    }
    let delta = a.timestamp.signed_duration_since(b.timestamp);
    let delta_hours = (delta.num_milliseconds().abs() as f64) / 3_600_000.0;
    if delta_hours > window_hours {
        return None;
    }
    Some(1.0 - delta_hours / window_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sentra_core::models::EntityType;

    #[test]
    fn zero_delta_scores_one() {
        let now = Utc::now();
        let a = EntityRef::new("a", EntityType::Person).with_timestamp(now);
        let b = EntityRef::new("b", EntityType::Person).with_timestamp(now);
        assert_eq!(temporal_score(&a, &b, 24.0), Some(1.0));
    }

    #[test]
    fn decay_is_linear() {
        let now = Utc::now();
        let a = EntityRef::new("a", EntityType::Person).with_timestamp(now);
        let b = EntityRef::new("b", EntityType::Person)
            .with_timestamp(now - Duration::hours(12));
        let score = temporal_score(&a, &b, 24.0).unwrap();
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn beyond_window_is_none() {
        let now = Utc::now();
        let a = EntityRef::new("a", EntityType::Person).with_timestamp(now);
        let b = EntityRef::new("b", EntityType::Person)
            .with_timestamp(now - Duration::hours(25));
        assert_eq!(temporal_score(&a, &b, 24.0), None);
    }
}
