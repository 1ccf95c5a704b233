//! Derived advisory bulletins.
//!
//! A configured subset of destinations receives a templated advisory
//! document alongside the raw alert, and only when the alert's categories
//! touch persons or vehicles.

use sentra_core::models::RoutedAlert;

const ADVISORY_CATEGORIES: &[&str] = &["person", "vehicle"];

/// Whether this alert's categories qualify for an advisory.
pub fn qualifies(categories: &[String]) -> bool {
    categories
        .iter()
        .any(|c| ADVISORY_CATEGORIES.contains(&c.as_str()))
}

/// Pure templating over the routed alert's payload fields.
pub fn build_advisory(alert: &RoutedAlert) -> String {
    let entities = alert
        .payload
        .get("entities")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    format!(
        "ADVISORY [{}] priority {:.0}: categories [{}]; entities [{}]; alert {}",
        alert.tier.as_str().to_uppercase(),
        alert.priority,
        alert.categories.join(", "),
        entities,
        alert.alert_id,
    )
}
