//! Raw event signals as produced by upstream collectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Known signal producers. `OfficerSafety` is the designated high-trust
/// source: alerts fused from it are always tier T1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    OfficerSafety,
    Dispatch,
    Anpr,
    Osint,
    TipLine,
    Forensics,
    FieldReport,
    Partner,
}

impl SignalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::OfficerSafety => "officer_safety",
            SignalSource::Dispatch => "dispatch",
            SignalSource::Anpr => "anpr",
            SignalSource::Osint => "osint",
            SignalSource::TipLine => "tip_line",
            SignalSource::Forensics => "forensics",
            SignalSource::FieldReport => "field_report",
            SignalSource::Partner => "partner",
        }
    }
}

/// Broad classification of what a signal reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    Threat,
    Incident,
    Sighting,
    Tip,
    MissingPerson,
    StolenVehicle,
    WeaponOffence,
    Disorder,
}

impl SignalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::Threat => "threat",
            SignalCategory::Incident => "incident",
            SignalCategory::Sighting => "sighting",
            SignalCategory::Tip => "tip",
            SignalCategory::MissingPerson => "missing_person",
            SignalCategory::StolenVehicle => "stolen_vehicle",
            SignalCategory::WeaponOffence => "weapon_offence",
            SignalCategory::Disorder => "disorder",
        }
    }
}

/// A single raw event from a producer, not yet fused.
///
/// Consumed exactly once by the orchestrator and discarded after the fusion
/// decision. `attributes` and `metadata` are JSON object trees; nested fields
/// are addressed with dot paths (see [`crate::value::resolve_path`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub source: SignalSource,
    pub category: SignalCategory,
    pub timestamp: DateTime<Utc>,
    pub jurisdiction: Option<String>,
    /// Producer-reported confidence in [0, 1]. Adjusted by the static
    /// source-reliability multiplier during enrichment.
    pub confidence: f64,
    pub attributes: serde_json::Value,
    pub metadata: serde_json::Value,
}

impl Signal {
    pub fn new(source: SignalSource, category: SignalCategory, confidence: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            category,
            timestamp: Utc::now(),
            jurisdiction: None,
            confidence: confidence.clamp(0.0, 1.0),
            attributes: serde_json::json!({}),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The entity id this signal is primarily about, when the producer
    /// supplied one as a top-level `entity_id` attribute.
    pub fn entity_id(&self) -> Option<&str> {
        self.attributes.get("entity_id").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped_on_construction() {
        let s = Signal::new(SignalSource::Osint, SignalCategory::Tip, 1.7);
        assert_eq!(s.confidence, 1.0);
        let s = Signal::new(SignalSource::Osint, SignalCategory::Tip, -0.2);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn source_round_trips_through_serde() {
        let json = serde_json::to_string(&SignalSource::OfficerSafety).unwrap();
        assert_eq!(json, "\"officer_safety\"");
        let back: SignalSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SignalSource::OfficerSafety);
    }
}
