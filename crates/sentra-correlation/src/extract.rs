//! Entity candidate extraction from signal attributes.
//!
//! A shallow, single-level scan of well-known top-level keys. Nested or
//! unconventional payloads are the normalizers' problem, not ours.

use sentra_core::models::{EntityRef, EntityType, Signal};
use serde_json::Value;

const PERSON_KEYS: &[&str] = &["person", "suspect", "offender"];
const VEHICLE_KEY: &str = "vehicle";
const WEAPON_KEY: &str = "weapon";
const LOCATION_KEY: &str = "location";

/// Extract up to four entity candidates: person, vehicle, weapon, location.
///
/// A location also forms from bare top-level `latitude` + `longitude`
/// attributes when no `location` object is present.
pub fn extract_candidates(signal: &Signal) -> Vec<EntityRef> {
    let Some(attrs) = signal.attributes.as_object() else {
        return Vec::new();
    };
    let mut candidates = Vec::new();

    for key in PERSON_KEYS {
        if let Some(obj) = attrs.get(*key).filter(|v| v.is_object()) {
            candidates.push(build_entity(signal, obj, EntityType::Person, "name"));
            break;
        }
    }
    if let Some(obj) = attrs.get(VEHICLE_KEY).filter(|v| v.is_object()) {
        candidates.push(build_entity(signal, obj, EntityType::Vehicle, "plate"));
    }
    if let Some(obj) = attrs.get(WEAPON_KEY).filter(|v| v.is_object()) {
        candidates.push(build_entity(signal, obj, EntityType::Weapon, "serial_number"));
    }
    if let Some(obj) = attrs.get(LOCATION_KEY).filter(|v| v.is_object()) {
        candidates.push(build_entity(signal, obj, EntityType::Location, "address"));
    } else if let (Some(lat), Some(lon)) = (
        attrs.get("latitude").and_then(Value::as_f64),
        attrs.get("longitude").and_then(Value::as_f64),
    ) {
        let entity = EntityRef::new(format!("location:{lat:.5},{lon:.5}"), EntityType::Location)
            .with_position(lat, lon)
            .with_timestamp(signal.timestamp);
        candidates.push(entity);
    }

    candidates
}

fn build_entity(
    signal: &Signal,
    attrs: &Value,
    entity_type: EntityType,
    primary_field: &str,
) -> EntityRef {
    let id = attrs
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            attrs
                .get(primary_field)
                .and_then(Value::as_str)
                .map(|v| format!("{}:{}", entity_type.as_str(), v.to_lowercase()))
        })
        .unwrap_or_else(|| format!("{}:{}", entity_type.as_str(), uuid::Uuid::new_v4()));

    let mut entity = EntityRef::new(id, entity_type)
        .with_attributes(attrs.clone())
        .with_timestamp(signal.timestamp);

    if let (Some(lat), Some(lon)) = (
        attrs.get("latitude").and_then(Value::as_f64),
        attrs.get("longitude").and_then(Value::as_f64),
    ) {
        entity = entity.with_position(lat, lon);
    }
    entity
}
