//! Exact field-overlap matching on per-type allowlisted keys.

use sentra_core::models::{EntityRef, EntityType};

/// Identifying fields considered for exact comparison, per entity type.
fn match_fields(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Person => &["name", "dob", "national_id", "phone"],
        EntityType::Vehicle => &["plate", "vin", "make", "model", "colour"],
        EntityType::Weapon => &["serial_number", "weapon_type", "calibre"],
        EntityType::Location => &["address", "postcode", "city"],
    }
}

/// Score = matching fields / fields present in both entities.
///
/// Returns `None` when the pair shares no allowlisted field.
pub fn exact_score(a: &EntityRef, b: &EntityRef) -> Option<f64> {
    if a.entity_type != b.entity_type {
        return None;
    }
    let mut present = 0usize;
    let mut matching = 0usize;
    for field in match_fields(a.entity_type) {
        let (Some(va), Some(vb)) = (a.attributes.get(*field), b.attributes.get(*field)) else {
            continue;
        };
        present += 1;
        if va == vb {
            matching += 1;
        }
    }
    if present == 0 {
        return None;
    }
    Some(matching as f64 / present as f64)
}
