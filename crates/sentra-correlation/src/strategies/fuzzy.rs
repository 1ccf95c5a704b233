//! Character-set Jaccard similarity on each type's primary string field.
//!
//! Intentionally crude: the set of characters, not edit distance. Catches
//! transpositions and partial plate reads; does not rank near-misses.

use std::collections::HashSet;

use sentra_core::models::{EntityRef, EntityType};

/// The primary string field compared per entity type.
fn primary_field(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Person => "name",
        EntityType::Vehicle => "plate",
        EntityType::Weapon => "serial_number",
        EntityType::Location => "address",
    }
}

/// Jaccard similarity of the two values' character sets, lowercased and
/// whitespace-stripped. `None` when either side lacks the primary field.
pub fn fuzzy_score(a: &EntityRef, b: &EntityRef) -> Option<f64> {
    if a.entity_type != b.entity_type {
        return None;
    }
    let field = primary_field(a.entity_type);
    let va = a.attr_str(field)?;
    let vb = b.attr_str(field)?;
    Some(char_set_jaccard(va, vb))
}

fn char_set(value: &str) -> HashSet<char> {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn char_set_jaccard(a: &str, b: &str) -> f64 {
    let sa = char_set(a);
    let sb = char_set(b);
    if sa.is_empty() && sb.is_empty() {
        return 0.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    intersection as f64 / union as f64
}
