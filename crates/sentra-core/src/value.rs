//! Dot-path resolution over attribute trees.
//!
//! Attribute and metadata payloads are `serde_json::Value` object trees;
//! rules and extractors address nested fields with dot paths
//! (`"vehicle.plate"`). A missing intermediate resolves to `None`.

use serde_json::Value;

/// Walk `root` along a dot-separated path of object keys.
///
/// Only object maps are traversed; indexing into arrays or scalars yields
/// `None`. An empty path returns the root.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Numeric view of a value: integers and floats coerce to f64.
pub fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Stamp a key into a JSON object, creating the object if the value was not
/// one (producers occasionally send null metadata).
pub fn stamp(target: &mut Value, key: &str, value: Value) {
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Some(map) = target.as_object_mut() {
        map.insert(key.to_string(), value);
    }
}
