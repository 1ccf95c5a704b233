//! Condition evaluation against a signal's attribute context.

use serde_json::Value;

use sentra_core::models::{ConditionOp, RuleCondition, Signal};
use sentra_core::value::resolve_path;

/// Build the evaluation context for one signal: envelope fields plus the
/// attribute and metadata trees. Rule fields address it with dot paths,
/// e.g. `"confidence"`, `"attributes.weapon.type"`.
pub fn signal_context(signal: &Signal) -> Value {
    serde_json::json!({
        "source": signal.source.as_str(),
        "category": signal.category.as_str(),
        "confidence": signal.confidence,
        "jurisdiction": signal.jurisdiction,
        "attributes": signal.attributes,
        "metadata": signal.metadata,
    })
}

/// Evaluate one condition. A missing field (or missing intermediate on the
/// path) is a non-match for every operator except `NotExists`.
pub fn evaluate(context: &Value, condition: &RuleCondition) -> bool {
    let resolved = resolve_path(context, &condition.field);

    match condition.operator {
        ConditionOp::Exists => return resolved.is_some(),
        ConditionOp::NotExists => return resolved.is_none(),
        _ => {}
    }

    let Some(actual) = resolved else {
        return false;
    };
    let expected = &condition.value;

    match condition.operator {
        ConditionOp::Equals => values_equal(actual, expected),
        ConditionOp::NotEquals => !values_equal(actual, expected),
        ConditionOp::GreaterThan => numeric_cmp(actual, expected, |a, b| a > b),
        ConditionOp::GreaterOrEqual => numeric_cmp(actual, expected, |a, b| a >= b),
        ConditionOp::LessThan => numeric_cmp(actual, expected, |a, b| a < b),
        ConditionOp::LessOrEqual => numeric_cmp(actual, expected, |a, b| a <= b),
        ConditionOp::Contains => contains(actual, expected),
        ConditionOp::NotContains => !contains(actual, expected),
        ConditionOp::In => in_list(actual, expected),
        ConditionOp::NotIn => !in_list(actual, expected),
        ConditionOp::Exists | ConditionOp::NotExists => unreachable!(),
    }
}

/// Equality with numeric coercion: `1` and `1.0` compare equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(na), Some(nb)) => na == nb,
        _ => a == b,
    }
}

fn numeric_cmp(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// String containment for strings, membership for arrays.
fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(s) => expected.as_str().is_some_and(|needle| s.contains(needle)),
        Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
        _ => false,
    }
}

/// The rule value is the list; the field value must appear in it.
fn in_list(actual: &Value, expected: &Value) -> bool {
    expected
        .as_array()
        .is_some_and(|list| list.iter().any(|item| values_equal(item, actual)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentra_core::models::{SignalCategory, SignalSource};
    use serde_json::json;

    fn context() -> Value {
        let signal = Signal::new(SignalSource::Anpr, SignalCategory::Sighting, 0.85)
            .with_attributes(json!({
                "vehicle": {"plate": "AB12 CDE", "stolen": true},
                "prior_incidents": 4,
                "tags": ["pursuit", "night"],
            }));
        signal_context(&signal)
    }

    fn check(field: &str, op: ConditionOp, value: Value) -> bool {
        evaluate(&context(), &RuleCondition::new(field, op, value))
    }

    #[test]
    fn equals_with_numeric_coercion() {
        assert!(check("attributes.prior_incidents", ConditionOp::Equals, json!(4.0)));
        assert!(check("confidence", ConditionOp::Equals, json!(0.85)));
    }

    #[test]
    fn missing_intermediate_is_non_match() {
        assert!(!check("attributes.person.name", ConditionOp::Equals, json!("Ada")));
        assert!(!check("attributes.person.name", ConditionOp::NotEquals, json!("Ada")));
        assert!(check("attributes.person.name", ConditionOp::NotExists, json!(null)));
    }

    #[test]
    fn comparisons_are_numeric_only() {
        assert!(check("attributes.prior_incidents", ConditionOp::GreaterThan, json!(3)));
        assert!(!check("attributes.vehicle.plate", ConditionOp::GreaterThan, json!(3)));
    }

    #[test]
    fn contains_works_on_strings_and_arrays() {
        assert!(check("attributes.vehicle.plate", ConditionOp::Contains, json!("12 C")));
        assert!(check("attributes.tags", ConditionOp::Contains, json!("pursuit")));
        assert!(check("attributes.tags", ConditionOp::NotContains, json!("daylight")));
    }

    #[test]
    fn in_expects_the_rule_value_to_be_a_list() {
        assert!(check("source", ConditionOp::In, json!(["anpr", "osint"])));
        assert!(check("source", ConditionOp::NotIn, json!(["tip_line"])));
        assert!(!check("source", ConditionOp::In, json!("anpr")));
    }

    #[test]
    fn exists_ignores_the_rule_value() {
        assert!(check("attributes.vehicle.stolen", ConditionOp::Exists, json!(null)));
        assert!(!check("attributes.weapon", ConditionOp::Exists, json!(null)));
    }
}
