//! The stock rule set loaded by `RulesEngine::with_default_rules`.

use serde_json::json;

use sentra_core::models::{ConditionOp, ScoringRule};

pub fn default_rules() -> Vec<ScoringRule> {
    vec![
        // Any weapon reference outranks everything else.
        ScoringRule::new("weapon_present", 100)
            .with_condition("attributes.weapon", ConditionOp::Exists, json!(null))
            .with_modifier(25.0)
            .with_contribution_clamp(0.0, 25.0),
        ScoringRule::new("threat_category", 90)
            .with_condition("category", ConditionOp::Equals, json!("threat"))
            .with_modifier(20.0)
            .with_contribution_clamp(0.0, 20.0),
        ScoringRule::new("high_confidence", 80)
            .with_condition("confidence", ConditionOp::GreaterOrEqual, json!(0.9))
            .with_modifier(10.0)
            .with_contribution_clamp(0.0, 10.0),
        // Repeat involvement scales the running total rather than adding a
        // flat amount.
        ScoringRule::new("repeat_entity", 70)
            .with_condition(
                "attributes.prior_incidents",
                ConditionOp::GreaterOrEqual,
                json!(3),
            )
            .with_multiplier(1.2)
            .with_contribution_clamp(0.0, 30.0),
        ScoringRule::new("stolen_vehicle_flag", 60)
            .with_condition("attributes.vehicle.stolen", ConditionOp::Equals, json!(true))
            .with_modifier(15.0)
            .with_contribution_clamp(0.0, 15.0),
        ScoringRule::new("unverified_tip", 10)
            .with_condition("source", ConditionOp::Equals, json!("tip_line"))
            .with_condition("confidence", ConditionOp::LessThan, json!(0.5))
            .with_modifier(-10.0)
            .with_contribution_clamp(-10.0, 0.0),
    ]
}
