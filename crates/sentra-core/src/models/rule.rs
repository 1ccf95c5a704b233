//! Declarative scoring rules evaluated by the rules engine.

use serde::{Deserialize, Serialize};

use super::signal::SignalCategory;

/// Condition operators. Comparisons are numeric; `Contains` works on strings
/// and arrays; `In`/`NotIn` expect the rule value to be an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Contains,
    NotContains,
    In,
    NotIn,
    Exists,
    NotExists,
}

/// One AND-term of a rule: a dot-path field, an operator, and a comparison
/// value. A missing intermediate on the path means non-match, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub operator: ConditionOp,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RuleCondition {
    pub fn new(field: impl Into<String>, operator: ConditionOp, value: serde_json::Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// A scoring rule. Conditions are AND-only; express OR as separate rules.
///
/// Contribution: the flat `score_modifier`, or, when `score_multiplier`
/// differs from 1.0, `running_total * (score_multiplier - 1.0)`. Each
/// rule's contribution is clamped to `[min_contribution, max_contribution]`
/// before being summed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRule {
    pub id: String,
    pub category: Option<SignalCategory>,
    pub enabled: bool,
    /// Evaluation order: rules run in descending priority.
    pub priority: i32,
    pub conditions: Vec<RuleCondition>,
    pub score_modifier: f64,
    pub score_multiplier: f64,
    pub min_contribution: f64,
    pub max_contribution: f64,
}

impl ScoringRule {
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            category: None,
            enabled: true,
            priority,
            conditions: Vec::new(),
            score_modifier: 0.0,
            score_multiplier: 1.0,
            min_contribution: -100.0,
            max_contribution: 100.0,
        }
    }

    pub fn with_condition(
        mut self,
        field: impl Into<String>,
        operator: ConditionOp,
        value: serde_json::Value,
    ) -> Self {
        self.conditions.push(RuleCondition::new(field, operator, value));
        self
    }

    pub fn with_modifier(mut self, modifier: f64) -> Self {
        self.score_modifier = modifier;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.score_multiplier = multiplier;
        self
    }

    pub fn with_contribution_clamp(mut self, min: f64, max: f64) -> Self {
        self.min_contribution = min;
        self.max_contribution = max;
        self
    }

    pub fn with_category(mut self, category: SignalCategory) -> Self {
        self.category = Some(category);
        self
    }
}
