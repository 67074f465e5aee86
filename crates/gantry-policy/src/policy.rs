//! The per-group scaling policy model.
//!
//! Policies arrive as JSON documents. Decoding is strict: an unknown
//! provider, comparison operator, or check action is a hard error at
//! decode time, so invalid configuration never reaches the engine.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};

/// Default minimum group count merged in when `min_count` is zero.
pub const DEFAULT_MIN_COUNT: u64 = 2;

/// Default maximum group count merged in when `max_count` is zero.
pub const DEFAULT_MAX_COUNT: u64 = 10;

/// Default cooldown merged in when `cooldown_seconds` is zero.
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 180;

/// Default scale-in/scale-out step merged in when the step is zero.
pub const DEFAULT_SCALE_STEP: u64 = 1;

/// The direction of a scaling change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleDirection {
    #[default]
    None,
    In,
    Out,
}

impl fmt::Display for ScaleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleDirection::None => f.write_str("none"),
            ScaleDirection::In => f.write_str("in"),
            ScaleDirection::Out => f.write_str("out"),
        }
    }
}

/// Scaling policy for a single job group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GroupScalingPolicy {
    pub enabled: bool,

    /// Minimum elapsed seconds between successive scaling actions on
    /// this group.
    pub cooldown_seconds: u64,

    pub min_count: u64,
    pub max_count: u64,

    /// Step applied per scale-out trigger.
    pub scale_out_count: u64,
    /// Step applied per scale-in trigger.
    pub scale_in_count: u64,

    /// Percentage thresholds against orchestrator-reported utilization.
    /// `None` disables the check.
    pub scale_out_cpu_percentage: Option<f64>,
    pub scale_out_memory_percentage: Option<f64>,
    pub scale_in_cpu_percentage: Option<f64>,
    pub scale_in_memory_percentage: Option<f64>,

    /// Named checks against external metric providers.
    pub external_checks: HashMap<String, ExternalCheck>,
}

impl GroupScalingPolicy {
    /// Decode a policy from JSON, validate it, and merge defaults.
    ///
    /// This is the single entry point for policies arriving from storage
    /// or an API surface.
    pub fn from_json(raw: &[u8]) -> PolicyResult<Self> {
        let mut policy: GroupScalingPolicy = serde_json::from_slice(raw)?;
        policy.validate()?;
        policy.merge_defaults();
        Ok(policy)
    }

    /// Validate the policy without touching its values.
    ///
    /// A policy where every gating field is still at its zero value is
    /// rejected as empty. Enabled external checks must carry a query.
    pub fn validate(&self) -> PolicyResult<()> {
        if self.is_empty() {
            return Err(PolicyError::Empty);
        }
        for (name, check) in &self.external_checks {
            check.validate(name)?;
        }
        Ok(())
    }

    /// Backfill zero-valued fields with the documented defaults.
    pub fn merge_defaults(&mut self) {
        if self.min_count == 0 {
            self.min_count = DEFAULT_MIN_COUNT;
        }
        if self.max_count == 0 {
            self.max_count = DEFAULT_MAX_COUNT;
        }
        if self.cooldown_seconds == 0 {
            self.cooldown_seconds = DEFAULT_COOLDOWN_SECONDS;
        }
        if self.scale_out_count == 0 {
            self.scale_out_count = DEFAULT_SCALE_STEP;
        }
        if self.scale_in_count == 0 {
            self.scale_in_count = DEFAULT_SCALE_STEP;
        }
    }

    /// Step size for the given direction.
    pub fn step_for(&self, direction: ScaleDirection) -> u64 {
        match direction {
            ScaleDirection::Out => self.scale_out_count,
            ScaleDirection::In => self.scale_in_count,
            ScaleDirection::None => 0,
        }
    }

    /// True when no gating field has been set.
    ///
    /// The optional thresholds deliberately do not count: a policy that
    /// only names thresholds but enables nothing is still empty.
    fn is_empty(&self) -> bool {
        !self.enabled
            && self.cooldown_seconds == 0
            && self.min_count == 0
            && self.max_count == 0
            && self.scale_out_count == 0
            && self.scale_in_count == 0
    }
}

/// A single check against an external metric provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExternalCheck {
    pub enabled: bool,
    pub provider: ProviderKind,
    pub query: String,
    pub comparison_operator: ComparisonOperator,
    pub comparison_value: f64,
    pub action: CheckAction,
}

impl Default for ExternalCheck {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: ProviderKind::Prometheus,
            query: String::new(),
            comparison_operator: ComparisonOperator::GreaterThan,
            comparison_value: 0.0,
            action: CheckAction::ScaleOut,
        }
    }
}

impl ExternalCheck {
    /// Validate an individual check. `name` is the check's key in the
    /// policy, used only for error context.
    pub fn validate(&self, name: &str) -> PolicyResult<()> {
        if self.enabled && self.query.trim().is_empty() {
            return Err(PolicyError::EmptyQuery(name.to_string()));
        }
        Ok(())
    }
}

/// Supported external metric backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Prometheus,
    Influxdb,
}

impl ProviderKind {
    /// Registry key for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Prometheus => "prometheus",
            ProviderKind::Influxdb => "influxdb",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an external check compares the observed value to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
}

impl ComparisonOperator {
    /// Apply the comparison: does `value` breach `threshold`?
    pub fn breaches(&self, value: f64, threshold: f64) -> bool {
        match self {
            ComparisonOperator::GreaterThan => value > threshold,
            ComparisonOperator::LessThan => value < threshold,
        }
    }
}

/// The scaling action an external check requests when it breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckAction {
    ScaleIn,
    ScaleOut,
}

impl CheckAction {
    /// The direction this action maps to.
    pub fn direction(&self) -> ScaleDirection {
        match self {
            CheckAction::ScaleIn => ScaleDirection::In,
            CheckAction::ScaleOut => ScaleDirection::Out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_policy_rejected() {
        let policy = GroupScalingPolicy::default();
        assert!(matches!(policy.validate(), Err(PolicyError::Empty)));
    }

    #[test]
    fn enabled_alone_is_not_empty() {
        let policy = GroupScalingPolicy {
            enabled: true,
            ..Default::default()
        };
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn thresholds_alone_still_empty() {
        let policy = GroupScalingPolicy {
            scale_out_cpu_percentage: Some(80.0),
            scale_in_memory_percentage: Some(20.0),
            ..Default::default()
        };
        assert!(matches!(policy.validate(), Err(PolicyError::Empty)));
    }

    #[test]
    fn defaults_merged_into_zero_fields() {
        let mut policy = GroupScalingPolicy {
            enabled: true,
            max_count: 100,
            ..Default::default()
        };
        policy.merge_defaults();

        assert_eq!(policy.min_count, DEFAULT_MIN_COUNT);
        assert_eq!(policy.max_count, 100);
        assert_eq!(policy.cooldown_seconds, DEFAULT_COOLDOWN_SECONDS);
        assert_eq!(policy.scale_out_count, DEFAULT_SCALE_STEP);
        assert_eq!(policy.scale_in_count, DEFAULT_SCALE_STEP);
    }

    #[test]
    fn from_json_decodes_and_merges() {
        let raw = br#"{
            "enabled": true,
            "max-count": 20,
            "scale-out-cpu-percentage": 75.0
        }"#;
        let policy = GroupScalingPolicy::from_json(raw).unwrap();

        assert!(policy.enabled);
        assert_eq!(policy.max_count, 20);
        assert_eq!(policy.min_count, DEFAULT_MIN_COUNT);
        assert_eq!(policy.scale_out_cpu_percentage, Some(75.0));
        assert_eq!(policy.scale_in_cpu_percentage, None);
    }

    #[test]
    fn from_json_rejects_empty() {
        let raw = br#"{"scale-out-cpu-percentage": 75.0}"#;
        assert!(matches!(
            GroupScalingPolicy::from_json(raw),
            Err(PolicyError::Empty)
        ));
    }

    #[test]
    fn unknown_provider_is_a_decode_error() {
        let raw = br#"{
            "enabled": true,
            "external-checks": {
                "queue-depth": {
                    "enabled": true,
                    "provider": "graphite",
                    "query": "q",
                    "comparison-operator": "greater-than",
                    "comparison-value": 100.0,
                    "action": "scale-out"
                }
            }
        }"#;
        assert!(matches!(
            GroupScalingPolicy::from_json(raw),
            Err(PolicyError::Decode(_))
        ));
    }

    #[test]
    fn unknown_operator_is_a_decode_error() {
        let raw = br#"{
            "enabled": true,
            "external-checks": {
                "queue-depth": {
                    "enabled": true,
                    "provider": "prometheus",
                    "query": "q",
                    "comparison-operator": "equals",
                    "comparison-value": 100.0,
                    "action": "scale-out"
                }
            }
        }"#;
        assert!(matches!(
            GroupScalingPolicy::from_json(raw),
            Err(PolicyError::Decode(_))
        ));
    }

    #[test]
    fn enabled_check_requires_query() {
        let mut policy = GroupScalingPolicy {
            enabled: true,
            ..Default::default()
        };
        policy.external_checks.insert(
            "queue-depth".to_string(),
            ExternalCheck {
                enabled: true,
                ..Default::default()
            },
        );
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::EmptyQuery(name)) if name == "queue-depth"
        ));
    }

    #[test]
    fn disabled_check_may_omit_query() {
        let mut policy = GroupScalingPolicy {
            enabled: true,
            ..Default::default()
        };
        policy
            .external_checks
            .insert("later".to_string(), ExternalCheck::default());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn comparison_operators() {
        assert!(ComparisonOperator::GreaterThan.breaches(80.0, 75.0));
        assert!(!ComparisonOperator::GreaterThan.breaches(75.0, 75.0));
        assert!(ComparisonOperator::LessThan.breaches(20.0, 30.0));
        assert!(!ComparisonOperator::LessThan.breaches(30.0, 30.0));
    }

    #[test]
    fn check_action_directions() {
        assert_eq!(CheckAction::ScaleIn.direction(), ScaleDirection::In);
        assert_eq!(CheckAction::ScaleOut.direction(), ScaleDirection::Out);
    }

    #[test]
    fn step_for_direction() {
        let policy = GroupScalingPolicy {
            enabled: true,
            scale_out_count: 3,
            scale_in_count: 2,
            ..Default::default()
        };
        assert_eq!(policy.step_for(ScaleDirection::Out), 3);
        assert_eq!(policy.step_for(ScaleDirection::In), 2);
        assert_eq!(policy.step_for(ScaleDirection::None), 0);
    }
}
