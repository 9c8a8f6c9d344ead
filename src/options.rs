// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit options: which rules run and which impacts are reported.
//!
//! `run_only` is forwarded to axe-core as its `runOnly` option and also
//! enforced on the returned violations. `included_impacts` is applied to the
//! results only; axe-core has no equivalent option.

use crate::result::{Impact, Violation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How `run_only` values are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Rule-set tags such as `wcag2aa` or `best-practice`
    Tag,
    /// Individual rule ids such as `color-contrast`
    Rule,
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterKind::Tag => write!(f, "tag"),
            FilterKind::Rule => write!(f, "rule"),
        }
    }
}

/// Restricts the audit to a set of tags or rule ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOnly {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    pub values: BTreeSet<String>,
}

impl RunOnly {
    /// Whether a reported violation falls inside this filter
    pub fn admits(&self, violation: &Violation) -> bool {
        match self.kind {
            FilterKind::Tag => violation.tags.iter().any(|t| self.values.contains(t)),
            FilterKind::Rule => self.values.contains(&violation.id),
        }
    }
}

/// Options for one audit; `AuditOptions::default()` runs every applicable
/// rule with no impact filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOptions {
    #[serde(default)]
    pub run_only: Option<RunOnly>,
    #[serde(default)]
    pub included_impacts: Option<BTreeSet<Impact>>,
    /// Rule ids switched off for this audit
    #[serde(default)]
    pub disabled_rules: BTreeSet<String>,
}

impl AuditOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run only rules tagged with any of `tags`
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_only = Some(RunOnly {
            kind: FilterKind::Tag,
            values: tags.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Run only the listed rules
    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_only = Some(RunOnly {
            kind: FilterKind::Rule,
            values: rules.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Report only violations with one of these impacts
    pub fn with_included_impacts(mut self, impacts: impl IntoIterator<Item = Impact>) -> Self {
        self.included_impacts = Some(impacts.into_iter().collect());
        self
    }

    pub fn disable_rule(mut self, rule: impl Into<String>) -> Self {
        self.disabled_rules.insert(rule.into());
        self
    }

    /// The axe-core `options` argument
    pub fn engine_options(&self) -> serde_json::Value {
        let mut options = serde_json::Map::new();
        options.insert("resultTypes".into(), serde_json::json!(["violations"]));

        if let Some(ref run_only) = self.run_only {
            options.insert(
                "runOnly".into(),
                serde_json::json!({
                    "type": run_only.kind.to_string(),
                    "values": run_only.values,
                }),
            );
        }

        if !self.disabled_rules.is_empty() {
            let rules: serde_json::Map<String, serde_json::Value> = self
                .disabled_rules
                .iter()
                .map(|id| (id.clone(), serde_json::json!({ "enabled": false })))
                .collect();
            options.insert("rules".into(), serde_json::Value::Object(rules));
        }

        serde_json::Value::Object(options)
    }

    /// Whether a violation should be reported under these options
    pub fn admits(&self, violation: &Violation) -> bool {
        if let Some(ref run_only) = self.run_only {
            if !run_only.admits(violation) {
                return false;
            }
        }
        if let Some(ref impacts) = self.included_impacts {
            if !impacts.contains(&violation.impact) {
                return false;
            }
        }
        !self.disabled_rules.contains(&violation.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = AuditOptions::default().engine_options();
        assert_eq!(opts["resultTypes"][0], "violations");
        assert!(opts.get("runOnly").is_none());
        assert!(opts.get("rules").is_none());
    }

    #[test]
    fn test_tag_run_only() {
        let opts = AuditOptions::new().with_tags(["wcag22aa"]).engine_options();
        assert_eq!(opts["runOnly"]["type"], "tag");
        assert_eq!(opts["runOnly"]["values"][0], "wcag22aa");
    }

    #[test]
    fn test_disabled_rules() {
        let opts = AuditOptions::new().disable_rule("region").engine_options();
        assert_eq!(opts["rules"]["region"]["enabled"], false);
    }

    #[test]
    fn test_admits_by_impact_and_tag() {
        let v = Violation::new("color-contrast", Impact::Serious, "contrast")
            .with_tags(&["wcag2aa", "wcag143"]);

        assert!(AuditOptions::default().admits(&v));
        assert!(AuditOptions::new().with_tags(["wcag2aa"]).admits(&v));
        assert!(!AuditOptions::new().with_tags(["wcag2aaa"]).admits(&v));
        assert!(AuditOptions::new().with_rules(["color-contrast"]).admits(&v));
        assert!(!AuditOptions::new()
            .with_included_impacts([Impact::Critical])
            .admits(&v));
        assert!(!AuditOptions::new().disable_rule("color-contrast").admits(&v));
    }

    #[test]
    fn test_deserialize_from_toml_shape() {
        let json = serde_json::json!({
            "run_only": { "type": "tag", "values": ["wcag2aaa"] },
            "included_impacts": ["moderate"]
        });
        let opts: AuditOptions = serde_json::from_value(json).unwrap();
        assert_eq!(opts.run_only.unwrap().kind, FilterKind::Tag);
        assert!(opts.included_impacts.unwrap().contains(&Impact::Moderate));
    }
}
