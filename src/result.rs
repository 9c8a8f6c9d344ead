// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit result types.
//!
//! An [`AuditResult`] is the outcome of one axe-core invocation: the ordered
//! list of violations the engine reported, after option filtering. Results
//! are built once by the runner and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Impact level of a violation, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl Impact {
    /// All levels, most severe first
    pub const DESCENDING: [Impact; 4] =
        [Impact::Critical, Impact::Serious, Impact::Moderate, Impact::Minor];
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impact::Minor => write!(f, "minor"),
            Impact::Moderate => write!(f, "moderate"),
            Impact::Serious => write!(f, "serious"),
            Impact::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Impact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minor" => Ok(Impact::Minor),
            "moderate" => Ok(Impact::Moderate),
            "serious" => Ok(Impact::Serious),
            "critical" => Ok(Impact::Critical),
            other => Err(format!("Unknown impact level: {}", other)),
        }
    }
}

/// One element affected by a violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResult {
    /// Selector path to the element; more than one entry crosses iframe
    /// or shadow DOM boundaries
    pub target: Vec<String>,
    /// Outer HTML snippet of the element
    pub html: String,
    /// Engine-provided explanation of what to fix
    pub failure_summary: Option<String>,
    /// Node-level impact, if the engine reported one
    pub impact: Option<Impact>,
}

impl NodeResult {
    pub fn new(target: Vec<String>, html: &str) -> Self {
        Self {
            target,
            html: html.to_string(),
            failure_summary: None,
            impact: None,
        }
    }

    pub fn with_failure_summary(mut self, summary: &str) -> Self {
        self.failure_summary = Some(summary.to_string());
        self
    }

    /// Selector path joined for display
    pub fn selector(&self) -> String {
        self.target.join(" >>> ")
    }
}

/// A single accessibility rule failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule identifier (e.g., "color-contrast")
    pub id: String,
    /// Human-readable description of the rule
    pub description: String,
    /// Short help text
    pub help: String,
    /// Link to the rule documentation
    pub help_url: Option<String>,
    /// Rule-set tags the rule belongs to (e.g., "wcag2aa")
    pub tags: Vec<String>,
    pub impact: Impact,
    /// Affected elements in document order
    pub nodes: Vec<NodeResult>,
}

impl Violation {
    pub fn new(id: &str, impact: Impact, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            help: String::new(),
            help_url: None,
            tags: Vec::new(),
            impact,
            nodes: Vec::new(),
        }
    }

    pub fn with_help(mut self, help: &str, url: &str) -> Self {
        self.help = help.to_string();
        self.help_url = Some(url.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_node(mut self, node: NodeResult) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Violations produced by one audit invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditResult {
    /// Page URL as reported by the engine
    pub url: Option<String>,
    /// axe-core version that produced the result
    pub engine_version: Option<String>,
    /// When the engine finished the run
    pub timestamp: Option<DateTime<Utc>>,
    /// Violations in engine order
    pub violations: Vec<Violation>,
}

// Two results are equal when they report the same violations; run metadata
// does not participate.
impl PartialEq for AuditResult {
    fn eq(&self, other: &Self) -> bool {
        self.violations == other.violations
    }
}

impl AuditResult {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self {
            violations,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations with exactly this impact
    pub fn by_impact(&self, impact: Impact) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.impact == impact).collect()
    }

    /// Rule ids in engine order
    pub fn rule_ids(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.id.as_str()).collect()
    }

    /// Total number of affected nodes across all violations
    pub fn node_count(&self) -> usize {
        self.violations.iter().map(|v| v.nodes.len()).sum()
    }

    /// Highest impact present, if any
    pub fn worst_impact(&self) -> Option<Impact> {
        self.violations.iter().map(|v| v.impact).max()
    }

    /// Whether any violation is at or above `threshold`
    pub fn fails_at(&self, threshold: Impact) -> bool {
        self.worst_impact().is_some_and(|worst| worst >= threshold)
    }
}
