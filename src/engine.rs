// SPDX-License-Identifier: PMPL-1.0-or-later
//! axe-core engine boundary.
//!
//! Loading obtains the axe-core source from disk or over HTTP; injection
//! evaluates it inside a page. Both are explicit steps the caller performs
//! once per page load, before any audit runs. The rule engine itself is
//! opaque: we hand it a context and options and decode what comes back.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{AuditError, Result};
use crate::options::AuditOptions;
use crate::page::Page;
use crate::result::{AuditResult, Impact, NodeResult, Violation};
use crate::target::AuditTarget;

/// Evaluates to `true` when axe-core is available in the page
pub const PROBE_SCRIPT: &str =
    "typeof window.axe === 'object' && typeof window.axe.run === 'function'";

/// Every analyze script starts with this call
pub const RUN_CALL: &str = "axe.run(";

/// axe-core source ready for injection
#[derive(Debug, Clone)]
pub struct AxeEngine {
    source: Arc<str>,
    origin: String,
}

impl AxeEngine {
    /// Use an in-memory axe-core source
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Arc::from(source.into()),
            origin: "<inline>".to_string(),
        }
    }

    /// Load the source named by the engine configuration.
    ///
    /// A local `source` path wins over `url`.
    pub async fn load(config: &EngineConfig) -> Result<Self> {
        let (source, origin) = if let Some(ref path) = config.source {
            let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                AuditError::EngineUnavailable(format!("cannot read {}: {}", path.display(), e))
            })?;
            (text, path.display().to_string())
        } else if let Some(ref url) = config.url {
            (fetch_source(url, config.fetch_timeout_secs).await?, url.clone())
        } else {
            return Err(AuditError::EngineUnavailable(
                "no axe-core source configured (set engine.source or engine.url)".to_string(),
            ));
        };

        if source.trim().is_empty() {
            return Err(AuditError::EngineUnavailable(format!("{} is empty", origin)));
        }

        info!("Loaded axe-core from {} ({} bytes)", origin, source.len());
        Ok(Self {
            source: Arc::from(source),
            origin,
        })
    }

    /// Where the source came from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Evaluate axe-core in the page and confirm it is callable
    pub async fn inject(&self, page: &dyn Page) -> Result<()> {
        page.evaluate(&self.source)
            .await
            .map_err(|e| AuditError::EngineUnavailable(format!("injection failed: {}", e)))?;

        if !is_present(page).await? {
            return Err(AuditError::EngineUnavailable(
                "axe is not defined after injection (blocked by content security policy?)"
                    .to_string(),
            ));
        }

        debug!("Injected axe-core from {}", self.origin);
        Ok(())
    }
}

async fn fetch_source(url: &str, timeout_secs: u64) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AuditError::EngineUnavailable(format!("cannot fetch {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(AuditError::EngineUnavailable(format!(
            "fetching {} returned status {}",
            url,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| AuditError::EngineUnavailable(format!("cannot read {}: {}", url, e)))
}

/// Whether axe-core is present in the page context
pub async fn is_present(page: &dyn Page) -> Result<bool> {
    Ok(page.evaluate(PROBE_SCRIPT).await?.as_bool().unwrap_or(false))
}

/// The script that runs one audit and returns the serializable part of the result
pub fn analyze_script(target: &AuditTarget, options: &AuditOptions) -> String {
    format!(
        "{}{}, {}).then(r => ({{ url: r.url, timestamp: r.timestamp, testEngine: r.testEngine, violations: r.violations }}))",
        RUN_CALL,
        target.context_expression(),
        options.engine_options()
    )
}

/// Run axe-core once and decode its violations, unfiltered
pub async fn analyze(
    page: &dyn Page,
    target: &AuditTarget,
    options: &AuditOptions,
) -> Result<AuditResult> {
    let raw = page.evaluate(&analyze_script(target, options)).await?;
    decode(raw)
}

/// Decode the JSON returned by [`analyze_script`]
pub fn decode(raw: serde_json::Value) -> Result<AuditResult> {
    if raw.is_null() {
        return Err(AuditError::Engine("axe.run returned no result".to_string()));
    }

    let raw: RawResults =
        serde_json::from_value(raw).map_err(|e| AuditError::Engine(e.to_string()))?;

    Ok(AuditResult {
        url: raw.url,
        engine_version: raw.test_engine.map(|e| e.version),
        timestamp: raw.timestamp,
        violations: raw.violations.into_iter().map(RawViolation::into_violation).collect(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResults {
    url: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    test_engine: Option<RawTestEngine>,
    #[serde(default)]
    violations: Vec<RawViolation>,
}

#[derive(Debug, Deserialize)]
struct RawTestEngine {
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawViolation {
    id: String,
    impact: Option<Impact>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    help: String,
    help_url: Option<String>,
    #[serde(default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default)]
    html: String,
    #[serde(default)]
    target: Vec<serde_json::Value>,
    impact: Option<Impact>,
    failure_summary: Option<String>,
}

impl RawViolation {
    fn into_violation(self) -> Violation {
        // axe leaves the rule impact null only when nodes carry their own
        let impact = self
            .impact
            .or_else(|| self.nodes.iter().filter_map(|n| n.impact).max())
            .unwrap_or(Impact::Minor);

        Violation {
            id: self.id,
            description: self.description,
            help: self.help,
            help_url: self.help_url,
            tags: self.tags,
            impact,
            nodes: self.nodes.into_iter().map(RawNode::into_node).collect(),
        }
    }
}

impl RawNode {
    fn into_node(self) -> NodeResult {
        NodeResult {
            target: self.target.iter().map(flatten_selector).collect(),
            html: self.html,
            failure_summary: self.failure_summary,
            impact: self.impact,
        }
    }
}

/// Shadow DOM targets arrive as nested arrays of selectors
fn flatten_selector(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(parts) => parts
            .iter()
            .map(flatten_selector)
            .collect::<Vec<_>>()
            .join(" >>> "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analyze_script_shape() {
        let script = analyze_script(
            &AuditTarget::selector("[role=\"banner\"]"),
            &AuditOptions::new().with_tags(["wcag2aaa"]),
        );
        assert!(script.starts_with(RUN_CALL));
        assert!(script.contains(r#"{"include":[["[role=\"banner\"]"]]}"#));
        assert!(script.contains(r#""runOnly":{"type":"tag","values":["wcag2aaa"]}"#));
    }

    #[test]
    fn test_decode_full_result() {
        let raw = json!({
            "url": "https://digital.gov/",
            "timestamp": "2024-05-01T12:00:00.000Z",
            "testEngine": { "name": "axe-core", "version": "4.9.1" },
            "violations": [{
                "id": "color-contrast",
                "impact": "serious",
                "tags": ["cat.color", "wcag2aa", "wcag143"],
                "description": "Ensures contrast meets WCAG 2 AA thresholds",
                "help": "Elements must meet minimum color contrast ratio thresholds",
                "helpUrl": "https://dequeuniversity.com/rules/axe/4.9/color-contrast",
                "nodes": [{
                    "html": "<p class=\"muted\">Note</p>",
                    "target": [".muted"],
                    "impact": "serious",
                    "failureSummary": "Fix any of the following: insufficient contrast"
                }]
            }]
        });

        let result = decode(raw).unwrap();
        assert_eq!(result.url.as_deref(), Some("https://digital.gov/"));
        assert_eq!(result.engine_version.as_deref(), Some("4.9.1"));
        assert!(result.timestamp.is_some());
        assert_eq!(result.len(), 1);

        let v = &result.violations[0];
        assert_eq!(v.impact, Impact::Serious);
        assert!(v.has_tag("wcag2aa"));
        assert_eq!(v.nodes[0].selector(), ".muted");
        assert!(v.nodes[0].failure_summary.as_deref().unwrap().contains("contrast"));
    }

    #[test]
    fn test_decode_empty() {
        let result = decode(json!({ "violations": [] })).unwrap();
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_decode_null_is_engine_error() {
        assert!(matches!(decode(json!(null)), Err(AuditError::Engine(_))));
    }

    #[test]
    fn test_null_rule_impact_falls_back_to_nodes() {
        let raw = json!({ "violations": [{
            "id": "aria-allowed-attr",
            "impact": null,
            "nodes": [
                { "html": "<a>", "target": ["a"], "impact": "moderate" },
                { "html": "<b>", "target": ["b"], "impact": "critical" }
            ]
        }]});
        let result = decode(raw).unwrap();
        assert_eq!(result.violations[0].impact, Impact::Critical);
    }

    #[test]
    fn test_shadow_dom_target_flattened() {
        let raw = json!({ "violations": [{
            "id": "button-name",
            "impact": "critical",
            "nodes": [{ "html": "<button>", "target": [["my-widget", "button.icon"]] }]
        }]});
        let result = decode(raw).unwrap();
        assert_eq!(result.violations[0].nodes[0].target, vec!["my-widget >>> button.icon"]);
    }

    #[tokio::test]
    async fn test_load_without_source_is_unavailable() {
        let config = EngineConfig { source: None, url: None, fetch_timeout_secs: 5 };
        let err = AxeEngine::load(&config).await.unwrap_err();
        assert!(matches!(err, AuditError::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("axe.min.js");
        std::fs::write(&path, "window.axe = { run: function () {} };").unwrap();

        let config = EngineConfig { source: Some(path.clone()), url: None, fetch_timeout_secs: 5 };
        let engine = AxeEngine::load(&config).await.unwrap();
        assert_eq!(engine.origin(), path.display().to_string());
    }

    #[tokio::test]
    async fn test_load_blank_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("axe.min.js");
        std::fs::write(&path, "  \n\t\n").unwrap();

        let config = EngineConfig { source: Some(path.clone()), url: None, fetch_timeout_secs: 5 };
        let err = AxeEngine::load(&config).await.unwrap_err();
        assert!(matches!(err, AuditError::EngineUnavailable(ref msg) if msg.ends_with("is empty")));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_unavailable() {
        let config = EngineConfig {
            source: Some("/nonexistent/axe.min.js".into()),
            url: None,
            fetch_timeout_secs: 5,
        };
        let err = AxeEngine::load(&config).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/axe.min.js"));
    }
}
