// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation for audit results.
//!
//! Supports multiple output formats:
//! - Text: violations grouped by impact with affected selectors
//! - Table: one row per violation, for terminal logs
//! - JSON: the serialized result for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

pub mod reporter;

pub use reporter::{FormatReporter, Reporter, TerminalReporter, TracingReporter};

use crate::result::{AuditResult, Impact};
use serde::{Deserialize, Serialize};

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Terminal table
    Table,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI integration
    Sarif,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Generate a report from an audit result
pub fn generate_report(result: &AuditResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(result),
        OutputFormat::Table => generate_table(result),
        OutputFormat::Json => generate_json_report(result),
        OutputFormat::Sarif => generate_sarif_report(result),
    }
}

/// Generate human-readable text report
fn generate_text_report(result: &AuditResult) -> String {
    let mut output = String::new();

    output.push_str("=== axebot Accessibility Audit ===\n");
    if let Some(ref url) = result.url {
        output.push_str(&format!("Page: {}\n", url));
    }
    output.push('\n');

    if result.is_empty() {
        output.push_str("No accessibility violations found.\n");
        output.push_str("RESULT: PASS\n");
        return output;
    }

    output.push_str(&format!(
        "Found {} violation(s) affecting {} node(s)\n\n",
        result.len(),
        result.node_count()
    ));

    for impact in Impact::DESCENDING {
        let violations = result.by_impact(impact);
        if violations.is_empty() {
            continue;
        }

        output.push_str(&format!(
            "--- {} ({}) ---\n",
            impact.to_string().to_uppercase(),
            violations.len()
        ));

        for violation in violations {
            let headline = if violation.help.is_empty() {
                &violation.description
            } else {
                &violation.help
            };
            output.push_str(&format!("[{}] {}\n", violation.id, headline));

            if !violation.tags.is_empty() {
                output.push_str(&format!("  Tags: {}\n", violation.tags.join(", ")));
            }

            for node in &violation.nodes {
                output.push_str(&format!("  Node: {}\n", node.selector()));
                output.push_str(&format!("    {}\n", node.html));
                if let Some(ref summary) = node.failure_summary {
                    for line in summary.lines().map(str::trim).filter(|l| !l.is_empty()) {
                        output.push_str(&format!("    > {}\n", line));
                    }
                }
            }

            if let Some(ref url) = violation.help_url {
                output.push_str(&format!("  Help: {}\n", url));
            }

            output.push('\n');
        }
    }

    if let Some(worst) = result.worst_impact() {
        output.push_str(&format!("RESULT: FAIL (worst impact: {})\n", worst));
    }

    output
}

/// Generate the violation table printed by the terminal reporter
fn generate_table(result: &AuditResult) -> String {
    let count = result.len();
    let mut output = format!(
        "{} accessibility violation{} {} detected\n",
        count,
        if count == 1 { "" } else { "s" },
        if count == 1 { "was" } else { "were" }
    );

    if result.is_empty() {
        return output;
    }

    let rows: Vec<[String; 4]> = result
        .violations
        .iter()
        .map(|v| {
            [
                v.id.clone(),
                v.impact.to_string(),
                v.description.clone(),
                v.nodes.len().to_string(),
            ]
        })
        .collect();

    let header = ["id", "impact", "description", "nodes"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 4]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    output.push_str(&format_row(header));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&format!("|-{}-|\n", rule.join("-|-")));
    for row in &rows {
        output.push_str(&format_row([&row[0], &row[1], &row[2], &row[3]]));
    }

    output
}

/// Generate JSON report
fn generate_json_report(result: &AuditResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize audit result: {}\"}}", e)
    })
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
struct SarifRule {
    id: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "helpUri", skip_serializing_if = "Option::is_none")]
    help_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
    #[serde(rename = "logicalLocations")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
struct SarifRegion {
    snippet: SarifMessage,
}

#[derive(Debug, Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
    kind: String,
}

/// SARIF level for an impact
fn sarif_level(impact: Impact) -> &'static str {
    match impact {
        Impact::Critical | Impact::Serious => "error",
        Impact::Moderate => "warning",
        Impact::Minor => "note",
    }
}

/// Generate SARIF report
fn generate_sarif_report(result: &AuditResult) -> String {
    let page = result.url.clone().unwrap_or_else(|| "<page>".to_string());

    let rules: Vec<SarifRule> = result
        .violations
        .iter()
        .map(|v| SarifRule {
            id: v.id.clone(),
            short_description: SarifMessage { text: v.description.clone() },
            help_uri: v.help_url.clone(),
        })
        .collect();

    let results: Vec<SarifResult> = result
        .violations
        .iter()
        .map(|v| {
            let locations = v
                .nodes
                .iter()
                .map(|node| SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifactLocation { uri: page.clone() },
                        region: SarifRegion {
                            snippet: SarifMessage { text: node.html.clone() },
                        },
                    },
                    logical_locations: vec![SarifLogicalLocation {
                        fully_qualified_name: node.selector(),
                        kind: "element".to_string(),
                    }],
                })
                .collect();

            SarifResult {
                rule_id: v.id.clone(),
                level: sarif_level(v.impact).to_string(),
                message: SarifMessage {
                    text: if v.help.is_empty() { v.description.clone() } else { v.help.clone() },
                },
                locations,
            }
        })
        .collect();

    let report = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "axebot".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: "https://github.com/dequelabs/axe-core".to_string(),
                    rules,
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize SARIF report: {}\"}}", e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{NodeResult, Violation};

    fn sample_result() -> AuditResult {
        let mut result = AuditResult::new(vec![
            Violation::new("image-alt", Impact::Critical, "Ensures <img> elements have alternate text")
                .with_help(
                    "Images must have alternate text",
                    "https://dequeuniversity.com/rules/axe/4.9/image-alt",
                )
                .with_tags(&["cat.text-alternatives", "wcag2a", "wcag111"])
                .with_node(
                    NodeResult::new(vec!["#logo".into()], "<img id=\"logo\">").with_failure_summary(
                        "Fix any of the following:\n  Element does not have an alt attribute",
                    ),
                ),
            Violation::new("region", Impact::Moderate, "Ensures all page content is contained by landmarks")
                .with_node(NodeResult::new(vec!["#footer-note".into()], "<p id=\"footer-note\">")),
        ]);
        result.url = Some("https://digital.gov/".into());
        result
    }

    #[test]
    fn test_text_report_empty() {
        let report = generate_report(&AuditResult::default(), OutputFormat::Text);
        assert!(report.contains("No accessibility violations found"));
        assert!(report.contains("RESULT: PASS"));
    }

    #[test]
    fn test_text_report_groups_by_impact() {
        let report = generate_report(&sample_result(), OutputFormat::Text);
        let critical = report.find("--- CRITICAL (1) ---").unwrap();
        let moderate = report.find("--- MODERATE (1) ---").unwrap();
        assert!(critical < moderate);
        assert!(report.contains("[image-alt] Images must have alternate text"));
        assert!(report.contains("  Node: #logo"));
        assert!(report.contains("    > Fix any of the following:\n    > Element does not have an alt attribute\n"));
        assert!(report.contains("RESULT: FAIL (worst impact: critical)"));
    }

    #[test]
    fn test_table_report() {
        let report = generate_report(&sample_result(), OutputFormat::Table);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "2 accessibility violations were detected");
        assert!(lines[1].starts_with("| id "));
        assert!(lines[3].contains("| image-alt | critical |"));
        // All table rows are the same width
        assert_eq!(lines[1].len(), lines[3].len());
        assert_eq!(lines[1].len(), lines[4].len());
    }

    #[test]
    fn test_table_report_empty() {
        let report = generate_report(&AuditResult::default(), OutputFormat::Table);
        assert_eq!(report, "0 accessibility violations were detected\n");
    }

    #[test]
    fn test_json_report() {
        let report = generate_report(&sample_result(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert_eq!(parsed["violations"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["violations"][0]["impact"], "critical");
    }

    #[test]
    fn test_sarif_report() {
        let report = generate_report(&sample_result(), OutputFormat::Sarif);
        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        assert_eq!(parsed["version"], "2.1.0");
        let results = &parsed["runs"][0]["results"];
        assert_eq!(results[0]["level"], "error");
        assert_eq!(results[1]["level"], "warning");
        assert_eq!(
            results[0]["locations"][0]["logicalLocations"][0]["fullyQualifiedName"],
            "#logo"
        );
        assert_eq!(
            results[0]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
            "https://digital.gov/"
        );
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("sarif".parse::<OutputFormat>().unwrap(), OutputFormat::Sarif);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
