// SPDX-License-Identifier: PMPL-1.0-or-later
//! What to scan: the whole page or a subtree selected by CSS/role selector.

use serde::{Deserialize, Serialize};

/// Audit target, immutable once constructed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTarget {
    /// Selector scoping the scan; `None` scans the whole document
    #[serde(default)]
    pub include: Option<String>,
    /// Subtrees left out of the scan
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl AuditTarget {
    /// Scan the full current page
    pub fn page() -> Self {
        Self::default()
    }

    /// Scan only the subtree matched by `selector`
    pub fn selector(selector: impl Into<String>) -> Self {
        Self {
            include: Some(selector.into()),
            exclude: Vec::new(),
        }
    }

    /// Leave the subtree matched by `selector` out of the scan
    pub fn excluding(mut self, selector: impl Into<String>) -> Self {
        self.exclude.push(selector.into());
        self
    }

    pub fn is_page(&self) -> bool {
        self.include.is_none()
    }

    /// JavaScript expression for the axe-core `context` argument
    pub fn context_expression(&self) -> String {
        if self.include.is_none() && self.exclude.is_empty() {
            return "document".to_string();
        }

        let mut context = serde_json::Map::new();
        if let Some(ref include) = self.include {
            context.insert("include".into(), serde_json::json!([[include]]));
        }
        if !self.exclude.is_empty() {
            let exclude: Vec<Vec<&String>> = self.exclude.iter().map(|s| vec![s]).collect();
            context.insert("exclude".into(), serde_json::json!(exclude));
        }
        serde_json::Value::Object(context).to_string()
    }
}

impl std::fmt::Display for AuditTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.include {
            Some(ref selector) => write!(f, "{}", selector)?,
            None => write!(f, "<page>")?,
        }
        if !self.exclude.is_empty() {
            write!(f, " excluding {}", self.exclude.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_context_is_document() {
        assert_eq!(AuditTarget::page().context_expression(), "document");
        assert!(AuditTarget::page().is_page());
    }

    #[test]
    fn test_selector_context() {
        let target = AuditTarget::selector("[role=\"banner\"]");
        let ctx: serde_json::Value = serde_json::from_str(&target.context_expression()).unwrap();
        assert_eq!(ctx["include"][0][0], "[role=\"banner\"]");
        assert!(ctx.get("exclude").is_none());
    }

    #[test]
    fn test_page_with_exclusion() {
        let target = AuditTarget::page().excluding("#ads");
        let ctx: serde_json::Value = serde_json::from_str(&target.context_expression()).unwrap();
        assert!(ctx.get("include").is_none());
        assert_eq!(ctx["exclude"][0][0], "#ads");
        assert_eq!(target.to_string(), "<page> excluding #ads");
    }
}
