// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory browser for integration tests.
//!
//! `FakePage` answers the engine's probe and run scripts from JSON fixtures
//! keyed by URL. Any other script is treated as the axe-core source being
//! injected. Navigation clears the injected engine, as a real page load does.

#![allow(dead_code)]

use async_trait::async_trait;
use axebot::engine::{PROBE_SCRIPT, RUN_CALL};
use axebot::{AuditError, Page, PageFactory, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const HOME: &str = "https://digital.gov";
pub const GUIDE: &str = "https://digital.gov/resources/how-test-websites-for-accessibility/";

/// Stand-in for axe.min.js
pub const FAKE_AXE: &str = "window.axe = { run: function () { return Promise.resolve({}); } };";

pub fn fixture(name: &str) -> serde_json::Value {
    let path = Path::new("tests/fixtures").join(name);
    let text = std::fs::read_to_string(&path).expect("fixture exists");
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

/// Pages, elements and engine behavior shared by every page a browser opens
#[derive(Clone, Default)]
pub struct Site {
    routes: HashMap<String, serde_json::Value>,
    elements: HashMap<String, usize>,
    hangs: HashSet<String>,
    blocks_injection: bool,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `url` with the axe results in `fixture_name`
    pub fn route(mut self, url: &str, fixture_name: &str) -> Self {
        self.routes.insert(url.to_string(), fixture(fixture_name));
        self
    }

    pub fn element(mut self, selector: &str, count: usize) -> Self {
        self.elements.insert(selector.to_string(), count);
        self
    }

    /// axe.run on `url` never settles
    pub fn hang(mut self, url: &str) -> Self {
        self.hangs.insert(url.to_string());
        self
    }

    /// Injected scripts never define `axe`, as under a strict CSP
    pub fn block_injection(mut self) -> Self {
        self.blocks_injection = true;
        self
    }
}

pub struct FakePage {
    site: Site,
    current: Mutex<Option<String>>,
    axe_loaded: AtomicBool,
    scripts: Mutex<Vec<String>>,
    closed: Arc<AtomicUsize>,
}

impl FakePage {
    pub fn new(site: Site) -> Self {
        Self::counting_closes(site, Arc::new(AtomicUsize::new(0)))
    }

    fn counting_closes(site: Site, closed: Arc<AtomicUsize>) -> Self {
        Self {
            site,
            current: Mutex::new(None),
            axe_loaded: AtomicBool::new(false),
            scripts: Mutex::new(Vec::new()),
            closed,
        }
    }

    /// Every `axe.run(...)` script evaluated so far
    pub fn run_calls(&self) -> Vec<String> {
        self.scripts
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.starts_with(RUN_CALL))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        *self.current.lock().unwrap() = Some(url.to_string());
        self.axe_loaded.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.site.elements.get(selector).copied().unwrap_or(0))
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.scripts.lock().unwrap().push(script.to_string());

        if script == PROBE_SCRIPT {
            return Ok(serde_json::Value::Bool(self.axe_loaded.load(Ordering::SeqCst)));
        }

        if script.starts_with(RUN_CALL) {
            if !self.axe_loaded.load(Ordering::SeqCst) {
                return Err(AuditError::Browser("ReferenceError: axe is not defined".into()));
            }
            let url = self.current.lock().unwrap().clone().unwrap_or_default();
            if self.site.hangs.contains(&url) {
                std::future::pending::<()>().await;
            }
            return Ok(self
                .site
                .routes
                .get(&url)
                .cloned()
                .unwrap_or_else(|| serde_json::json!({ "url": url, "violations": [] })));
        }

        if !self.site.blocks_injection {
            self.axe_loaded.store(true, Ordering::SeqCst);
        }
        Ok(serde_json::Value::Null)
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Opens a fresh `FakePage` per request; pages share nothing
pub struct FakeBrowser {
    site: Site,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
}

impl FakeBrowser {
    pub fn new(site: Site) -> Arc<Self> {
        Arc::new(Self {
            site,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Pages opened but not yet closed
    pub fn open_pages(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFactory for FakeBrowser {
    async fn new_page(&self) -> Result<Box<dyn Page>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage::counting_closes(
            self.site.clone(),
            Arc::clone(&self.closed),
        )))
    }
}
