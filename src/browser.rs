// SPDX-License-Identifier: PMPL-1.0-or-later
//! Headless Chrome over the DevTools protocol.
//!
//! One [`ChromeSession`] owns the browser process. Every [`ChromePage`] lives
//! in its own browser context, so audits never share cookies or storage, and
//! closing the page disposes of that context.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::{AuditError, Result};
use crate::page::{Page, PageFactory};

/// A running browser process and its CDP event loop
pub struct ChromeSession {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch Chrome according to `config`
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = CdpBrowserConfig::builder()
            .window_size(config.window_width, config.window_height)
            .request_timeout(Duration::from_secs(config.request_timeout_secs));

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.executable {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(AuditError::Browser)?;
        let (browser, mut handler) = Browser::launch(cdp_config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        info!("Launched browser (headless: {})", config.headless);
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
        })
    }

    /// Open a tab on `about:blank` in a new browser context
    pub async fn open_page(&self) -> Result<ChromePage> {
        let browser = self.browser.lock().await;
        let context = browser
            .execute(CreateBrowserContextParams::default())
            .await?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
            .map_err(AuditError::Browser)?;

        let page = match browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                dispose_context(&browser, context).await;
                return Err(e.into());
            }
        };
        debug!("Opened page in context {:?}", context);

        Ok(ChromePage {
            page,
            context,
            browser: Arc::clone(&self.browser),
        })
    }

    /// Close the browser and stop its event loop
    pub async fn close(self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("Waiting for browser exit failed: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl PageFactory for ChromeSession {
    async fn new_page(&self) -> Result<Box<dyn Page>> {
        Ok(Box::new(self.open_page().await?))
    }
}

async fn dispose_context(browser: &Browser, context: BrowserContextId) {
    if let Err(e) = browser.execute(DisposeBrowserContextParams::new(context)).await {
        warn!("Failed to dispose browser context: {}", e);
    }
}

/// A single Chrome tab and the browser context it owns
pub struct ChromePage {
    page: chromiumoxide::Page,
    context: BrowserContextId,
    browser: Arc<Mutex<Browser>>,
}

#[async_trait]
impl Page for ChromePage {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let script = count_script(selector)?;
        let value = self.evaluate(&script).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(AuditError::Browser)?;

        let result = self.page.evaluate_expression(params).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn close(&self) -> Result<()> {
        if let Err(e) = self.page.clone().close().await {
            debug!("Page close failed, disposing its context anyway: {}", e);
        }
        let browser = self.browser.lock().await;
        dispose_context(&browser, self.context.clone()).await;
        Ok(())
    }
}

/// Script counting matches for `selector`, yielding 0 for invalid syntax
fn count_script(selector: &str) -> Result<String> {
    let quoted = serde_json::to_string(selector)?;
    Ok(format!(
        "(() => {{ try {{ return document.querySelectorAll({}).length; }} catch (e) {{ return 0; }} }})()",
        quoted
    ))
}
