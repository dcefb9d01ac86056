//! `chromiumoxide` implementation of the browser capabilities
//!
//! One Chrome process is launched lazily on first use and shared by every
//! session. Each session is its own tab and is closed when the session is.

use crate::browser::{BrowserError, ElementHandle, RenderedSession, Renderer};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

const LINKS_SCRIPT: &str =
    "JSON.stringify(Array.from(document.querySelectorAll('a[href]')).map(a => a.href))";

const HEIGHT_SCRIPT: &str = "document.body ? document.body.scrollHeight : 0";

const TEXT_FN: &str = "function() { return (this.textContent || '').trim(); }";

// Visible: at least one layout box (fixed-position included) and not visibility-hidden
const VISIBLE_FN: &str = "function() {
    if (this.getClientRects().length === 0) {
        return false;
    }
    const style = window.getComputedStyle(this);
    return style.visibility !== 'hidden' && style.visibility !== 'collapse';
}";

const ANCESTOR_CLASSES_FN: &str = "function() {
    const out = [];
    let node = this.parentElement;
    for (let i = 0; i < 2 && node; i++) {
        out.push(node.getAttribute('class') || '');
        node = node.parentElement;
    }
    return JSON.stringify(out);
}";

const FORCE_CLICK_FN: &str = "function() { this.click(); }";

/// Browser process plus the task pumping its DevTools events
struct LaunchedBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for LaunchedBrowser {
    fn drop(&mut self) {
        // Dropping the Browser kills Chrome; the handler would spin forever
        self.handler.abort();
    }
}

/// Renderer backed by a headless Chrome
pub struct ChromeRenderer {
    config: BrowserConfig,
    user_agent: String,
    launched: OnceCell<LaunchedBrowser>,
}

impl ChromeRenderer {
    pub fn new(config: BrowserConfig, user_agent: impl Into<String>) -> Self {
        Self {
            config,
            user_agent: user_agent.into(),
            launched: OnceCell::new(),
        }
    }

    async fn browser(&self) -> Result<&Browser, BrowserError> {
        let launched = self.launched.get_or_try_init(|| self.launch()).await?;
        Ok(&launched.browser)
    }

    async fn launch(&self) -> Result<LaunchedBrowser, BrowserError> {
        tracing::info!("Launching headless browser");

        let mut builder = chromiumoxide::BrowserConfig::builder()
            .request_timeout(Duration::from_secs(self.config.page_load_timeout))
            .window_size(1920, 1080)
            .no_sandbox()
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg("--mute-audio");

        if let Some(path) = &self.config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if !self.config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
        });

        Ok(LaunchedBrowser { browser, handler })
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn open(&self, url: &str) -> Result<Box<dyn RenderedSession>, BrowserError> {
        let browser = self.browser().await?;
        let page = browser.new_page("about:blank").await?;

        let secs = self.config.page_load_timeout;
        let navigation = tokio::time::timeout(Duration::from_secs(secs), async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        })
        .await;

        let failure = match navigation {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Some(BrowserError::Timeout {
                url: url.to_string(),
                secs,
            }),
        };

        if let Some(err) = failure {
            if let Err(close_err) = page.close().await {
                tracing::debug!("Failed to close tab for {}: {}", url, close_err);
            }
            return Err(err);
        }

        tokio::time::sleep(Duration::from_millis(self.config.initial_settle_ms)).await;

        Ok(Box::new(ChromeSession {
            url: url.to_string(),
            page,
        }))
    }
}

struct ChromeSession {
    url: String,
    page: Page,
}

#[async_trait]
impl RenderedSession for ChromeSession {
    fn url(&self) -> &str {
        &self.url
    }

    async fn current_links(&self) -> Result<Vec<String>, BrowserError> {
        let encoded: String = self.page.evaluate(LINKS_SCRIPT).await?.into_value()?;
        Ok(serde_json::from_str(&encoded)?)
    }

    async fn content(&self) -> Result<String, BrowserError> {
        Ok(self.page.content().await?)
    }

    async fn find_elements(
        &self,
        selector: &str,
    ) -> Result<Vec<Box<dyn ElementHandle>>, BrowserError> {
        let elements = self.page.find_elements(selector).await?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(ChromeElement { element }) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn go_back(&self) -> Result<(), BrowserError> {
        self.page.evaluate("window.history.back()").await?;
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    async fn document_height(&self) -> Result<u64, BrowserError> {
        let height: f64 = self.page.evaluate(HEIGHT_SCRIPT).await?.into_value()?;
        Ok(height.max(0.0) as u64)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.page.close().await?;
        Ok(())
    }
}

struct ChromeElement {
    element: Element,
}

impl ChromeElement {
    async fn call(&self, function: &str) -> Result<Option<Value>, BrowserError> {
        let returns = self.element.call_js_fn(function, false).await?;
        Ok(returns.result.value)
    }
}

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.element.attribute(name).await?)
    }

    async fn text(&self) -> Result<String, BrowserError> {
        match self.call(TEXT_FN).await? {
            Some(Value::String(text)) => Ok(text),
            Some(other) => Err(BrowserError::Script(other.to_string())),
            None => Ok(String::new()),
        }
    }

    async fn is_visible(&self) -> Result<bool, BrowserError> {
        match self.call(VISIBLE_FN).await? {
            Some(Value::Bool(visible)) => Ok(visible),
            other => Err(BrowserError::Script(format!("{:?}", other))),
        }
    }

    async fn ancestor_classes(&self) -> Result<Vec<String>, BrowserError> {
        match self.call(ANCESTOR_CLASSES_FN).await? {
            Some(Value::String(encoded)) => Ok(serde_json::from_str(&encoded)?),
            other => Err(BrowserError::Script(format!("{:?}", other))),
        }
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        self.element.scroll_into_view().await?;
        Ok(())
    }

    async fn click(&self) -> Result<(), BrowserError> {
        self.element.click().await?;
        Ok(())
    }

    async fn force_click(&self) -> Result<(), BrowserError> {
        self.call(FORCE_CLICK_FN).await?;
        Ok(())
    }
}
