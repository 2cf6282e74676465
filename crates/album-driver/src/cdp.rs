//! [`AlbumPage`] backed by a running Chromium through the DevTools protocol.
//!
//! The browser must be started with `--remote-debugging-port`; the driver
//! attaches to the tab showing the album instead of launching its own, so
//! the user's login session is reused.

use crate::page::{AlbumPage, PageError, UiRole};
use album_proto::config::{BrowserConfig, SelectorConfig};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct CdpPage {
    page: Page,
    selectors: SelectorConfig,
    // Dropping the browser tears down the CDP connection.
    _browser: Browser,
    _handler: tokio::task::JoinHandle<()>,
}

impl CdpPage {
    pub async fn connect(
        config: &BrowserConfig,
        selectors: SelectorConfig,
        client: &reqwest::Client,
    ) -> anyhow::Result<Self> {
        let ws_url = discover_ws_url(client, &config.debugger_url).await?;
        info!("Connecting to DevTools endpoint {}", ws_url);

        let (mut browser, mut handler) = Browser::connect(ws_url)
            .await
            .context("connecting to browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler error: {}", e);
                }
            }
            warn!("CDP connection closed");
        });

        browser
            .fetch_targets()
            .await
            .context("listing browser tabs")?;
        // Give the handler a moment to attach to the discovered targets.
        tokio::time::sleep(Duration::from_millis(500)).await;

        let page = match find_tab(&browser, &config.page_url_contains).await? {
            Some(page) => page,
            None => {
                info!(
                    "No tab matching {:?}, opening {}",
                    config.page_url_contains, config.album_url
                );
                browser
                    .new_page(config.album_url.as_str())
                    .await
                    .context("opening album tab")?
            }
        };

        Ok(Self {
            page,
            selectors,
            _browser: browser,
            _handler: handler_task,
        })
    }

    fn selector(&self, role: UiRole) -> &str {
        role.selector(&self.selectors)
    }
}

async fn find_tab(browser: &Browser, url_fragment: &str) -> anyhow::Result<Option<Page>> {
    for page in browser.pages().await.context("listing pages")? {
        let url = page.url().await.ok().flatten().unwrap_or_default();
        debug!("Found tab {}", url);
        if url.contains(url_fragment) {
            info!("Attaching to tab {}", url);
            return Ok(Some(page));
        }
    }
    Ok(None)
}

/// Resolves the browser websocket URL from the DevTools HTTP endpoint.
async fn discover_ws_url(client: &reqwest::Client, debugger_url: &str) -> anyhow::Result<String> {
    if debugger_url.starts_with("ws://") || debugger_url.starts_with("wss://") {
        return Ok(debugger_url.to_string());
    }
    let json_url = format!("{}/json/version", debugger_url.trim_end_matches('/'));
    let json: serde_json::Value = client
        .get(&json_url)
        .send()
        .await
        .with_context(|| format!("querying {}", json_url))?
        .json()
        .await
        .context("parsing DevTools version info")?;
    ws_url_from_version(&json)
}

fn ws_url_from_version(json: &serde_json::Value) -> anyhow::Result<String> {
    json["webSocketDebuggerUrl"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no webSocketDebuggerUrl in DevTools version info"))
}

#[async_trait]
impl AlbumPage for CdpPage {
    async fn present(&self, role: UiRole) -> bool {
        match self.page.find_elements(self.selector(role)).await {
            Ok(elements) => !elements.is_empty(),
            Err(_) => false,
        }
    }

    async fn click(&self, role: UiRole) -> Result<(), PageError> {
        let element = self
            .page
            .find_element(self.selector(role))
            .await
            .map_err(|_| PageError::Missing(role))?;
        element
            .click()
            .await
            .map_err(|e| PageError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn field_texts(&self) -> Vec<String> {
        let elements = match self.page.find_elements(self.selectors.media_field.as_str()).await {
            Ok(elements) => elements,
            Err(e) => {
                debug!("reading info fields: {}", e);
                return Vec::new();
            }
        };
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements.iter().take(2) {
            let text = element.inner_text().await.ok().flatten().unwrap_or_default();
            texts.push(text.trim().to_string());
        }
        texts
    }
}
