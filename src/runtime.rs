//! Chromiumoxide-based page driver.
//!
//! Executes a [`BrowserPlan`](crate::browser::BrowserPlan) against a real
//! Chromium instance and implements [`HarvestPage`] by evaluating the extent,
//! scroll, and scan expressions in page context. Launching is idempotent;
//! `shutdown` tears the handler task down and drops the browser handle.

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    page::Page as ChromiumPage,
};
use futures_util::StreamExt;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::browser::{BrowserPlan, LaunchStrategy};
use crate::page::{HarvestPage, PageError};

/// Errors surfaced while starting, navigating, or stopping the browser.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("browser error: {0}")]
    Browser(String),
    #[error("browser runtime not initialized")]
    NotInitialized,
    #[error("no page opened; navigate first")]
    NoPage,
}

pub struct ChromiumRuntime {
    state: Arc<Mutex<Option<RuntimeState>>>,
}

struct RuntimeState {
    browser: Arc<Browser>,
    _handler: JoinHandle<()>,
    page: Option<ChromiumPage>,
}

impl ChromiumRuntime {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(None)),
        }
    }

    /// Execute the plan. Returns immediately if a browser is already held.
    pub async fn launch(&self, plan: &BrowserPlan) -> Result<(), RuntimeError> {
        if self.state.lock().await.is_some() {
            return Ok(());
        }

        let (browser, handler) = match &plan.strategy {
            LaunchStrategy::AttachCdp { url } => {
                Browser::connect(url).await.map_err(map_browser_error)?
            }
            LaunchStrategy::LaunchLocal { .. } => {
                let config = build_config(plan)?;
                Browser::launch(config).await.map_err(map_browser_error)?
            }
        };

        let new_state = RuntimeState {
            browser: Arc::new(browser),
            _handler: spawn_handler(handler),
            page: None,
        };

        let mut guard = self.state.lock().await;
        *guard = Some(new_state);
        Ok(())
    }

    /// Open the target page and keep its handle for subsequent evaluation.
    pub async fn open(&self, url: &str) -> Result<(), RuntimeError> {
        let browser = {
            let guard = self.state.lock().await;
            let state = guard.as_ref().ok_or(RuntimeError::NotInitialized)?;
            state.browser.clone()
        };

        let page = browser.new_page(url).await.map_err(map_browser_error)?;

        let mut guard = self.state.lock().await;
        match guard.as_mut() {
            Some(state) => {
                state.page = Some(page);
                Ok(())
            }
            None => Err(RuntimeError::NotInitialized),
        }
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let state = {
            let mut guard = self.state.lock().await;
            guard.take()
        };

        if let Some(mut state) = state {
            state._handler.abort();
            state.page = None;
        }
        Ok(())
    }

    async fn page(&self) -> Result<ChromiumPage, PageError> {
        let guard = self.state.lock().await;
        let state = guard.as_ref().ok_or(PageError::NotInitialized)?;
        state.page.clone().ok_or(PageError::NotInitialized)
    }

    async fn evaluate(&self, expression: &str) -> Result<JsonValue, PageError> {
        let page = self.page().await?;
        let result = page.evaluate(expression).await.map_err(cdp_error)?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }
}

impl Default for ChromiumRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HarvestPage for ChromiumRuntime {
    async fn content_extent(&self) -> Result<f64, PageError> {
        let value = self
            .evaluate("document.documentElement.scrollHeight")
            .await?;
        value
            .as_f64()
            .ok_or_else(|| PageError::Payload(format!("scrollHeight was not a number: {value}")))
    }

    async fn scroll_to(&self, extent: f64) -> Result<(), PageError> {
        self.evaluate(&format!("window.scrollTo(0, {extent})"))
            .await?;
        Ok(())
    }

    async fn comment_texts(&self, selector: &str) -> Result<Vec<String>, PageError> {
        // Serialize the selector as a JSON string so it arrives as a valid
        // JS string literal regardless of embedded quotes.
        let selector_literal = serde_json::to_string(selector)
            .map_err(|err| PageError::Payload(err.to_string()))?;
        let expression = format!(
            "Array.from(document.querySelectorAll({selector_literal})).map(node => node.innerText)"
        );

        let value = self.evaluate(&expression).await?;
        match value {
            JsonValue::Null => Ok(Vec::new()),
            other => serde_json::from_value(other)
                .map_err(|err| PageError::Payload(format!("comment scan was not a string array: {err}"))),
        }
    }
}

fn build_config(plan: &BrowserPlan) -> Result<BrowserConfig, RuntimeError> {
    let options = &plan.options;

    let viewport = chromiumoxide::handler::viewport::Viewport {
        width: options.viewport.width,
        height: options.viewport.height,
        device_scale_factor: None,
        emulating_mobile: false,
        is_landscape: options.viewport.width >= options.viewport.height,
        has_touch: false,
    };

    let mut builder = BrowserConfig::builder()
        .viewport(viewport)
        .args(options.args.clone());

    if let LaunchStrategy::LaunchLocal {
        chrome_executable,
        user_data_dir,
    } = &plan.strategy
    {
        if let Some(path) = chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if let Some(dir) = user_data_dir {
            builder = builder.user_data_dir(dir);
        }
    }

    let builder = if options.headless {
        builder
    } else {
        builder.with_head()
    };

    builder.build().map_err(RuntimeError::Browser)
}

fn map_browser_error<E: std::fmt::Display>(err: E) -> RuntimeError {
    RuntimeError::Browser(err.to_string())
}

fn cdp_error<E: std::fmt::Display>(err: E) -> PageError {
    PageError::Cdp(err.to_string())
}

fn spawn_handler(mut handler: chromiumoxide::handler::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = handler.next().await {
            if let Err(err) = result {
                log::debug!("chromiumoxide handler error: {err}");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::LaunchOptions;

    #[tokio::test]
    async fn open_requires_a_launched_browser() {
        let runtime = ChromiumRuntime::new();
        let err = runtime
            .open("https://example.com")
            .await
            .expect_err("should fail before launch");
        assert!(matches!(err, RuntimeError::NotInitialized));
    }

    #[tokio::test]
    async fn page_operations_require_an_open_page() {
        let runtime = ChromiumRuntime::new();
        let err = runtime
            .content_extent()
            .await
            .expect_err("should fail without a page");
        assert!(matches!(err, PageError::NotInitialized));
    }

    #[tokio::test]
    async fn shutdown_without_launch_is_a_no_op() {
        let runtime = ChromiumRuntime::new();
        runtime.shutdown().await.expect("shutdown succeeds");
    }

    #[test]
    fn build_config_accepts_an_explicit_executable() {
        // An explicit executable skips chromiumoxide's system-wide probe, so
        // this builds even on hosts without a Chrome install.
        let plan = BrowserPlan {
            strategy: LaunchStrategy::LaunchLocal {
                chrome_executable: Some(std::path::PathBuf::from("/usr/bin/chromium")),
                user_data_dir: None,
            },
            options: LaunchOptions::default(),
        };
        build_config(&plan).expect("config builds");
    }
}
