//! Browser connection planning.
//!
//! Transforms the high-level configuration into a typed launch plan: either
//! attach to an already-running Chromium over a CDP URL, or launch a local
//! instance. The runtime executes the plan; nothing here talks to a browser.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::HarvestConfig;

/// How the runtime obtains a browser.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchStrategy {
    /// Attach to an existing browser over its CDP websocket URL.
    AttachCdp { url: String },
    /// Launch a local Chromium instance.
    LaunchLocal {
        chrome_executable: Option<PathBuf>,
        user_data_dir: Option<PathBuf>,
    },
}

/// Launch options applied when the plan launches a local browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchOptions {
    pub headless: bool,
    pub args: Vec<String>,
    pub viewport: Viewport,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            args: vec!["--disable-blink-features=AutomationControlled".to_string()],
            viewport: Viewport::default(),
        }
    }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 1280,
            height: 720,
        }
    }
}

/// Normalised execution plan derived from a [`HarvestConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserPlan {
    pub strategy: LaunchStrategy,
    pub options: LaunchOptions,
}

impl BrowserPlan {
    /// Build a plan from the configuration. A configured CDP URL always wins
    /// over launching locally.
    pub fn from_config(config: &HarvestConfig) -> Self {
        let strategy = match &config.cdp_url {
            Some(url) => LaunchStrategy::AttachCdp { url: url.clone() },
            None => LaunchStrategy::LaunchLocal {
                chrome_executable: config.chrome_executable.clone(),
                user_data_dir: config.user_data_dir.clone(),
            },
        };

        BrowserPlan {
            strategy,
            options: LaunchOptions {
                headless: config.headless,
                ..LaunchOptions::default()
            },
        }
    }
}
