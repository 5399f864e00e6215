//! Strongly-typed configuration for the harvester.
//!
//! Configuration values can be constructed from defaults, loaded from
//! environment variables (with optional `.env` support), or merged with
//! explicit overrides so the CLI can layer flags on top of the environment.

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;
use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, Serializer};
use serde::{Deserialize as DeriveDeserialize, Serialize as DeriveSerialize};
use thiserror::Error;

/// Selector the target pages use for rendered comment text nodes.
pub const DEFAULT_COMMENT_SELECTOR: &str = "#content-text";

/// Delay between a scroll request and the follow-up rescan. A heuristic for
/// lazy rendering to finish, not a completion signal: pages that load slower
/// than this terminate collection early.
pub const DEFAULT_SCROLL_DELAY_MS: u64 = 2_000;

/// Default output artifact name.
pub const DEFAULT_OUTPUT_PATH: &str = "comments.txt";

/// Verbosity level for harvester logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Minimal,
    Medium,
    Detailed,
}

impl Verbosity {
    fn as_u8(self) -> u8 {
        match self {
            Verbosity::Minimal => 0,
            Verbosity::Medium => 1,
            Verbosity::Detailed => 2,
        }
    }

    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Verbosity::Minimal),
            1 => Some(Verbosity::Medium),
            2 => Some(Verbosity::Detailed),
            _ => None,
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Medium
    }
}

impl Serialize for Verbosity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Verbosity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Verbosity::from_u8(value).ok_or_else(|| {
            DeError::custom(format!(
                "invalid verbosity value {value}; expected 0, 1, or 2"
            ))
        })
    }
}

/// Configuration values for a harvest run.
#[derive(Debug, Clone, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// CSS selector identifying comment text nodes.
    #[serde(alias = "commentSelector")]
    pub comment_selector: String,
    /// Milliseconds to wait after each scroll before rescanning.
    #[serde(alias = "scrollDelayMs")]
    pub scroll_delay_ms: u64,
    /// Optional upper bound on scroll cycles, guarding pages whose extent
    /// never stabilises. `None` scrolls until stability with no bound.
    #[serde(alias = "maxCycles")]
    pub max_cycles: Option<u32>,
    /// Where the exported artifact is written.
    #[serde(alias = "outputPath")]
    pub output_path: PathBuf,
    pub verbose: Verbosity,
    pub headless: bool,
    /// Attach to an already-running browser instead of launching one.
    #[serde(alias = "cdpUrl")]
    pub cdp_url: Option<String>,
    #[serde(alias = "chromeExecutable")]
    pub chrome_executable: Option<PathBuf>,
    #[serde(alias = "userDataDir")]
    pub user_data_dir: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        HarvestConfig {
            comment_selector: DEFAULT_COMMENT_SELECTOR.to_string(),
            scroll_delay_ms: DEFAULT_SCROLL_DELAY_MS,
            max_cycles: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            verbose: Verbosity::default(),
            headless: true,
            cdp_url: None,
            chrome_executable: None,
            user_data_dir: None,
        }
    }
}

impl HarvestConfig {
    /// Construct a configuration by reading relevant environment variables,
    /// after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, HarvestConfigError> {
        let _ = dotenv();
        let mut config = HarvestConfig::default();

        if let Some(value) = env_var("HARVEST_COMMENT_SELECTOR") {
            config.comment_selector = value;
        }

        if let Some(value) = env_var("HARVEST_SCROLL_DELAY_MS") {
            config.scroll_delay_ms = parse_u64("HARVEST_SCROLL_DELAY_MS", &value)?;
        }

        if let Some(value) = env_var("HARVEST_MAX_CYCLES") {
            config.max_cycles = Some(parse_u32("HARVEST_MAX_CYCLES", &value)?);
        }

        if let Some(value) = env_var("HARVEST_OUTPUT") {
            config.output_path = PathBuf::from(value);
        }

        if let Some(value) = env_var("HARVEST_VERBOSE") {
            let parsed = parse_u8("HARVEST_VERBOSE", &value)?;
            config.verbose = Verbosity::from_u8(parsed).ok_or_else(|| {
                HarvestConfigError::invalid_enum("HARVEST_VERBOSE", parsed.to_string())
            })?;
        }

        if let Some(value) = env_var("HARVEST_HEADLESS") {
            config.headless = parse_bool("HARVEST_HEADLESS", &value)?;
        }

        if let Some(value) = env_var("HARVEST_CDP_URL") {
            config.cdp_url = Some(value);
        }

        if let Some(value) = env_var("HARVEST_CHROME_BIN") {
            config.chrome_executable = Some(PathBuf::from(value));
        }

        if let Some(value) = env_var("HARVEST_USER_DATA_DIR") {
            config.user_data_dir = Some(PathBuf::from(value));
        }

        Ok(config)
    }

    /// Scroll delay as a [`Duration`].
    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    /// Create a new configuration with explicit field overrides applied.
    pub fn with_overrides(&self, overrides: HarvestConfigOverrides) -> HarvestConfig {
        let mut next = self.clone();

        if let Some(value) = overrides.comment_selector {
            next.comment_selector = value;
        }
        if let Some(value) = overrides.scroll_delay_ms {
            next.scroll_delay_ms = value;
        }
        if let Some(value) = overrides.max_cycles {
            next.max_cycles = value;
        }
        if let Some(value) = overrides.output_path {
            next.output_path = value;
        }
        if let Some(value) = overrides.verbose {
            next.verbose = value;
        }
        if let Some(value) = overrides.headless {
            next.headless = value;
        }
        if let Some(value) = overrides.cdp_url {
            next.cdp_url = value;
        }
        if let Some(value) = overrides.chrome_executable {
            next.chrome_executable = value;
        }
        if let Some(value) = overrides.user_data_dir {
            next.user_data_dir = value;
        }

        next
    }
}

/// Field-level overrides for [`HarvestConfig::with_overrides`].
///
/// Outer `None` leaves the field untouched; `Some(None)` on the optional
/// fields clears them.
#[derive(Debug, Default, Clone)]
pub struct HarvestConfigOverrides {
    pub comment_selector: Option<String>,
    pub scroll_delay_ms: Option<u64>,
    pub max_cycles: Option<Option<u32>>,
    pub output_path: Option<PathBuf>,
    pub verbose: Option<Verbosity>,
    pub headless: Option<bool>,
    pub cdp_url: Option<Option<String>>,
    pub chrome_executable: Option<Option<PathBuf>>,
    pub user_data_dir: Option<Option<PathBuf>>,
}

impl HarvestConfigOverrides {
    /// Builder-style helper to set the `comment_selector` override.
    pub fn comment_selector(mut self, selector: impl Into<String>) -> Self {
        self.comment_selector = Some(selector.into());
        self
    }

    /// Builder-style helper to set the `scroll_delay_ms` override.
    pub fn scroll_delay_ms(mut self, delay_ms: u64) -> Self {
        self.scroll_delay_ms = Some(delay_ms);
        self
    }
}

/// Errors that can arise while constructing a [`HarvestConfig`].
#[derive(Debug, Error)]
pub enum HarvestConfigError {
    #[error("invalid value '{value}' for {field}")]
    InvalidEnumVariant { field: &'static str, value: String },
    #[error("invalid boolean '{value}' for {field}")]
    InvalidBool { field: &'static str, value: String },
    #[error("invalid number '{value}' for {field}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl HarvestConfigError {
    fn invalid_enum(field: &'static str, value: String) -> Self {
        HarvestConfigError::InvalidEnumVariant { field, value }
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, HarvestConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HarvestConfigError::InvalidBool {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_u8(field: &'static str, value: &str) -> Result<u8, HarvestConfigError> {
    value
        .trim()
        .parse::<u8>()
        .map_err(|source| HarvestConfigError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, HarvestConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|source| HarvestConfigError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, HarvestConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|source| HarvestConfigError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}
