//! Incremental scroll collection with a stability-based termination test.
//!
//! Each cycle scrolls to the bottom of the currently known content, sleeps a
//! fixed delay so lazy rendering can catch up, re-reads the content extent,
//! and replaces the held snapshot with a fresh full scan. The loop exits when
//! two consecutive extent readings are equal. The delay is a heuristic, not a
//! completion signal: a page that renders slower than the delay yields a
//! truncated (still successful) result.

use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;

use crate::config::HarvestConfig;
use crate::logging::HarvestLogger;
use crate::page::{HarvestPage, PageError};

/// Knobs for a collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    /// CSS selector for comment text nodes.
    pub selector: String,
    /// Wait between a scroll request and the follow-up rescan.
    pub scroll_delay: Duration,
    /// Optional cycle bound guarding pages whose extent never stabilises.
    /// `None` runs until stability, however long that takes.
    pub max_cycles: Option<u32>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            selector: crate::config::DEFAULT_COMMENT_SELECTOR.to_string(),
            scroll_delay: Duration::from_millis(crate::config::DEFAULT_SCROLL_DELAY_MS),
            max_cycles: None,
        }
    }
}

impl From<&HarvestConfig> for CollectorSettings {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            selector: config.comment_selector.clone(),
            scroll_delay: config.scroll_delay(),
            max_cycles: config.max_cycles,
        }
    }
}

/// Outcome of a collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct Harvest {
    /// Final full scan, in document traversal order. Earlier scans are
    /// replaced wholesale each cycle; only this snapshot survives.
    pub comments: Vec<String>,
    /// Number of scroll+wait+rescan cycles performed.
    pub cycles: u32,
    /// Last observed content extent.
    pub final_extent: f64,
}

/// Drives progressive content disclosure and decides when to stop.
pub struct IncrementalCollector<'a, P: HarvestPage> {
    page: &'a P,
    settings: CollectorSettings,
    logger: &'a HarvestLogger,
}

impl<'a, P: HarvestPage> IncrementalCollector<'a, P> {
    pub fn new(page: &'a P, settings: CollectorSettings, logger: &'a HarvestLogger) -> Self {
        Self {
            page,
            settings,
            logger,
        }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Scroll, wait, and rescan until the content extent stops growing, then
    /// return the last full scan.
    ///
    /// A page whose extent never changes (zero comments, comments disabled)
    /// completes on the first comparison with an empty or initial-scan
    /// result. The snapshot is replaced in full every cycle; nothing is
    /// merged across cycles.
    pub async fn collect(&self) -> Result<Harvest, PageError> {
        let mut last_extent = 0.0;
        let mut current_extent = self.page.content_extent().await?;
        let mut comments: Vec<String> = Vec::new();
        let mut cycles = 0u32;

        // Exact equality on the extent as the page reports it: equality of
        // two consecutive readings is the sole termination signal.
        while last_extent != current_extent {
            if let Some(bound) = self.settings.max_cycles {
                if cycles >= bound {
                    self.logger.info(
                        format!("stopping after {cycles} cycles without a stable extent"),
                        Some("collect"),
                        Some(json!({ "extent": current_extent })),
                    );
                    break;
                }
            }

            last_extent = current_extent;
            self.page.scroll_to(current_extent).await?;
            sleep(self.settings.scroll_delay).await;

            current_extent = self.page.content_extent().await?;
            comments = self.page.comment_texts(&self.settings.selector).await?;
            cycles += 1;

            self.logger.info(
                format!("Loaded {} comments", comments.len()),
                Some("collect"),
                None,
            );
        }

        Ok(Harvest {
            comments,
            cycles,
            final_extent: current_extent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Verbosity;
    use crate::logging::{LogCallback, LogConfig};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Page whose extent readings and scans follow a script. The last entry
    /// of each script repeats once the script is exhausted, mimicking a page
    /// that has settled.
    struct ScriptedPage {
        extents: Mutex<VecDeque<f64>>,
        settled_extent: Mutex<f64>,
        scans: Mutex<VecDeque<Vec<String>>>,
        settled_scan: Mutex<Vec<String>>,
        scrolls: Mutex<Vec<f64>>,
        selectors: Mutex<Vec<String>>,
    }

    impl ScriptedPage {
        fn new(extents: &[f64], scans: &[&[&str]]) -> Self {
            let settled_extent = *extents.last().expect("extent script must not be empty");
            let settled_scan: Vec<String> = scans
                .last()
                .map(|scan| scan.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default();
            Self {
                extents: Mutex::new(extents.iter().copied().collect()),
                settled_extent: Mutex::new(settled_extent),
                scans: Mutex::new(
                    scans
                        .iter()
                        .map(|scan| scan.iter().map(|s| s.to_string()).collect())
                        .collect(),
                ),
                settled_scan: Mutex::new(settled_scan),
                scrolls: Mutex::new(Vec::new()),
                selectors: Mutex::new(Vec::new()),
            }
        }

        fn scrolls(&self) -> Vec<f64> {
            self.scrolls.lock().unwrap().clone()
        }

        fn selectors(&self) -> Vec<String> {
            self.selectors.lock().unwrap().clone()
        }
    }

    /// Page whose extent grows forever, for exercising the cycle bound.
    struct BottomlessPage {
        extent: Mutex<f64>,
    }

    #[async_trait]
    impl HarvestPage for ScriptedPage {
        async fn content_extent(&self) -> Result<f64, PageError> {
            let mut extents = self.extents.lock().unwrap();
            Ok(extents
                .pop_front()
                .unwrap_or(*self.settled_extent.lock().unwrap()))
        }

        async fn scroll_to(&self, extent: f64) -> Result<(), PageError> {
            self.scrolls.lock().unwrap().push(extent);
            Ok(())
        }

        async fn comment_texts(&self, selector: &str) -> Result<Vec<String>, PageError> {
            self.selectors.lock().unwrap().push(selector.to_string());
            let mut scans = self.scans.lock().unwrap();
            Ok(scans
                .pop_front()
                .unwrap_or_else(|| self.settled_scan.lock().unwrap().clone()))
        }
    }

    #[async_trait]
    impl HarvestPage for BottomlessPage {
        async fn content_extent(&self) -> Result<f64, PageError> {
            let mut extent = self.extent.lock().unwrap();
            *extent += 100.0;
            Ok(*extent)
        }

        async fn scroll_to(&self, _extent: f64) -> Result<(), PageError> {
            Ok(())
        }

        async fn comment_texts(&self, _selector: &str) -> Result<Vec<String>, PageError> {
            Ok(vec!["again".to_string()])
        }
    }

    fn quiet_logger() -> HarvestLogger {
        let sink: LogCallback = Arc::new(|_record| {});
        let mut config = LogConfig::new(Verbosity::Detailed);
        config.external_logger = Some(sink);
        HarvestLogger::with_config(config)
    }

    fn fast_settings() -> CollectorSettings {
        CollectorSettings {
            selector: "#content-text".to_string(),
            scroll_delay: Duration::ZERO,
            max_cycles: None,
        }
    }

    #[test]
    fn default_settings_use_two_second_delay() {
        let settings = CollectorSettings::default();
        assert_eq!(settings.scroll_delay, Duration::from_millis(2_000));
        assert_eq!(settings.selector, "#content-text");
        assert!(settings.max_cycles.is_none());
    }

    #[tokio::test]
    async fn stable_extent_returns_after_first_comparison() {
        let page = ScriptedPage::new(&[100.0, 100.0], &[&["a", "b"]]);
        let logger = quiet_logger();
        let collector = IncrementalCollector::new(&page, fast_settings(), &logger);

        let harvest = collector.collect().await.expect("collect succeeds");
        assert_eq!(harvest.comments, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(harvest.cycles, 1);
        assert_eq!(harvest.final_extent, 100.0);
        // A single scroll request, to the only extent ever observed.
        assert_eq!(page.scrolls(), vec![100.0]);
    }

    #[tokio::test]
    async fn growing_extent_runs_exactly_two_cycles() {
        let page = ScriptedPage::new(&[100.0, 250.0, 250.0], &[&["a"], &["a", "b", "c"]]);
        let logger = quiet_logger();
        let collector = IncrementalCollector::new(&page, fast_settings(), &logger);

        let harvest = collector.collect().await.expect("collect succeeds");
        assert_eq!(harvest.cycles, 2);
        assert_eq!(harvest.final_extent, 250.0);
        // The scan taken at extent 250 replaces the earlier one wholesale.
        assert_eq!(
            harvest.comments,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(page.scrolls(), vec![100.0, 250.0]);
    }

    #[tokio::test]
    async fn result_preserves_final_scan_order() {
        let page = ScriptedPage::new(&[100.0, 100.0], &[&["a", "b", "a"]]);
        let logger = quiet_logger();
        let collector = IncrementalCollector::new(&page, fast_settings(), &logger);

        let harvest = collector.collect().await.expect("collect succeeds");
        // Never reordered, never deduplicated.
        assert_eq!(
            harvest.comments,
            vec!["a".to_string(), "b".to_string(), "a".to_string()]
        );
    }

    #[tokio::test]
    async fn collect_is_idempotent_against_a_stable_page() {
        let page = ScriptedPage::new(&[250.0], &[&["x", "y"]]);
        let logger = quiet_logger();
        let collector = IncrementalCollector::new(&page, fast_settings(), &logger);

        let first = collector.collect().await.expect("first collect");
        let second = collector.collect().await.expect("second collect");
        assert_eq!(first.comments, second.comments);
        assert_eq!(second.final_extent, 250.0);
    }

    #[tokio::test]
    async fn zero_comment_nodes_is_success_not_error() {
        let page = ScriptedPage::new(&[100.0, 100.0], &[&[]]);
        let logger = quiet_logger();
        let collector = IncrementalCollector::new(&page, fast_settings(), &logger);

        let harvest = collector.collect().await.expect("collect succeeds");
        assert!(harvest.comments.is_empty());
        assert_eq!(harvest.cycles, 1);
    }

    #[tokio::test]
    async fn selector_is_passed_through_to_the_page() {
        let page = ScriptedPage::new(&[100.0, 100.0], &[&["a"]]);
        let logger = quiet_logger();
        let settings = CollectorSettings {
            selector: ".custom-comment".to_string(),
            ..fast_settings()
        };
        let collector = IncrementalCollector::new(&page, settings, &logger);

        collector.collect().await.expect("collect succeeds");
        assert_eq!(page.selectors(), vec![".custom-comment".to_string()]);
    }

    #[tokio::test]
    async fn cycle_bound_stops_a_page_that_never_settles() {
        let page = BottomlessPage {
            extent: Mutex::new(0.0),
        };
        let logger = quiet_logger();
        let settings = CollectorSettings {
            max_cycles: Some(3),
            ..fast_settings()
        };
        let collector = IncrementalCollector::new(&page, settings, &logger);

        let harvest = collector.collect().await.expect("collect succeeds");
        assert_eq!(harvest.cycles, 3);
        assert_eq!(harvest.comments, vec!["again".to_string()]);
    }

    #[tokio::test]
    async fn progress_is_reported_after_each_cycle() {
        let records = Arc::new(Mutex::new(Vec::new()));
        let capture = Arc::clone(&records);
        let sink: LogCallback = Arc::new(move |record| {
            capture.lock().unwrap().push(record.message.clone());
        });
        let mut config = LogConfig::new(Verbosity::Detailed);
        config.external_logger = Some(sink);
        let logger = HarvestLogger::with_config(config);

        let page = ScriptedPage::new(&[100.0, 250.0, 250.0], &[&["a"], &["a", "b"]]);
        let collector = IncrementalCollector::new(&page, fast_settings(), &logger);
        collector.collect().await.expect("collect succeeds");

        let messages = records.lock().unwrap();
        assert_eq!(
            *messages,
            vec![
                "Loaded 1 comments".to_string(),
                "Loaded 2 comments".to_string()
            ]
        );
    }
}
