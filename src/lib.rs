//! Scroll-driven comment harvester for lazily rendered video pages.
//!
//! The crate drives a live Chromium page over CDP: it repeatedly scrolls to
//! the bottom of the currently known content, waits a fixed delay for lazy
//! rendering, and re-scans every rendered comment node. Collection stops when
//! two consecutive readings of the page's scrollable extent are equal, and
//! the final snapshot is written out as newline-joined UTF-8 text.
//!
//! The collection loop itself is browser-agnostic: it talks to the page
//! through the [`page::HarvestPage`] trait, so tests can script extent
//! sequences without a browsing engine while the `harvest` binary plugs in
//! the chromiumoxide-backed [`runtime::ChromiumRuntime`].

pub mod browser;
pub mod collector;
pub mod config;
pub mod exporter;
pub mod logging;
pub mod page;
pub mod runtime;

pub use collector::{CollectorSettings, Harvest, IncrementalCollector};
pub use config::HarvestConfig;
pub use exporter::TextExporter;
pub use page::HarvestPage;
