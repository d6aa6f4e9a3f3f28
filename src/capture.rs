//! Chart capture stage: drives one browser tab per (symbol, timeframe) pair

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::Browser;
use log::{debug, warn};
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::{CaptureSettings, ChartSettings};
use crate::markup;
use crate::{Error, Result};

/// Captures snapshots of individual chart widgets.
///
/// Each capture opens its own tab so widget state cannot leak between
/// charts; the tab is closed again as soon as the snapshot is extracted.
pub struct ChartCapturer<'a> {
    browser: &'a Browser,
    chart: &'a ChartSettings,
    capture: &'a CaptureSettings,
    pages_dir: &'a Path,
}

impl<'a> ChartCapturer<'a> {
    pub fn new(
        browser: &'a Browser,
        chart: &'a ChartSettings,
        capture: &'a CaptureSettings,
        pages_dir: &'a Path,
    ) -> Self {
        Self { browser, chart, capture, pages_dir }
    }

    /// Produce one PNG snapshot of the widget frame for `symbol` at `interval`.
    ///
    /// The wait sequence is a bounded navigation settle, a bounded wait for
    /// the widget's iframe, then the unconditional `chart_load_wait_ms`
    /// sleep that gives the widget time to draw its studies.
    pub fn capture(&self, symbol: &str, interval: &str, label: &str) -> Result<Vec<u8>> {
        let html = markup::chart_page(symbol, interval, self.chart);
        let file_name = format!("chart-{}-{}.html", sanitize(symbol), sanitize(label));
        let url = stage_page(self.pages_dir, &file_name, &html)
            .map_err(|e| Error::RenderError(format!("Failed to stage chart page: {}", e)))?;

        let tab = self
            .browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(self.capture.page_load_timeout_ms));

        let loaded = tab.navigate_to(url.as_str()).and_then(|t| t.wait_until_navigated());
        if let Err(e) = loaded {
            warn!("navigation for {} @ {} did not settle: {}", symbol, label, e);
            close_tab(&tab);
            return Err(Error::LoadTimeout(self.capture.page_load_timeout_ms));
        }

        let frame = match tab.wait_for_element_with_custom_timeout(
            "iframe",
            Duration::from_millis(self.capture.iframe_timeout_ms),
        ) {
            Ok(element) => element,
            Err(e) => {
                warn!("widget frame for {} @ {} never appeared: {}", symbol, label, e);
                close_tab(&tab);
                return Err(Error::WidgetNotReady(self.capture.iframe_timeout_ms));
            }
        };

        // Heuristic settle: the widget has no "done drawing" signal
        std::thread::sleep(Duration::from_millis(self.capture.chart_load_wait_ms));

        let shot = frame.capture_screenshot(Page::CaptureScreenshotFormatOption::Png);
        close_tab(&tab);
        let png = shot.map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)))?;

        debug!("captured {} @ {}: {} bytes, sha256 {}", symbol, label, png.len(), fingerprint(&png));
        Ok(png)
    }
}

/// Write a generated page into the scratch directory and hand back the
/// file:// URL the browser navigates to
pub(crate) fn stage_page(dir: &Path, file_name: &str, html: &str) -> io::Result<Url> {
    let path = dir.join(file_name);
    fs::write(&path, html)?;
    Url::from_file_path(&path)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "page path is not absolute"))
}

/// Reduce an arbitrary config string to a filesystem-safe page name
pub(crate) fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Close a tab, downgrading failures to a warning; a leaked tab costs
/// memory until browser teardown but cannot corrupt any output
pub(crate) fn close_tab(tab: &Tab) {
    if let Err(e) = tab.close(false) {
        warn!("Failed to close tab: {}", e);
    }
}

fn fingerprint(png: &[u8]) -> String {
    let digest = Sha256::digest(png);
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize("NASDAQ:AAPL"), "NASDAQ_AAPL");
        assert_eq!(sanitize("15m"), "15m");
        assert_eq!(sanitize("../escape"), "___escape");
        assert_eq!(sanitize("spot-usd_1"), "spot-usd_1");
    }

    #[test]
    fn test_stage_page_writes_file_and_builds_url() {
        let dir = tempfile::tempdir().unwrap();
        let url = stage_page(dir.path(), "page.html", "<html></html>").unwrap();
        assert_eq!(url.scheme(), "file");
        let staged = dir.path().join("page.html");
        assert_eq!(std::fs::read_to_string(staged).unwrap(), "<html></html>");
    }

    #[test]
    fn test_fingerprint_is_short_hex() {
        let print = fingerprint(b"png bytes");
        assert_eq!(print.len(), 12);
        assert!(print.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
