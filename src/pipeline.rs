//! Pipeline orchestration: walks symbols x timeframes, capture through print

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};
use log::{info, warn};
use tempfile::TempDir;

use crate::capture::ChartCapturer;
use crate::compose::DocumentComposer;
use crate::config::{CaptureSettings, Config};
use crate::markup::SnapshotSet;
use crate::printer::{self, PrintOutcome};
use crate::{Error, Result};

/// Run-wide state threaded through the stages: the single browser instance,
/// the scratch directory holding generated pages, and the documents produced
/// so far.
struct RunContext {
    browser: Browser,
    pages_dir: TempDir,
    produced: Vec<PathBuf>,
}

impl RunContext {
    fn new(config: &Config) -> Result<Self> {
        let pages_dir = TempDir::new().map_err(|e| {
            Error::InitializationError(format!("Failed to create scratch directory: {}", e))
        })?;
        let browser = launch_browser(&config.capture)?;
        Ok(Self { browser, pages_dir, produced: Vec::new() })
    }

    /// Tear down the browser and scratch pages, keeping the produced documents
    fn finish(self) -> Vec<PathBuf> {
        self.produced
    }
}

/// Execute the full capture, compose, and export pipeline described by
/// `config`, returning the paths of the produced documents.
///
/// Symbols and timeframes are processed strictly sequentially and the first
/// capture or export failure aborts the run. Documents exported before the
/// failure stay on disk.
pub fn run(config: &Config) -> Result<Vec<PathBuf>> {
    let out_dir = &config.output.directory;
    fs::create_dir_all(out_dir).map_err(|e| {
        Error::ExportError(format!("Cannot create output directory {}: {}", out_dir.display(), e))
    })?;

    let mut ctx = RunContext::new(config)?;
    let capturer =
        ChartCapturer::new(&ctx.browser, &config.chart, &config.capture, ctx.pages_dir.path());
    let composer = DocumentComposer::new(&ctx.browser, &config.pdf, ctx.pages_dir.path());
    let labels = config.labels();
    info!(
        "capturing {} symbols x {} timeframes into {}",
        config.symbols.len(),
        config.timeframes.len(),
        out_dir.display()
    );

    for spec in &config.symbols {
        println!("Capturing {}...", spec.name);

        let mut snapshots = SnapshotSet::new();
        for tf in &config.timeframes {
            println!("  {}...", tf.label);
            let png = capturer.capture(&spec.symbol, &tf.interval, &tf.label)?;
            snapshots.insert(tf.label.clone(), png);
        }

        let path = composer.export(&spec.name, &labels, &snapshots, out_dir)?;
        println!("  -> Saved {}", path.display());
        ctx.produced.push(path);
    }

    // Browser teardown before any print job is dispatched
    let produced = ctx.finish();

    if !config.output.print {
        println!("\nPDFs saved in {}", out_dir.display());
        return Ok(produced);
    }

    match printer::print_documents(&produced) {
        Ok(PrintOutcome::Submitted(_)) => println!("All charts sent to printer!"),
        Ok(PrintOutcome::NoDefaultPrinter) => {
            println!("\nNo default printer. PDFs saved in {}", out_dir.display());
        }
        Err(e) => {
            warn!("print dispatch failed: {}", e);
            println!("\nPDFs saved in {}", out_dir.display());
        }
    }

    Ok(produced)
}

/// Launch one headless browser sized for chart capture.
///
/// The watchdog timeout has to outlast a full page-load wait plus the settle
/// delay, during which a quiet tab produces no protocol traffic at all.
fn launch_browser(capture: &CaptureSettings) -> Result<Browser> {
    let scale_arg =
        OsString::from(format!("--force-device-scale-factor={}", capture.device_scale_factor));
    let idle = Duration::from_millis(
        capture.page_load_timeout_ms
            + capture.iframe_timeout_ms
            + capture.chart_load_wait_ms
            + 30_000,
    );

    let launch_options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .window_size(Some((capture.viewport_width, capture.viewport_height)))
        .args(vec![scale_arg.as_os_str(), OsStr::new("--hide-scrollbars")])
        .idle_browser_timeout(idle)
        .build()
        .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

    Browser::new(launch_options)
        .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))
}
