//! Composition and export stage: renders one symbol's snapshot set to a PDF

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::Browser;
use log::debug;

use crate::capture::{close_tab, sanitize, stage_page};
use crate::config::PdfSettings;
use crate::markup::{self, SnapshotSet};
use crate::{Error, Result};

/// Hold time for the embedded snapshot images to decode before the sheet is
/// committed to paper
const IMAGE_DECODE_SETTLE: Duration = Duration::from_millis(1000);

/// Lays out captured snapshots on a print sheet and exports it.
pub struct DocumentComposer<'a> {
    browser: &'a Browser,
    pdf: &'a PdfSettings,
    pages_dir: &'a Path,
}

impl<'a> DocumentComposer<'a> {
    pub fn new(browser: &'a Browser, pdf: &'a PdfSettings, pages_dir: &'a Path) -> Self {
        Self { browser, pdf, pages_dir }
    }

    /// Compose `snapshots` into a sheet and export it as `{out_dir}/{name}.pdf`.
    ///
    /// The document goes through a `.part` sibling and is renamed into place,
    /// so an interrupted export cannot leave a truncated PDF behind.
    pub fn export(
        &self,
        name: &str,
        labels: &[String],
        snapshots: &SnapshotSet,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let sheet = markup::compose_page(labels, snapshots, self.pdf)?;
        let file_name = format!("sheet-{}.html", sanitize(name));
        let url = stage_page(self.pages_dir, &file_name, &sheet)
            .map_err(|e| Error::ExportError(format!("Failed to stage composed sheet: {}", e)))?;

        let tab = self
            .browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        let loaded = tab.navigate_to(url.as_str()).and_then(|t| t.wait_until_navigated());
        if let Err(e) = loaded {
            close_tab(&tab);
            return Err(Error::ExportError(format!("Composed sheet failed to load: {}", e)));
        }

        // Data-URI images decode asynchronously after the load event
        std::thread::sleep(IMAGE_DECODE_SETTLE);

        let rendered = tab.print_to_pdf(Some(pdf_options(self.pdf)));
        close_tab(&tab);
        let bytes =
            rendered.map_err(|e| Error::ExportError(format!("PDF rendering failed: {}", e)))?;

        let out_path = out_dir.join(format!("{}.pdf", name));
        write_document(&out_path, &bytes)?;
        debug!("exported {}: {} bytes", out_path.display(), bytes.len());
        Ok(out_path)
    }
}

/// Print surface parameters: exact paper size, no margins, backgrounds kept
/// so chart borders and theme colors survive
fn pdf_options(pdf: &PdfSettings) -> PrintToPdfOptions {
    let (paper_w, paper_h) = pdf.format.paper_size_in();
    PrintToPdfOptions {
        landscape: Some(pdf.landscape),
        print_background: Some(true),
        paper_width: Some(paper_w),
        paper_height: Some(paper_h),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        ..Default::default()
    }
}

/// Write `bytes` to `path` through a `.part` sibling and an atomic rename
fn write_document(path: &Path, bytes: &[u8]) -> Result<()> {
    let staged = path.with_extension("pdf.part");
    fs::write(&staged, bytes)
        .map_err(|e| Error::ExportError(format!("Failed to write {}: {}", staged.display(), e)))?;
    fs::rename(&staged, path)
        .map_err(|e| Error::ExportError(format!("Failed to finalize {}: {}", path.display(), e)))?;
    Ok(())
}
