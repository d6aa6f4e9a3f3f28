//! Best-effort print dispatch through the CUPS command-line tools
//!
//! Printing never fails the run: discovery and submission problems surface
//! as `PrintUnavailable` and the pipeline folds them into a warning.

use std::path::PathBuf;
use std::process::Command;

use log::debug;

use crate::{Error, Result};

/// What happened when the produced documents were offered to the printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    /// Every document was submitted as a print job
    Submitted(usize),
    /// No default destination is configured; nothing was submitted
    NoDefaultPrinter,
}

/// Submit each document to the system default printer, landscape and scaled
/// to the page.
///
/// Stops at the first rejected job; CUPS keeps earlier jobs queued.
pub fn print_documents(paths: &[PathBuf]) -> Result<PrintOutcome> {
    let destination = match default_destination()? {
        Some(name) => name,
        None => return Ok(PrintOutcome::NoDefaultPrinter),
    };
    debug!("default print destination: {}", destination);

    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        println!("Printing {}...", file_name);

        let output = Command::new("lp")
            .arg("-o")
            .arg("landscape")
            .arg("-o")
            .arg("fit-to-page")
            .arg(path)
            .output()
            .map_err(|e| Error::PrintUnavailable(format!("failed to run lp: {}", e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::PrintUnavailable(format!(
                "lp rejected {}: {}",
                file_name,
                stderr.trim()
            )));
        }
    }

    Ok(PrintOutcome::Submitted(paths.len()))
}

/// Ask CUPS for the default destination. `Ok(None)` means CUPS answered and
/// no default is configured.
fn default_destination() -> Result<Option<String>> {
    let output = Command::new("lpstat")
        .arg("-d")
        .output()
        .map_err(|e| Error::PrintUnavailable(format!("failed to run lpstat: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::PrintUnavailable(format!("lpstat failed: {}", stderr.trim())));
    }
    Ok(parse_default_destination(&String::from_utf8_lossy(&output.stdout)))
}

/// Extract the destination name from `lpstat -d` output.
///
/// CUPS prints either `system default destination: NAME` or a sentence
/// containing `no system default destination`. Anything else is treated as
/// "no destination" rather than guessed at.
fn parse_default_destination(stdout: &str) -> Option<String> {
    let line = stdout.lines().find(|l| l.contains("default destination"))?;
    if line.contains("no system default") {
        return None;
    }
    let name = line.rsplit(':').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
