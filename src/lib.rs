//! chartpress
//!
//! Captures TradingView chart widgets in headless Chrome, composes each
//! symbol's timeframe snapshots into a fixed two-tier sheet, exports the
//! sheet as a PDF, and optionally hands the documents to the system default
//! CUPS printer.
//!
//! The pipeline runs one browser per invocation and one tab per chart. Every
//! page the browser sees is generated locally and navigated to as a file://
//! URL; only the chart widget itself loads from the network.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> chartpress::Result<()> {
//! let config = chartpress::Config::load(Path::new("config.json"))?;
//! let documents = chartpress::pipeline::run(&config)?;
//! for path in documents {
//!     println!("exported {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod capture;
pub mod compose;
pub mod config;
pub mod markup;
pub mod pipeline;
pub mod printer;

// Re-export the types most callers touch at the crate root
pub use config::{Config, PageFormat};
pub use markup::SnapshotSet;
pub use printer::PrintOutcome;
