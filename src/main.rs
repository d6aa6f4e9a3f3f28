use std::path::PathBuf;

use clap::Parser;

use chartpress::config::Config;
use chartpress::pipeline;

/// Capture chart widgets headlessly and press them into printable PDF sheets.
#[derive(Parser, Debug)]
#[command(
    name = "chartpress",
    version,
    about = "Captures TradingView charts and composes them into printable PDFs"
)]
struct Args {
    /// Path to the JSON run configuration
    #[arg(default_value = "config.json")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    pipeline::run(&config)?;
    Ok(())
}
