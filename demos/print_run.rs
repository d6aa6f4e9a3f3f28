//! Minimal end-to-end demo: captures two live charts per symbol and exports
//! one PDF sheet each. Needs Chrome and network access to the widget CDN.

use std::path::PathBuf;

use chartpress::config::{Config, OutputSettings, SymbolSpec, TimeframeSpec};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config {
        symbols: vec![
            SymbolSpec { symbol: "NASDAQ:AAPL".to_string(), name: "Apple".to_string() },
            SymbolSpec { symbol: "SP:SPX".to_string(), name: "SP500".to_string() },
        ],
        timeframes: vec![
            TimeframeSpec { interval: "D".to_string(), label: "1D".to_string() },
            TimeframeSpec { interval: "60".to_string(), label: "1H".to_string() },
        ],
        chart: Default::default(),
        capture: Default::default(),
        pdf: Default::default(),
        output: OutputSettings {
            directory: PathBuf::from("./charts-demo"),
            print: false,
        },
    };
    config.validate()?;

    let documents = chartpress::pipeline::run(&config)?;
    println!("\nExported {} documents:", documents.len());
    for path in documents {
        println!("  {}", path.display());
    }

    Ok(())
}
