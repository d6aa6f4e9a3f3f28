//! Run configuration loaded from a JSON file
//!
//! The file uses camelCase keys. Only `symbols` and `timeframes` are
//! required; every other section falls back to defaults that match a
//! typical desk setup (A4 landscape, two-tier layout, CUPS printing off).

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{de, Deserialize, Deserializer};

use crate::{Error, Result};

const MM_PER_INCH: f64 = 25.4;

/// One instrument to capture, with the display name used for its output file
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolSpec {
    /// Exchange-qualified ticker handed to the chart widget (e.g. "NASDAQ:AAPL")
    pub symbol: String,
    /// Human-readable name; also the file stem of the exported document
    pub name: String,
}

/// One timeframe to capture for every symbol
#[derive(Debug, Clone, Deserialize)]
pub struct TimeframeSpec {
    /// Widget interval code ("D", "60", "15", ...)
    pub interval: String,
    /// Stable label addressing this timeframe's snapshot ("1D", "1H", ...)
    pub label: String,
}

/// Appearance options forwarded to the chart widget
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartSettings {
    /// IANA timezone the widget renders its time axis in
    pub timezone: String,
    /// Widget color theme ("light" or "dark")
    pub theme: String,
    /// Widget chart style code ("1" is candles)
    pub style: String,
    /// Widget locale
    pub locale: String,
    /// Indicator/study identifiers overlaid on every chart
    pub studies: Vec<String>,
    /// URL of the widget loader script. Points at the vendor CDN by default;
    /// overridable for mirrors and offline stubs.
    pub widget_src: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            timezone: "Etc/UTC".to_string(),
            theme: "light".to_string(),
            style: "1".to_string(),
            locale: "en".to_string(),
            studies: Vec::new(),
            widget_src: "https://s3.tradingview.com/tv.js".to_string(),
        }
    }
}

/// Browser viewport and wait budgets for the capture stage
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureSettings {
    /// Viewport width in CSS pixels
    pub viewport_width: u32,
    /// Viewport height in CSS pixels
    pub viewport_height: u32,
    /// Device scale factor; 2.0 doubles the pixel density of every snapshot
    pub device_scale_factor: f64,
    /// Upper bound for the chart page to finish loading, in milliseconds
    pub page_load_timeout_ms: u64,
    /// Upper bound for the widget's iframe to appear, in milliseconds
    pub iframe_timeout_ms: u64,
    /// Fixed settle delay after the iframe appears, in milliseconds. The
    /// widget keeps drawing studies after its frame exists and exposes no
    /// completion signal, so this is a heuristic: too short yields a
    /// partially drawn chart rather than an error.
    pub chart_load_wait_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1600,
            viewport_height: 900,
            device_scale_factor: 2.0,
            page_load_timeout_ms: 60000,
            iframe_timeout_ms: 30000,
            chart_load_wait_ms: 12000,
        }
    }
}

/// Page geometry and layout proportions for the composed document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfSettings {
    /// Physical page format
    pub format: PageFormat,
    /// Whether the page is rotated to landscape
    pub landscape: bool,
    /// Padding around the sheet content, in millimetres
    pub padding_mm: f32,
    /// Gap between layout regions and between bottom columns, in millimetres
    pub gap_mm: f32,
    /// Flex weight of the top (primary) chart region
    pub top_chart_flex: f32,
    /// Flex weight of the bottom (secondary) chart row
    pub bottom_chart_flex: f32,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            landscape: true,
            padding_mm: 5.0,
            gap_mm: 4.0,
            top_chart_flex: 2.0,
            bottom_chart_flex: 1.0,
        }
    }
}

/// Where documents land and whether they are sent to the printer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutputSettings {
    /// Directory the exported documents are written into
    pub directory: PathBuf,
    /// Whether to submit the documents to the system default printer
    pub print: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./charts"),
            print: false,
        }
    }
}

/// Physical page format, named or custom
///
/// Named formats carry their portrait dimensions; landscape orientation is
/// applied separately. Custom sizes are treated the same way.
#[derive(Debug, Clone, PartialEq)]
pub enum PageFormat {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: f32, height_mm: f32 },
}

impl Default for PageFormat {
    fn default() -> Self {
        PageFormat::A4
    }
}

impl PageFormat {
    /// Portrait dimensions in millimetres as (width, height)
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageFormat::A3 => (297.0, 420.0),
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::A5 => (148.0, 210.0),
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::Legal => (215.9, 355.6),
            PageFormat::Tabloid => (279.4, 431.8),
            PageFormat::Custom { width_mm, height_mm } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in millimetres with orientation applied
    pub fn oriented_mm(&self, landscape: bool) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        if landscape {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Portrait paper size in inches, the unit the print surface expects
    pub fn paper_size_in(&self) -> (f64, f64) {
        let (w, h) = self.dimensions_mm();
        (w as f64 / MM_PER_INCH, h as f64 / MM_PER_INCH)
    }
}

impl<'de> Deserialize<'de> for PageFormat {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FormatVisitor;

        impl<'de> de::Visitor<'de> for FormatVisitor {
            type Value = PageFormat;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a page format name like \"A4\" or \"Letter\", or a map like { \"widthMm\": 210, \"heightMm\": 297 }",
                )
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<PageFormat, E>
            where
                E: de::Error,
            {
                match value.to_lowercase().as_str() {
                    "a3" => Ok(PageFormat::A3),
                    "a4" => Ok(PageFormat::A4),
                    "a5" => Ok(PageFormat::A5),
                    "letter" => Ok(PageFormat::Letter),
                    "legal" => Ok(PageFormat::Legal),
                    "tabloid" => Ok(PageFormat::Tabloid),
                    _ => Err(E::custom(format!("unknown page format: '{}'", value))),
                }
            }

            fn visit_map<M>(self, map: M) -> std::result::Result<PageFormat, M::Error>
            where
                M: de::MapAccess<'de>,
            {
                #[derive(Deserialize)]
                #[serde(rename_all = "camelCase")]
                struct CustomFormat {
                    width_mm: f32,
                    height_mm: f32,
                }

                let custom = CustomFormat::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(PageFormat::Custom {
                    width_mm: custom.width_mm,
                    height_mm: custom.height_mm,
                })
            }
        }

        deserializer.deserialize_any(FormatVisitor)
    }
}

/// Complete configuration for one capture run
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Instruments to capture, one output document each
    pub symbols: Vec<SymbolSpec>,
    /// Timeframes captured per symbol; the first one becomes the top chart
    pub timeframes: Vec<TimeframeSpec>,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub pdf: PdfSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.display().to_string()));
        }
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::ConfigInvalid(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Config =
            serde_json::from_str(&raw).map_err(|e| Error::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot act on
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(Error::ConfigInvalid("at least one symbol is required".to_string()));
        }
        if self.timeframes.is_empty() {
            return Err(Error::ConfigInvalid("at least one timeframe is required".to_string()));
        }
        for spec in &self.symbols {
            if spec.symbol.trim().is_empty() || spec.name.trim().is_empty() {
                return Err(Error::ConfigInvalid(
                    "symbol entries need a non-empty symbol and name".to_string(),
                ));
            }
        }
        let mut labels = HashSet::new();
        for tf in &self.timeframes {
            if tf.label.trim().is_empty() {
                return Err(Error::ConfigInvalid("timeframe labels must be non-empty".to_string()));
            }
            if !labels.insert(tf.label.as_str()) {
                return Err(Error::ConfigInvalid(format!(
                    "duplicate timeframe label '{}'",
                    tf.label
                )));
            }
        }
        if self.capture.viewport_width == 0 || self.capture.viewport_height == 0 {
            return Err(Error::ConfigInvalid("viewport dimensions must be positive".to_string()));
        }
        if self.capture.device_scale_factor <= 0.0 {
            return Err(Error::ConfigInvalid("deviceScaleFactor must be positive".to_string()));
        }
        if self.pdf.top_chart_flex <= 0.0 || self.pdf.bottom_chart_flex <= 0.0 {
            return Err(Error::ConfigInvalid("flex weights must be positive".to_string()));
        }
        if self.pdf.padding_mm < 0.0 || self.pdf.gap_mm < 0.0 {
            return Err(Error::ConfigInvalid("paddingMm and gapMm must not be negative".to_string()));
        }
        let (w, h) = self.pdf.format.dimensions_mm();
        if w <= 0.0 || h <= 0.0 {
            return Err(Error::ConfigInvalid("page dimensions must be positive".to_string()));
        }
        Ok(())
    }

    /// Timeframe labels in configured order; index 0 is the top chart
    pub fn labels(&self) -> Vec<String> {
        self.timeframes.iter().map(|tf| tf.label.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_json() -> &'static str {
        r#"{
            "symbols": [{ "symbol": "NASDAQ:AAPL", "name": "Apple" }],
            "timeframes": [{ "interval": "D", "label": "1D" }]
        }"#
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = serde_json::from_str(minimal_json()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.chart.timezone, "Etc/UTC");
        assert_eq!(config.capture.viewport_width, 1600);
        assert_eq!(config.capture.device_scale_factor, 2.0);
        assert_eq!(config.pdf.format, PageFormat::A4);
        assert!(config.pdf.landscape);
        assert_eq!(config.output.directory, PathBuf::from("./charts"));
        assert!(!config.output.print);
    }

    #[test]
    fn test_full_config_parses_camel_case_keys() {
        let json = r#"{
            "symbols": [
                { "symbol": "NASDAQ:AAPL", "name": "Apple" },
                { "symbol": "SP:SPX", "name": "SP500" }
            ],
            "timeframes": [
                { "interval": "D", "label": "1D" },
                { "interval": "60", "label": "1H" },
                { "interval": "15", "label": "15m" }
            ],
            "chart": {
                "timezone": "America/New_York",
                "theme": "dark",
                "style": "1",
                "locale": "en",
                "studies": ["RSI@tv-basicstudies"],
                "widgetSrc": "https://mirror.example/tv.js"
            },
            "capture": {
                "viewportWidth": 1920,
                "viewportHeight": 1080,
                "deviceScaleFactor": 1.5,
                "pageLoadTimeoutMs": 45000,
                "iframeTimeoutMs": 20000,
                "chartLoadWaitMs": 8000
            },
            "pdf": {
                "format": "Letter",
                "landscape": false,
                "paddingMm": 6,
                "gapMm": 3,
                "topChartFlex": 3,
                "bottomChartFlex": 2
            },
            "output": {
                "directory": "./out",
                "print": true
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.timeframes[1].interval, "60");
        assert_eq!(config.chart.studies, vec!["RSI@tv-basicstudies"]);
        assert_eq!(config.chart.widget_src, "https://mirror.example/tv.js");
        assert_eq!(config.capture.viewport_width, 1920);
        assert_eq!(config.capture.chart_load_wait_ms, 8000);
        assert_eq!(config.pdf.format, PageFormat::Letter);
        assert!(!config.pdf.landscape);
        assert_eq!(config.pdf.top_chart_flex, 3.0);
        assert!(config.output.print);
    }

    #[test]
    fn test_page_format_from_name_is_case_insensitive() {
        let a4: PageFormat = serde_json::from_str("\"a4\"").unwrap();
        let tabloid: PageFormat = serde_json::from_str("\"TABLOID\"").unwrap();
        assert_eq!(a4, PageFormat::A4);
        assert_eq!(tabloid, PageFormat::Tabloid);
    }

    #[test]
    fn test_page_format_from_map() {
        let custom: PageFormat =
            serde_json::from_str(r#"{ "widthMm": 100, "heightMm": 150 }"#).unwrap();
        assert_eq!(custom, PageFormat::Custom { width_mm: 100.0, height_mm: 150.0 });
    }

    #[test]
    fn test_page_format_rejects_unknown_name() {
        let result: std::result::Result<PageFormat, _> = serde_json::from_str("\"a0\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_page_format_orientation() {
        assert_eq!(PageFormat::A4.dimensions_mm(), (210.0, 297.0));
        assert_eq!(PageFormat::A4.oriented_mm(true), (297.0, 210.0));
        assert_eq!(PageFormat::A4.oriented_mm(false), (210.0, 297.0));
        assert_eq!(PageFormat::Letter.dimensions_mm(), (215.9, 279.4));
    }

    #[test]
    fn test_page_format_paper_inches() {
        let (w, h) = PageFormat::A4.paper_size_in();
        assert!((w - 8.27).abs() < 0.01);
        assert!((h - 11.69).abs() < 0.01);
    }

    #[test]
    fn test_empty_symbols_rejected() {
        let json = r#"{ "symbols": [], "timeframes": [{ "interval": "D", "label": "1D" }] }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(config.validate(), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn test_duplicate_timeframe_labels_rejected() {
        let json = r#"{
            "symbols": [{ "symbol": "NASDAQ:AAPL", "name": "Apple" }],
            "timeframes": [
                { "interval": "D", "label": "1D" },
                { "interval": "W", "label": "1D" }
            ]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(ref msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_zero_viewport_rejected() {
        let json = r#"{
            "symbols": [{ "symbol": "NASDAQ:AAPL", "name": "Apple" }],
            "timeframes": [{ "interval": "D", "label": "1D" }],
            "capture": { "viewportWidth": 0 }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(matches!(config.validate(), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn test_load_missing_file_is_config_not_found() {
        let path = std::env::temp_dir().join("chartpress-no-such-config.json");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
        assert!(err.to_string().starts_with("Config not found:"));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn test_load_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(minimal_json().as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.symbols[0].name, "Apple");
        assert_eq!(config.labels(), vec!["1D"]);
    }
}
