//! Markup builders for the chart host page and the composed print sheet
//!
//! Everything in this module is a pure string transformation. The capture
//! and compose stages hand these documents to the browser, but nothing here
//! touches the filesystem or the network.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;

use crate::config::{ChartSettings, PdfSettings};
use crate::{Error, Result};

/// Snapshot bytes for one symbol, keyed by timeframe label
pub type SnapshotSet = HashMap<String, Vec<u8>>;

/// Build the host page for a single chart widget.
///
/// The page is a full-viewport container plus the vendor loader script. The
/// widget constructor options go through `serde_json`, so ticker strings and
/// study identifiers cannot break out of the inline script.
pub fn chart_page(symbol: &str, interval: &str, chart: &ChartSettings) -> String {
    let options = json!({
        "container_id": "chart-host",
        "autosize": true,
        "symbol": symbol,
        "interval": interval,
        "timezone": chart.timezone,
        "theme": chart.theme,
        "style": chart.style,
        "locale": chart.locale,
        "toolbar_bg": "#f1f3f6",
        "enable_publishing": false,
        "hide_side_toolbar": true,
        "hide_top_toolbar": false,
        "withdateranges": true,
        "allow_symbol_change": false,
        "save_image": false,
        "studies": chart.studies,
        "show_popup_button": false,
    });
    // A "</script>" inside a ticker would otherwise terminate the inline
    // block early; "<\/" is an equivalent escape in both JSON and JS
    let options = options.to_string().replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  * {{ margin: 0; padding: 0; }}
  body {{ background: #fff; overflow: hidden; }}
  #chart-host {{ width: 100vw; height: 100vh; }}
</style>
</head>
<body>
<div id="chart-host"></div>
<script src="{src}"></script>
<script>
new TradingView.widget({options});
</script>
</body>
</html>"#,
        src = escape_attr(&chart.widget_src),
        options = options,
    )
}

/// Assemble one symbol's snapshots into the printable sheet.
///
/// The first label's image fills the top region and is scaled without
/// cropping; every remaining label gets an equal-width column in the bottom
/// row, stretched to fill its cell. All spacing is expressed in millimetres
/// so the sheet maps 1:1 onto the physical page.
pub fn compose_page(labels: &[String], snapshots: &SnapshotSet, pdf: &PdfSettings) -> Result<String> {
    let top_label = labels
        .first()
        .ok_or_else(|| Error::LayoutError("no timeframes to lay out".to_string()))?;
    for label in labels {
        if !snapshots.contains_key(label) {
            return Err(Error::LayoutError(format!("no snapshot for timeframe '{}'", label)));
        }
    }

    let (page_w, page_h) = pdf.format.oriented_mm(pdf.landscape);

    let columns = labels[1..]
        .iter()
        .map(|label| {
            format!(
                "    <div class=\"secondary-chart\"><img src=\"{}\" alt=\"{}\"></div>",
                data_uri(&snapshots[label]),
                escape_attr(label),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  @page {{ size: {page_w}mm {page_h}mm; margin: 0; }}
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  html, body {{ width: {page_w}mm; height: {page_h}mm; overflow: hidden; background: #fff; font-family: Arial, sans-serif; }}
  .sheet {{ width: 100%; height: 100%; display: flex; flex-direction: column; padding: {padding}mm; gap: {gap}mm; }}
  .primary {{ flex: {top_flex}; width: 100%; overflow: hidden; border: 1px solid #ddd; border-radius: 2px; }}
  .primary img {{ width: 100%; height: 100%; object-fit: contain; display: block; }}
  .secondary {{ flex: {bottom_flex}; width: 100%; display: flex; gap: {gap}mm; }}
  .secondary-chart {{ flex: 1; overflow: hidden; border: 1px solid #ddd; border-radius: 2px; }}
  .secondary-chart img {{ width: 100%; height: 100%; object-fit: fill; display: block; }}
</style>
</head>
<body>
<div class="sheet">
  <div class="primary"><img src="{top_src}" alt="{top_alt}"></div>
  <div class="secondary">
{columns}
  </div>
</div>
</body>
</html>"#,
        page_w = page_w,
        page_h = page_h,
        padding = pdf.padding_mm,
        gap = pdf.gap_mm,
        top_flex = pdf.top_chart_flex,
        bottom_flex = pdf.bottom_chart_flex,
        top_src = data_uri(&snapshots[top_label]),
        top_alt = escape_attr(top_label),
        columns = columns,
    ))
}

fn data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
