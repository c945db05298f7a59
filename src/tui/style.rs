//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

use crate::sim::switch::PowerSource;

pub const SOC_COLOR: Color = Color::Cyan;
pub const SOLAR_COLOR: Color = Color::Yellow;
pub const LOAD_COLOR: Color = Color::Magenta;
/// Threshold guide lines.
pub const THRESHOLD_COLOR: Color = Color::DarkGray;
/// SOC gauge color when high (>= 50%).
pub const SOC_HIGH: Color = Color::Green;
/// SOC gauge color when medium (>= 20%).
pub const SOC_MID: Color = Color::Yellow;
/// SOC gauge color when low (< 20%).
pub const SOC_LOW: Color = Color::Red;
pub const HEADER_FG: Color = Color::White;
pub const HEADER_BG: Color = Color::DarkGray;
pub const FOOTER_FG: Color = Color::DarkGray;

/// Returns a color based on the battery state of charge in percent.
pub fn soc_color(soc_pct: f64) -> Color {
    if soc_pct >= 50.0 {
        SOC_HIGH
    } else if soc_pct >= 20.0 {
        SOC_MID
    } else {
        SOC_LOW
    }
}

pub fn source_color(source: PowerSource) -> Color {
    match source {
        PowerSource::Inverter => Color::Green,
        PowerSource::Mains => Color::Blue,
    }
}

/// Computes Y-axis bounds over several series with 10% padding.
///
/// The lower bound never goes below `floor`.
pub fn auto_bounds_y(series: &[&[(f64, f64)]], floor: f64) -> [f64; 2] {
    let all = series.iter().flat_map(|s| s.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [floor, floor + 1.0];
    }
    let range = (max - min).max(1.0);
    let pad = range * 0.1;
    [(min - pad).max(floor), max + pad]
}
