//! Analyzer grid, axis labels and knob display strings

use seq_core::{ParamId, Slope};

use crate::common::{DbRange, Point, Rect, frequency_to_x};

/// Vertical grid lines (Hz)
pub const GRID_FREQUENCIES: [f64; 9] = [
    20.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 20000.0,
];

/// Horizontal grid lines (dB)
pub const GRID_GAINS: [f64; 5] = [-24.0, -12.0, 0.0, 12.0, 24.0];

/// Editor bounds → area holding the grid and its labels
pub fn render_area(bounds: Rect) -> Rect {
    bounds.inset(20.0, 12.0, 20.0, 2.0)
}

/// Editor bounds → area the curves and grid lines are mapped into
pub fn analysis_area(bounds: Rect) -> Rect {
    render_area(bounds).inset(0.0, 4.0, 0.0, 4.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub value: f64,
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Centre of the text
    pub anchor: Point,
}

pub fn frequency_lines(area: Rect) -> Vec<GridLine> {
    GRID_FREQUENCIES
        .iter()
        .map(|&freq| {
            let x = frequency_to_x(freq, &area);
            GridLine {
                value: freq,
                from: Point::new(x, area.top()),
                to: Point::new(x, area.bottom()),
            }
        })
        .collect()
}

pub fn gain_lines(area: Rect) -> Vec<GridLine> {
    GRID_GAINS
        .iter()
        .map(|&db| {
            let y = DbRange::DISPLAY.to_y(db, &area);
            GridLine {
                value: db,
                from: Point::new(area.left(), y),
                to: Point::new(area.right(), y),
            }
        })
        .collect()
}

/// "20Hz", "500Hz", "1kHz", "20kHz"
pub fn frequency_label(freq: f64) -> String {
    let (value, k) = if freq > 999.0 {
        (freq / 1000.0, "k")
    } else {
        (freq, "")
    };
    format!("{}{k}Hz", trim_number(value))
}

/// "+12", "0", "-24"
pub fn gain_label(db: f64) -> String {
    let sign = if db > 0.0 { "+" } else { "" };
    format!("{sign}{}", trim_number(db))
}

fn trim_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Frequency labels along the top of the render area
pub fn frequency_labels(bounds: Rect) -> Vec<Label> {
    let render = render_area(bounds);
    let area = analysis_area(bounds);
    GRID_FREQUENCIES
        .iter()
        .map(|&freq| Label {
            text: frequency_label(freq),
            anchor: Point::new(frequency_to_x(freq, &area), render.top()),
        })
        .collect()
}

/// Gain labels in the right margin
pub fn gain_labels(bounds: Rect) -> Vec<Label> {
    let area = analysis_area(bounds);
    let x = area.right() + (bounds.right() - area.right()) * 0.5;
    GRID_GAINS
        .iter()
        .map(|&db| Label {
            text: gain_label(db),
            anchor: Point::new(x, DbRange::DISPLAY.to_y(db, &area)),
        })
        .collect()
}

/// Knob readout: values above 999 shown in thousands with two decimals and
/// a `k` on the unit ("1.50 kHz"), otherwise rounded ("750 Hz").
pub fn format_param_value(value: f64, suffix: &str) -> String {
    let (text, k) = if value > 999.0 {
        (format!("{:.2}", value / 1000.0), "k")
    } else {
        (format!("{:.0}", value), "")
    };
    if suffix.is_empty() {
        text
    } else {
        format!("{text} {k}{suffix}")
    }
}

/// Display string for a control; choices show their name
pub fn param_display_string(id: ParamId, value: f64) -> String {
    match id {
        ParamId::LowCutSlope | ParamId::HighCutSlope => Slope::from_index(value).label().to_string(),
        ParamId::LowCutBypassed | ParamId::PeakBypassed | ParamId::HighCutBypassed => {
            if value > 0.5 { "Bypassed" } else { "Active" }.to_string()
        }
        _ => format_param_value(value, id.suffix()),
    }
}
