//! seq-viz: Analyzer and response-curve visualization for SimpleEQ
//!
//! Produces display geometry only; drawing is left to the host UI:
//! - Spectrum paths from the audio-side sample FIFOs (FFT → log-frequency polyline)
//! - Filter response curve evaluated from the shared coefficient chain
//! - Grid lines, axis labels and knob readouts
//!
//! Everything here runs on the display timer (typically 60 Hz), never on the
//! audio thread.

pub mod common;
pub mod grid;
pub mod producer;
pub mod response;
pub mod spectrum;

pub use common::{DbRange, Path, Point, Rect, jmap, map_from_log10, map_to_log10};
pub use grid::{
    GridLine, Label, analysis_area, format_param_value, param_display_string, render_area,
};
pub use producer::{AnalyzerTaps, PathProducer};
pub use response::{
    ResponseCurve, chain_magnitude, compute_response_curve, fill_response_curve, magnitudes_db,
};
pub use spectrum::PathBuilder;
