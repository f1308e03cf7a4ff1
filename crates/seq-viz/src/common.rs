//! Display geometry shared by every visualization

use seq_core::{MAX_DISPLAY_FREQ, MIN_DISPLAY_FREQ};
use serde::{Deserialize, Serialize};

/// Point in display coordinates (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Shrink by per-edge insets; never goes negative
    pub fn inset(&self, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - right).max(0.0),
            height: (self.height - top - bottom).max(0.0),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }
}

/// Open polyline, reused between frames
#[derive(Debug, Default, PartialEq)]
pub struct Path {
    points: Vec<Point>,
}

impl Clone for Path {
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
        }
    }

    /// Reuses this path's storage when it is large enough
    fn clone_from(&mut self, source: &Self) {
        self.points.clone_from(&source.points);
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Drop all points, keeping the allocation
    #[inline]
    pub fn clear(&mut self) {
        self.points.clear();
    }

    #[inline]
    pub fn line_to(&mut self, x: f64, y: f64) {
        self.points.push(Point { x, y });
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest rectangle containing every point
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in &self.points[1..] {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Decibel window mapped onto a display's vertical extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbRange {
    pub min: f64,
    pub max: f64,
}

impl DbRange {
    /// Fixed −24..+24 dB window of the response display
    pub const DISPLAY: Self = Self {
        min: -24.0,
        max: 24.0,
    };

    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Display-width window whose bottom sits on the analyzer floor
    pub fn biased_by_floor(floor_db: f64) -> Self {
        Self {
            min: floor_db,
            max: floor_db + Self::DISPLAY.span(),
        }
    }

    #[inline]
    pub const fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Clamp into the window; NaN lands on the bottom
    #[inline]
    pub fn clamp(&self, db: f64) -> f64 {
        if db.is_nan() {
            self.min
        } else {
            db.clamp(self.min, self.max)
        }
    }

    /// Y coordinate of `db` inside `bounds`, clamped
    #[inline]
    pub fn to_y(&self, db: f64, bounds: &Rect) -> f64 {
        jmap(self.clamp(db), self.min, self.max, bounds.bottom(), bounds.top())
    }
}

impl Default for DbRange {
    fn default() -> Self {
        Self::DISPLAY
    }
}

/// Linear remap of `value` from one range to another
#[inline]
pub fn jmap(value: f64, src_min: f64, src_max: f64, dst_min: f64, dst_max: f64) -> f64 {
    dst_min + (value - src_min) * (dst_max - dst_min) / (src_max - src_min)
}

/// Normalized 0-1 position → frequency on a log axis
#[inline]
pub fn map_to_log10(t: f64, min: f64, max: f64) -> f64 {
    let log_min = min.log10();
    let log_max = max.log10();
    10.0_f64.powf(log_min + t * (log_max - log_min))
}

/// Frequency → normalized 0-1 position on a log axis
#[inline]
pub fn map_from_log10(freq: f64, min: f64, max: f64) -> f64 {
    let log_min = min.log10();
    let log_max = max.log10();
    (freq.log10() - log_min) / (log_max - log_min)
}

/// X coordinate of `freq` on the 20 Hz–20 kHz axis of `bounds`
#[inline]
pub fn frequency_to_x(freq: f64, bounds: &Rect) -> f64 {
    bounds.left() + bounds.width * map_from_log10(freq, MIN_DISPLAY_FREQ, MAX_DISPLAY_FREQ)
}
