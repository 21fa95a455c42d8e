//! Focal points for carousel images.
//!
//! A focal point is a pair of percentages used as a CSS `object-position`,
//! biasing which part of an image stays visible when it is cropped to a
//! different aspect ratio. Positions are stored as strings like `"50% 30%"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentage position within an image, each axis in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: u8,
    pub y: u8,
}

/// Bounding box of the element the pointer is over, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Quick-set positions offered next to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Top,
    Center,
    Bottom,
}

impl Default for FocalPoint {
    /// Top center, the position images get before anyone adjusts them.
    fn default() -> Self {
        Self { x: 50, y: 0 }
    }
}

impl From<Preset> for FocalPoint {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Top => Self { x: 50, y: 0 },
            Preset::Center => Self { x: 50, y: 50 },
            Preset::Bottom => Self { x: 50, y: 100 },
        }
    }
}

impl FocalPoint {
    /// Creates a point, clamping each axis to 100.
    pub fn new(x: u8, y: u8) -> Self {
        Self {
            x: x.min(100),
            y: y.min(100),
        }
    }

    /// Converts a pointer position over `rect` into a focal point.
    ///
    /// Each axis is `(pointer - origin) / size * 100`, clamped to `[0, 100]`
    /// and rounded, so dragging past the edge pins the point to that edge.
    /// Returns `None` for an empty or inverted rect.
    pub fn from_pointer(client_x: f64, client_y: f64, rect: Rect) -> Option<Self> {
        if !(rect.width > 0.0 && rect.height > 0.0) {
            return None;
        }
        Some(Self {
            x: to_percent(client_x - rect.left, rect.width),
            y: to_percent(client_y - rect.top, rect.height),
        })
    }

    /// Parses a stored `object-position` value.
    ///
    /// Accepts the keyword forms the editor has written historically and
    /// `"<x>% <y>%"` (the `%` signs are optional). Anything unrecognized
    /// yields [`FocalPoint::default`].
    pub fn parse(position: &str) -> Self {
        match position.trim() {
            "top" => return Preset::Top.into(),
            "center" => return Preset::Center.into(),
            "bottom" => return Preset::Bottom.into(),
            "left top" => return Self::new(0, 0),
            "right top" => return Self::new(100, 0),
            "left center" => return Self::new(0, 50),
            "right center" => return Self::new(100, 50),
            _ => {}
        }

        let mut numbers = integer_runs(position);
        match (numbers.next(), numbers.next()) {
            (Some(x), Some(y)) => Self::new(x, y),
            _ => Self::default(),
        }
    }

    /// CSS `object-position` value, e.g. `"25% 75%"`.
    pub fn to_css(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FocalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% {}%", self.x, self.y)
    }
}

fn to_percent(offset: f64, size: f64) -> u8 {
    // NaN casts to 0
    (offset / size * 100.0).clamp(0.0, 100.0).round() as u8
}

/// Runs of ASCII digits in `s`, each saturated to 100.
fn integer_runs(s: &str) -> impl Iterator<Item = u8> + '_ {
    s.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(|run| run.parse::<u32>().map_or(100, |n| n.min(100)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RECT: Rect = Rect {
        left: 100.0,
        top: 50.0,
        width: 640.0,
        height: 360.0,
    };

    #[test]
    fn test_from_pointer_center() {
        let point = FocalPoint::from_pointer(420.0, 230.0, RECT).unwrap();
        assert_eq!(point, FocalPoint::new(50, 50));
    }

    #[test]
    fn test_from_pointer_rounds() {
        // 120/640 = 18.75% -> 19, 40/360 = 11.1% -> 11
        let point = FocalPoint::from_pointer(220.0, 90.0, RECT).unwrap();
        assert_eq!(point, FocalPoint::new(19, 11));
    }

    #[test]
    fn test_from_pointer_clamps_outside_rect() {
        let point = FocalPoint::from_pointer(0.0, 10_000.0, RECT).unwrap();
        assert_eq!(point, FocalPoint::new(0, 100));
    }

    #[test]
    fn test_from_pointer_empty_rect() {
        let rect = Rect {
            width: 0.0,
            ..RECT
        };
        assert!(FocalPoint::from_pointer(10.0, 10.0, rect).is_none());
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(FocalPoint::parse("top"), FocalPoint::new(50, 0));
        assert_eq!(FocalPoint::parse("center"), FocalPoint::new(50, 50));
        assert_eq!(FocalPoint::parse("bottom"), FocalPoint::new(50, 100));
        assert_eq!(FocalPoint::parse("left top"), FocalPoint::new(0, 0));
        assert_eq!(FocalPoint::parse("right top"), FocalPoint::new(100, 0));
        assert_eq!(FocalPoint::parse("left center"), FocalPoint::new(0, 50));
        assert_eq!(FocalPoint::parse("right center"), FocalPoint::new(100, 50));
    }

    #[test]
    fn test_parse_percentages() {
        assert_eq!(FocalPoint::parse("25% 75%"), FocalPoint::new(25, 75));
        assert_eq!(FocalPoint::parse("25 75"), FocalPoint::new(25, 75));
        assert_eq!(FocalPoint::parse("250% 75%"), FocalPoint::new(100, 75));
    }

    #[test]
    fn test_parse_unrecognized_defaults_to_top_center() {
        assert_eq!(FocalPoint::parse(""), FocalPoint::default());
        assert_eq!(FocalPoint::parse("left"), FocalPoint::new(50, 0));
        assert_eq!(FocalPoint::parse("40%"), FocalPoint::new(50, 0));
    }

    #[test]
    fn test_integer_runs_takes_every_run() {
        let runs: Vec<u8> = integer_runs("x 12% y 007% 99999").collect();
        assert_eq!(runs, vec![12, 7, 100]);
        assert_eq!(integer_runs("no digits").count(), 0);
    }

    #[test]
    fn test_css_format() {
        assert_eq!(FocalPoint::new(19, 11).to_css(), "19% 11%");
        assert_eq!(FocalPoint::from(Preset::Bottom).to_string(), "50% 100%");
    }

    proptest! {
        #[test]
        fn prop_from_pointer_stays_in_range(
            x in -5_000.0f64..5_000.0,
            y in -5_000.0f64..5_000.0,
            w in 1.0f64..4_000.0,
            h in 1.0f64..4_000.0,
        ) {
            let rect = Rect { left: 0.0, top: 0.0, width: w, height: h };
            let point = FocalPoint::from_pointer(x, y, rect).unwrap();
            prop_assert!(point.x <= 100);
            prop_assert!(point.y <= 100);
        }

        #[test]
        fn prop_css_round_trips(x in 0u8..=100, y in 0u8..=100) {
            let point = FocalPoint::new(x, y);
            prop_assert_eq!(FocalPoint::parse(&point.to_css()), point);
        }
    }
}
