//! Shared types for the fit analysis engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// A body/garment measurement location compared by the engine.
///
/// The declaration order is the enumeration order used for reports and
/// for the attention tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Shoulder,
    Chest,
    Waist,
    Arm,
}

impl Zone {
    /// All compared zones, in enumeration order
    pub const ALL: [Zone; 4] = [Zone::Shoulder, Zone::Chest, Zone::Waist, Zone::Arm];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Shoulder => "shoulder",
            Zone::Chest => "chest",
            Zone::Waist => "waist",
            Zone::Arm => "arm",
        }
    }

    /// Zoomed viewport region for this zone
    #[inline]
    pub fn viewport(&self) -> ViewBox {
        match self {
            Zone::Shoulder => ViewBox::new(50.0, 30.0, 200.0, 200.0),
            Zone::Chest => ViewBox::new(50.0, 80.0, 200.0, 200.0),
            Zone::Waist => ViewBox::new(50.0, 180.0, 200.0, 200.0),
            Zone::Arm => ViewBox::new(0.0, 80.0, 300.0, 300.0),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zone: {0}")]
pub struct UnknownZone(pub String);

impl std::str::FromStr for Zone {
    type Err = UnknownZone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shoulder" => Ok(Zone::Shoulder),
            "chest" => Ok(Zone::Chest),
            "waist" => Ok(Zone::Waist),
            "arm" => Ok(Zone::Arm),
            _ => Err(UnknownZone(s.to_string())),
        }
    }
}

/// Rectangular region of the silhouette coordinate space (SVG view box)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewBox {
    /// Whole silhouette, shown when no zone is focused
    pub const FULL_BODY: ViewBox = ViewBox { x: 0.0, y: 0.0, width: 300.0, height: 600.0 };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport for an optional focus zone
    #[inline]
    pub fn for_focus(zone: Option<Zone>) -> Self {
        zone.map(|z| z.viewport()).unwrap_or(Self::FULL_BODY)
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

/// Classification outcome for one zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStatus {
    MissingData,
    Tight,
    Perfect,
    Loose,
}

impl FitStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            FitStatus::MissingData => "missing_data",
            FitStatus::Tight => "tight",
            FitStatus::Perfect => "perfect",
            FitStatus::Loose => "loose",
        }
    }
}

impl fmt::Display for FitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable result of classifying one zone.
///
/// `delta` is the magnitude of the gap in centimeters (0 for `MissingData`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitVerdict {
    pub status: FitStatus,
    pub delta: f64,
}

impl FitVerdict {
    pub const MISSING: FitVerdict = FitVerdict { status: FitStatus::MissingData, delta: 0.0 };

    #[inline]
    pub fn is_tight(&self) -> bool {
        self.status == FitStatus::Tight
    }
}
