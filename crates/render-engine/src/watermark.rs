//! Watermark placement, size and transparency.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::options::Orientation;

/// Size boost applied to the size factor for vertical output.
pub const VERTICAL_SIZE_MULTIPLIER: f64 = 1.35;

/// Upper bound for the scaled watermark width in pixels.
pub const MAX_TARGET_PX: u32 = 512;

/// Anchor for the watermark overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
    Center,
    CenterBottom,
}

impl WatermarkPosition {
    pub const ALL: [WatermarkPosition; 6] = [
        WatermarkPosition::TopLeft,
        WatermarkPosition::TopRight,
        WatermarkPosition::BottomLeft,
        WatermarkPosition::BottomRight,
        WatermarkPosition::Center,
        WatermarkPosition::CenterBottom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WatermarkPosition::TopLeft => "top-left",
            WatermarkPosition::TopRight => "top-right",
            WatermarkPosition::BottomLeft => "bottom-left",
            WatermarkPosition::BottomRight => "bottom-right",
            WatermarkPosition::Center => "center",
            WatermarkPosition::CenterBottom => "center-bottom",
        }
    }

    /// `x:y` arguments for the `overlay` filter. `W`/`H` are the frame size,
    /// `w`/`h` the watermark size.
    pub fn overlay_expr(self) -> &'static str {
        match self {
            WatermarkPosition::TopLeft => "0.02*W:0.02*H",
            WatermarkPosition::TopRight => "W-w-0.02*W:0.02*H",
            WatermarkPosition::BottomLeft => "0.02*W:H-h-0.02*H",
            WatermarkPosition::BottomRight => "W-w-0.02*W:H-h-0.02*H",
            WatermarkPosition::Center => "(W-w)/2:(H-h)/2",
            WatermarkPosition::CenterBottom => "(W-w)/2:H-h-0.04*H",
        }
    }
}

impl fmt::Display for WatermarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WatermarkPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WatermarkPosition::ALL
            .into_iter()
            .find(|pos| pos.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown watermark position '{s}' (expected top-left, top-right, bottom-left, bottom-right, center or center-bottom)"
                )
            })
    }
}

/// Watermark width as a fraction of the shorter output dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WatermarkSize(f64);

impl WatermarkSize {
    pub const SMALL: WatermarkSize = WatermarkSize(0.08);
    pub const DEFAULT: WatermarkSize = WatermarkSize(0.12);
    pub const LARGE: WatermarkSize = WatermarkSize(0.15);

    pub fn new(factor: f64) -> Option<Self> {
        (factor.is_finite() && factor > 0.0).then_some(Self(factor))
    }

    pub fn factor(self) -> f64 {
        self.0
    }
}

impl Default for WatermarkSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for WatermarkSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Self::SMALL),
            "default" => Ok(Self::DEFAULT),
            "large" => Ok(Self::LARGE),
            other => other
                .parse::<f64>()
                .ok()
                .and_then(Self::new)
                .ok_or_else(|| {
                    format!("invalid watermark size '{s}' (expected small, default, large or a positive number)")
                }),
        }
    }
}

/// Multiplier applied to the watermark's own alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WatermarkAlpha(f64);

impl WatermarkAlpha {
    pub const WEAK: WatermarkAlpha = WatermarkAlpha(0.8);
    pub const DEFAULT: WatermarkAlpha = WatermarkAlpha(0.6);
    pub const STRONG: WatermarkAlpha = WatermarkAlpha(0.35);

    pub fn new(alpha: f64) -> Option<Self> {
        (0.0..=1.0).contains(&alpha).then_some(Self(alpha))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for WatermarkAlpha {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for WatermarkAlpha {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weak" => Ok(Self::WEAK),
            "default" => Ok(Self::DEFAULT),
            "strong" => Ok(Self::STRONG),
            other => other
                .parse::<f64>()
                .ok()
                .and_then(Self::new)
                .ok_or_else(|| {
                    format!("invalid watermark alpha '{s}' (expected weak, default, strong or a number in [0, 1])")
                }),
        }
    }
}

/// Watermark request as given by the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkOptions {
    /// Image to overlay (typically a PNG with transparency).
    pub path: PathBuf,
    pub position: WatermarkPosition,
    pub size: WatermarkSize,
    pub alpha: WatermarkAlpha,
}

impl WatermarkOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            position: WatermarkPosition::default(),
            size: WatermarkSize::default(),
            alpha: WatermarkAlpha::default(),
        }
    }

    /// Compute the final geometry for a `width`x`height` output frame.
    pub fn place(&self, width: u32, height: u32, orientation: Orientation) -> WatermarkPlacement {
        let mut size_factor = self.size.factor();
        if orientation.is_vertical() {
            size_factor *= VERTICAL_SIZE_MULTIPLIER;
        }

        let short_side = width.min(height) as f64;
        let target_px = ((short_side * size_factor) as u32).min(MAX_TARGET_PX);

        WatermarkPlacement {
            path: self.path.clone(),
            position: self.position,
            size_factor,
            target_px,
            alpha: self.alpha.value(),
        }
    }
}

/// Resolved watermark geometry used by the filter graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkPlacement {
    pub path: PathBuf,
    pub position: WatermarkPosition,
    /// Size factor after the vertical boost.
    pub size_factor: f64,
    /// Width the watermark is scaled to; height follows its aspect ratio.
    pub target_px: u32,
    pub alpha: f64,
}
