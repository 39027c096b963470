//! Render options and their resolution into a consistent render setup.
//!
//! User input ([`RenderOptions`]) carries "auto" and "not given" states;
//! [`RenderOptions::resolve`] turns it into a [`ResolvedRender`] where every
//! value is concrete.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use lapse_common::error::{LapseError, LapseResult};

use crate::look::{ColorGrade, ColorOverrides, LookPreset};
use crate::watermark::{WatermarkOptions, WatermarkPlacement};

/// Output frame orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// 16:9
    #[default]
    Landscape,
    /// 9:16
    Vertical,
}

impl Orientation {
    pub fn is_vertical(self) -> bool {
        self == Orientation::Vertical
    }

    pub fn name(self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Vertical => "vertical",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "landscape" => Ok(Orientation::Landscape),
            "vertical" => Ok(Orientation::Vertical),
            _ => Err(format!(
                "unknown orientation '{s}' (expected landscape or vertical)"
            )),
        }
    }
}

/// Resolution tier. Aliases are kept distinct so the output name carries
/// the tag the user typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "HD")]
    Hd,
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "4k")]
    K4,
}

impl Resolution {
    pub fn tag(self) -> &'static str {
        match self {
            Resolution::P1080 => "1080p",
            Resolution::Hd => "HD",
            Resolution::P2160 => "2160p",
            Resolution::K4 => "4k",
        }
    }

    /// Output `(width, height)` for the given orientation.
    pub fn dimensions(self, orientation: Orientation) -> (u32, u32) {
        let (long, short) = match self {
            Resolution::P1080 | Resolution::Hd => (1920, 1080),
            Resolution::P2160 | Resolution::K4 => (3840, 2160),
        };
        match orientation {
            Orientation::Landscape => (long, short),
            Orientation::Vertical => (short, long),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1080p" => Ok(Resolution::P1080),
            "HD" => Ok(Resolution::Hd),
            "2160p" => Ok(Resolution::P2160),
            "4k" => Ok(Resolution::K4),
            _ => Err(format!(
                "unknown resolution '{s}' (expected 1080p, 2160p, HD or 4k)"
            )),
        }
    }
}

/// How the source is fitted into the output frame, as requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectMode {
    /// Landscape scales, vertical crops.
    #[default]
    Auto,
    /// Force exact WxH (distorts on aspect mismatch).
    Scale,
    /// Preserve aspect, fill the frame, crop the overflow.
    Crop,
    /// Preserve aspect, fit inside the frame, pad with bars.
    Pad,
}

impl FromStr for AspectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(AspectMode::Auto),
            "scale" => Ok(AspectMode::Scale),
            "crop" => Ok(AspectMode::Crop),
            "pad" => Ok(AspectMode::Pad),
            _ => Err(format!(
                "unknown aspect mode '{s}' (expected auto, scale, crop or pad)"
            )),
        }
    }
}

/// Vertical anchor for crop mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CropBias {
    Upper,
    #[default]
    Center,
    Lower,
}

impl CropBias {
    /// `y` argument of the `crop` filter.
    pub fn y_expr(self) -> &'static str {
        match self {
            CropBias::Upper => "0",
            CropBias::Center => "(ih-oh)/2",
            CropBias::Lower => "ih-oh",
        }
    }
}

impl FromStr for CropBias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper" => Ok(CropBias::Upper),
            "center" => Ok(CropBias::Center),
            "lower" => Ok(CropBias::Lower),
            _ => Err(format!(
                "unknown crop bias '{s}' (expected upper, center or lower)"
            )),
        }
    }
}

/// Concrete fit policy after `auto` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    Scale,
    Crop(CropBias),
    Pad,
}

/// Render options as requested by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub resolution: Resolution,
    pub orientation: Orientation,
    pub aspect_mode: AspectMode,
    pub crop_bias: CropBias,
    pub fps: u32,
    /// Playback slowdown; 1.5 plays 50% slower.
    pub slowdown: f64,
    pub look: Option<LookPreset>,
    pub colors: ColorOverrides,
    pub watermark: Option<WatermarkOptions>,
    pub boomerang: bool,
    pub debug_overlay: bool,
    pub crf: u32,
    pub preset: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            orientation: Orientation::default(),
            aspect_mode: AspectMode::default(),
            crop_bias: CropBias::default(),
            fps: 24,
            slowdown: 1.0,
            look: None,
            colors: ColorOverrides::default(),
            watermark: None,
            boomerang: false,
            debug_overlay: false,
            crf: 20,
            preset: "slow".to_string(),
        }
    }
}

/// Fully resolved render setup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRender {
    pub width: u32,
    pub height: u32,
    pub resolution: Resolution,
    pub orientation: Orientation,
    pub fit: FitMode,
    pub grade: ColorGrade,
    pub look: Option<LookPreset>,
    pub fps: u32,
    pub slowdown: f64,
    pub watermark: Option<WatermarkPlacement>,
    pub boomerang: bool,
    pub debug_overlay: bool,
    pub crf: u32,
    pub preset: String,
}

impl ResolvedRender {
    pub fn is_slowed(&self) -> bool {
        self.slowdown != 1.0
    }
}

impl RenderOptions {
    /// Resolve `auto` fit, merge the look preset, and place the watermark.
    pub fn resolve(&self) -> LapseResult<ResolvedRender> {
        if self.fps == 0 {
            return Err(LapseError::config("fps must be greater than zero"));
        }
        if !(self.slowdown.is_finite() && self.slowdown > 0.0) {
            return Err(LapseError::config(format!(
                "slowdown must be a positive number, got {}",
                self.slowdown
            )));
        }
        if self.preset.trim().is_empty() {
            return Err(LapseError::config("encoder preset must not be empty"));
        }

        let (width, height) = self.resolution.dimensions(self.orientation);

        let fit = match self.aspect_mode {
            AspectMode::Auto if self.orientation.is_vertical() => FitMode::Crop(self.crop_bias),
            AspectMode::Auto | AspectMode::Scale => FitMode::Scale,
            AspectMode::Crop => FitMode::Crop(self.crop_bias),
            AspectMode::Pad => FitMode::Pad,
        };

        let grade = self.colors.resolve(self.look);

        let watermark = self
            .watermark
            .as_ref()
            .map(|wm| wm.place(width, height, self.orientation));

        if let Some(wm) = &watermark {
            tracing::debug!(
                orientation = %self.orientation,
                size_factor = wm.size_factor,
                target_px = wm.target_px,
                "Watermark sizing"
            );
        }

        Ok(ResolvedRender {
            width,
            height,
            resolution: self.resolution,
            orientation: self.orientation,
            fit,
            grade,
            look: self.look,
            fps: self.fps,
            slowdown: self.slowdown,
            watermark,
            boomerang: self.boomerang,
            debug_overlay: self.debug_overlay,
            crf: self.crf,
            preset: self.preset.clone(),
        })
    }
}
