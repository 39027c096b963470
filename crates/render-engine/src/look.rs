//! Look presets and color grading.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Named astro look. Each preset is a bundle of color-grade defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookPreset {
    /// Clean, natural Milky Way look.
    Milkyway,
    /// Brighter midtones and gentle saturation for aurora gradients.
    Aurora,
    /// Aurora with stronger contrast and color.
    AuroraBoosted,
}

impl LookPreset {
    pub const ALL: [LookPreset; 3] = [
        LookPreset::Milkyway,
        LookPreset::Aurora,
        LookPreset::AuroraBoosted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LookPreset::Milkyway => "milkyway",
            LookPreset::Aurora => "aurora",
            LookPreset::AuroraBoosted => "aurora-boosted",
        }
    }

    pub fn grade(self) -> ColorGrade {
        match self {
            LookPreset::Milkyway => ColorGrade {
                gamma: 1.30,
                contrast: 1.15,
                saturation: 1.10,
                clarity: 0.30,
            },
            LookPreset::Aurora => ColorGrade {
                gamma: 1.35,
                contrast: 1.15,
                saturation: 1.15,
                clarity: 0.30,
            },
            LookPreset::AuroraBoosted => ColorGrade {
                gamma: 1.42,
                contrast: 1.35,
                saturation: 1.30,
                clarity: 0.35,
            },
        }
    }
}

impl fmt::Display for LookPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LookPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookPreset::ALL
            .into_iter()
            .find(|look| look.name() == s)
            .ok_or_else(|| {
                format!("unknown look '{s}' (expected milkyway, aurora or aurora-boosted)")
            })
    }
}

/// Final tone/color parameters fed to the `eq` and `unsharp` filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorGrade {
    pub gamma: f64,
    pub contrast: f64,
    pub saturation: f64,
    /// Unsharp-mask amount; 0 disables sharpening.
    pub clarity: f64,
}

impl ColorGrade {
    pub const NEUTRAL: ColorGrade = ColorGrade {
        gamma: 1.0,
        contrast: 1.0,
        saturation: 1.0,
        clarity: 0.0,
    };

    /// Whether the `eq` stage has anything to do.
    pub fn has_tone_adjustment(&self) -> bool {
        self.gamma != 1.0 || self.contrast != 1.0 || self.saturation != 1.0
    }

    pub fn has_clarity(&self) -> bool {
        self.clarity > 0.0
    }
}

impl Default for ColorGrade {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Color parameters the user set explicitly. `None` means "not given".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorOverrides {
    pub gamma: Option<f64>,
    pub contrast: Option<f64>,
    pub saturation: Option<f64>,
    pub clarity: Option<f64>,
}

impl ColorOverrides {
    /// Merge explicit values over the preset (or neutral) grade.
    /// An explicit value always wins, even when it equals the neutral value.
    pub fn resolve(&self, look: Option<LookPreset>) -> ColorGrade {
        let base = look.map(LookPreset::grade).unwrap_or(ColorGrade::NEUTRAL);
        ColorGrade {
            gamma: self.gamma.unwrap_or(base.gamma),
            contrast: self.contrast.unwrap_or(base.contrast),
            saturation: self.saturation.unwrap_or(base.saturation),
            clarity: self.clarity.unwrap_or(base.clarity),
        }
    }
}
