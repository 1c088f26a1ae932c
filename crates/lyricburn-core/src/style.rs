//! Style descriptor: a closed, defaulted record describing typographic
//! rendering for a burn request.

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Default,
    Karaoke,
    Minimal,
}

impl Default for Preset {
    fn default() -> Self {
        Self::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Align {
    BottomLeft,
    BottomCenter,
    BottomRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    TopLeft,
    TopCenter,
    TopRight,
}

impl Default for Align {
    fn default() -> Self {
        Self::BottomCenter
    }
}

impl Align {
    /// ASS numpad alignment code for this anchor.
    #[must_use]
    pub fn numpad_code(self) -> u8 {
        match self {
            Self::BottomLeft => 1,
            Self::BottomCenter => 2,
            Self::BottomRight => 3,
            Self::MiddleLeft => 4,
            Self::MiddleCenter => 5,
            Self::MiddleRight => 6,
            Self::TopLeft => 7,
            Self::TopCenter => 8,
            Self::TopRight => 9,
        }
    }
}

const BUNDLED_FONTS: &[&str] = &["Inter", "Arial", "Georgia", "Helvetica", "Times New Roman"];

/// Fields explicitly present in a burn request. Unset fields fall back to
/// the resolved preset's baseline, then to the overall default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleRequest {
    pub preset: Option<Preset>,
    pub font_family: Option<String>,
    pub font_size_px: Option<u32>,
    pub color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub stroke_px: Option<u32>,
    pub stroke_color: Option<String>,
    pub align: Option<Align>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub max_width_pct: Option<u32>,
    pub outline_samples: Option<u32>,
    pub opacity: Option<u8>,
    pub rotation: Option<u32>,
}

/// A fully resolved style: every field has a concrete value.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    pub font_family: String,
    pub font_size_px: u32,
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub stroke_px: u32,
    pub stroke_color: String,
    pub align: Align,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
    pub max_width_pct: u32,
    pub outline_samples: u32,
    pub opacity: u8,
    pub rotation: u32,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size_px: 28,
            color: "#FFFFFF".to_string(),
            bold: false,
            italic: false,
            stroke_px: 3,
            stroke_color: "#000000".to_string(),
            align: Align::default(),
            pos_x: None,
            pos_y: None,
            max_width_pct: 90,
            outline_samples: 16,
            opacity: 100,
            rotation: 0,
        }
    }
}

struct PresetBaseline {
    font_size_px: u32,
    stroke_px: u32,
}

impl Preset {
    fn baseline(self) -> PresetBaseline {
        match self {
            Self::Default => PresetBaseline {
                font_size_px: 28,
                stroke_px: 3,
            },
            Self::Karaoke => PresetBaseline {
                font_size_px: 36,
                stroke_px: 4,
            },
            Self::Minimal => PresetBaseline {
                font_size_px: 24,
                stroke_px: 1,
            },
        }
    }
}

impl StyleDescriptor {
    /// Resolve a request into a closed descriptor: apply the preset
    /// baseline first, then let any explicitly-set request field win.
    pub fn resolve(request: &StyleRequest) -> Result<Self, Error> {
        let baseline = request.preset.unwrap_or_default().baseline();
        let mut style = Self {
            font_size_px: baseline.font_size_px,
            stroke_px: baseline.stroke_px,
            ..Self::default()
        };

        if let Some(font_family) = &request.font_family {
            if !BUNDLED_FONTS.contains(&font_family.as_str()) {
                return Err(Error::invalid_input(
                    "font_family",
                    format!("{font_family:?} is not a bundled font"),
                ));
            }
            style.font_family = font_family.clone();
        }
        if let Some(v) = request.font_size_px {
            if !(8..=200).contains(&v) {
                return Err(Error::invalid_input("font_size_px", "must be 8..=200"));
            }
            style.font_size_px = v;
        }
        if let Some(color) = &request.color {
            style.color = color.clone();
        }
        if let Some(v) = request.bold {
            style.bold = v;
        }
        if let Some(v) = request.italic {
            style.italic = v;
        }
        if let Some(v) = request.stroke_px {
            if v > 16 {
                return Err(Error::invalid_input("stroke_px", "must be 0..=16"));
            }
            style.stroke_px = v;
        }
        if let Some(color) = &request.stroke_color {
            style.stroke_color = color.clone();
        }
        if let Some(v) = request.align {
            style.align = v;
        }
        if request.pos_x.is_some() != request.pos_y.is_some() {
            return Err(Error::invalid_input(
                "pos_x/pos_y",
                "must both be set or both be null",
            ));
        }
        style.pos_x = request.pos_x;
        style.pos_y = request.pos_y;
        if let Some(v) = request.max_width_pct {
            if !(10..=100).contains(&v) {
                return Err(Error::invalid_input("max_width_pct", "must be 10..=100"));
            }
            style.max_width_pct = v;
        }
        if let Some(v) = request.outline_samples {
            style.outline_samples = v;
        }
        if let Some(v) = request.opacity {
            if v > 100 {
                return Err(Error::invalid_input("opacity", "must be 0..=100"));
            }
            style.opacity = v;
        }
        if let Some(v) = request.rotation {
            if v > 359 {
                return Err(Error::invalid_input("rotation", "must be 0..=359"));
            }
            style.rotation = v;
        }

        Ok(style)
    }
}
