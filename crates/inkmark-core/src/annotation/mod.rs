//! Annotation data model: strokes, text notes and per-page sets.

mod page;
mod stroke;
mod text;

pub use page::{PageAnnotationSet, PageAnnotations};
pub use stroke::{DEFAULT_PRESSURE, Stroke, StrokeId, normalize_pressure};
pub use text::{DEFAULT_FONT_FAMILY, TextAnnotation, TextId};

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
///
/// Deserializes from either `{r, g, b, a}` or a `#rrggbb` / `#rrggbbaa` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut c = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::new(c.next()??, c.next()??, c.next()??, 255))
            }
            6 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                255,
            )),
            8 => Some(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
                channel(&hex[6..8])?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb` (alpha is dropped when opaque).
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Same color with its alpha multiplied by `factor` (clamped to 0..=1).
    pub fn scale_alpha(&self, factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.clamp(0.0, 1.0) } else { 1.0 };
        Self {
            a: (self.a as f64 * factor).round() as u8,
            ..*self
        }
    }

    /// [`SerializableColor::scale_alpha`] as a peniko color.
    pub fn with_alpha_factor(&self, factor: f64) -> Color {
        self.scale_alpha(factor).into()
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::black()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Rgba { r: u8, g: u8, b: u8, #[serde(default = "opaque")] a: u8 },
}

fn opaque() -> u8 {
    255
}

impl TryFrom<ColorRepr> for SerializableColor {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(hex) => {
                Self::from_hex(&hex).ok_or_else(|| format!("invalid color '{}'", hex))
            }
            ColorRepr::Rgba { r, g, b, a } => Ok(Self::new(r, g, b, a)),
        }
    }
}

/// Which tool produced a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeTool {
    #[default]
    Pen,
    Eraser,
}

/// Visual pen style used to render a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenStyle {
    /// Smooth constant-width ink.
    #[default]
    Writing,
    /// Three layered translucent passes.
    Drawing,
    /// Chisel nib, width follows direction.
    Calligraphy,
    /// Pressure-driven ribbon with ink-flow centerline.
    Fountain,
    /// Constant width with a light bleed pass.
    Ballpoint,
    /// Very pressure-sensitive ribbon.
    Brush,
    /// Grainy multi-pass jittered strokes.
    Pencil,
    /// Flat-capped translucent marker.
    Highlighter,
}

impl PenStyle {
    /// All styles, in toolbar order.
    pub fn all() -> &'static [PenStyle] {
        &[
            PenStyle::Writing,
            PenStyle::Drawing,
            PenStyle::Calligraphy,
            PenStyle::Fountain,
            PenStyle::Ballpoint,
            PenStyle::Brush,
            PenStyle::Pencil,
            PenStyle::Highlighter,
        ]
    }

    /// Display name for UI.
    pub fn name(self) -> &'static str {
        match self {
            PenStyle::Writing => "Writing",
            PenStyle::Drawing => "Drawing",
            PenStyle::Calligraphy => "Calligraphy",
            PenStyle::Fountain => "Fountain",
            PenStyle::Ballpoint => "Ballpoint",
            PenStyle::Brush => "Brush",
            PenStyle::Pencil => "Pencil",
            PenStyle::Highlighter => "Highlighter",
        }
    }

    /// Whether repeated renders of this style depend on the random source.
    pub fn is_textured(self) -> bool {
        matches!(self, PenStyle::Pencil | PenStyle::Brush)
    }
}

/// Generate a seed for new strokes.
/// Counter mixed through a splitmix32-style hash; works without a clock.
pub(crate) fn generate_seed() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut x = counter.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(SerializableColor::from_hex("#ff0000"), Some(SerializableColor::new(255, 0, 0, 255)));
        assert_eq!(SerializableColor::from_hex("0f0"), Some(SerializableColor::new(0, 255, 0, 255)));
        assert_eq!(SerializableColor::from_hex("#00000080"), Some(SerializableColor::new(0, 0, 0, 128)));
        assert_eq!(SerializableColor::from_hex("#12345"), None);
        assert_eq!(SerializableColor::from_hex("#gg0000"), None);
        assert_eq!(SerializableColor::from_hex("#aéééb"), None);
        assert_eq!(SerializableColor::from_hex("ééé"), None);
    }

    #[test]
    fn test_color_deserializes_from_both_forms() {
        let hex: SerializableColor = serde_json::from_str("\"#1e90ff\"").unwrap();
        assert_eq!(hex, SerializableColor::new(0x1e, 0x90, 0xff, 255));

        let rgba: SerializableColor = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(rgba, SerializableColor::new(1, 2, 3, 255));

        assert!(serde_json::from_str::<SerializableColor>("\"nope\"").is_err());
    }

    #[test]
    fn test_alpha_factor() {
        let c = SerializableColor::black().with_alpha_factor(0.5).to_rgba8();
        assert_eq!(c.a, 128);
        let c = SerializableColor::black().with_alpha_factor(3.0).to_rgba8();
        assert_eq!(c.a, 255);
    }

    #[test]
    fn test_pen_style_serde_names() {
        assert_eq!(serde_json::to_string(&PenStyle::Highlighter).unwrap(), "\"highlighter\"");
        let style: PenStyle = serde_json::from_str("\"fountain\"").unwrap();
        assert_eq!(style, PenStyle::Fountain);
        assert_eq!(PenStyle::all().len(), 8);
    }
}
