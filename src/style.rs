//! Styling options for rendered symbols.
//!
//! These structs are the JSON-facing configuration surface of the renderer:
//! colors, gradients, module shapes, frames, and logo settings. All fields
//! carry serde defaults so upstream handlers can deserialize sparse request
//! bodies directly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Visual options applied when rendering a symbol matrix.
///
/// Colors are hex literals (`#RGB`, `#RRGGBB` or `#RRGGBBAA`). When a
/// [`GradientSpec`] is present it replaces the flat foreground color.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StylingOptions {
    /// Module color, used when no gradient is configured.
    pub foreground_color: String,
    /// Background color of the whole image, margin included.
    pub background_color: String,
    /// Optional foreground gradient.
    pub gradient: Option<GradientSpec>,
    /// Shape of the data modules.
    pub dot_style: DotStyle,
    /// Shape of the three finder patterns.
    pub corner_style: CornerStyle,
    /// Optional decorative frame around the symbol.
    pub frame: Option<FrameOptions>,
    /// Optional centered logo overlay.
    pub logo: Option<LogoOptions>,
}

impl Default for StylingOptions {
    fn default() -> Self {
        Self {
            foreground_color: default_foreground(),
            background_color: default_background(),
            gradient: None,
            dot_style: DotStyle::Square,
            corner_style: CornerStyle::Square,
            frame: None,
            logo: None,
        }
    }
}

impl StylingOptions {
    /// True when the styling can only be produced by the vector renderer
    /// (frame label text needs font shaping).
    pub(crate) fn needs_vector_text(&self) -> bool {
        self.frame
            .as_ref()
            .is_some_and(|f| f.text.as_deref().is_some_and(|t| !t.is_empty()))
    }
}

/// Shape tag for data modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DotStyle {
    /// Full unit squares.
    #[default]
    Square,
    /// Squares with rounded corners.
    Rounded,
    /// Circles inscribed in the module cell.
    Dot,
}

/// Shape tag for the finder patterns in the three symbol corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerStyle {
    /// Standard square rings.
    #[default]
    Square,
    /// Rounded-rectangle rings with a rounded center.
    Rounded,
    /// Circular rings with a circular center.
    Dot,
}

/// Gradient descriptor for the module foreground.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientSpec {
    /// Linear or radial.
    #[serde(rename = "type")]
    pub kind: GradientKind,
    /// Rotation of the gradient axis in degrees, linear gradients only.
    /// 0 runs left to right, 90 top to bottom.
    #[serde(default)]
    pub rotation: f32,
    /// Ordered color stops; offsets are clamped to `0.0..=1.0`.
    pub stops: Vec<GradientStop>,
}

/// Gradient geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    Linear,
    Radial,
}

/// Single color stop of a gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient axis, `0.0..=1.0`.
    pub offset: f32,
    /// Stop color as a hex literal.
    pub color: String,
}

/// Decorative frame drawn around the symbol.
///
/// The frame is a band of `thickness_modules` module units on all four
/// sides, outside the quiet-zone margin, so the output stays square. Label
/// text, when present, is centered inside the bottom band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameOptions {
    /// Corner treatment of the band.
    pub style: FrameStyle,
    /// Band color.
    pub color: String,
    /// Band thickness in module units.
    pub thickness_modules: u32,
    /// Optional label, e.g. "SCAN ME".
    pub text: Option<String>,
    /// Label color; defaults to the background color of the symbol.
    pub text_color: Option<String>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            style: FrameStyle::Square,
            color: default_foreground(),
            thickness_modules: 4,
            text: None,
            text_color: None,
        }
    }
}

/// Corner treatment of a frame band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStyle {
    #[default]
    Square,
    Rounded,
}

/// Logo overlay settings.
///
/// `image` carries the raw logo bytes (PNG/JPEG/...); in JSON it is a
/// base64 string. The logo occupies a centered square box of
/// `size_percent` of the symbol edge; the image itself is inset by
/// `margin` pixels inside that box and fitted preserving aspect ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoOptions {
    /// Encoded source image bytes.
    #[serde(with = "base64_bytes")]
    pub image: Vec<u8>,
    /// Edge length of the logo box as a percentage of the symbol edge.
    #[serde(default = "default_logo_percent")]
    pub size_percent: f32,
    /// Inset between the box edge and the logo image, in output pixels.
    #[serde(default = "default_logo_margin")]
    pub margin: u32,
    /// Fill of the box painted underneath the logo for contrast.
    #[serde(default = "default_background")]
    pub background_color: String,
    /// Corner radius of the box (and logo mask), in output pixels.
    #[serde(default)]
    pub corner_radius: u32,
}

impl LogoOptions {
    /// Logo settings for raw image bytes, everything else at defaults.
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            image,
            size_percent: default_logo_percent(),
            margin: default_logo_margin(),
            background_color: default_background(),
            corner_radius: 0,
        }
    }
}

fn default_foreground() -> String {
    "#000000".to_owned()
}

fn default_background() -> String {
    "#FFFFFF".to_owned()
}

fn default_logo_percent() -> f32 {
    20.0
}

fn default_logo_margin() -> u32 {
    5
}

/// Parses a hex color literal into RGBA bytes.
///
/// Accepts `#RGB`, `#RRGGBB` and `#RRGGBBAA`, with or without the leading
/// `#`. Shorthand digits are doubled (`#1af` == `#11aaff`).
pub fn parse_hex_color(hex: &str) -> Result<[u8; 4]> {
    let digits = hex.trim_start_matches('#');
    let bad = || Error::InvalidColor(hex.to_owned());
    let pair = |i: usize| {
        let part = digits.get(i..i + 2).ok_or_else(bad)?;
        u8::from_str_radix(part, 16).map_err(|_| bad())
    };
    match digits.len() {
        3 => {
            let mut out = [0u8; 4];
            for (i, c) in digits.chars().enumerate() {
                let v = c.to_digit(16).ok_or_else(bad)? as u8;
                out[i] = v << 4 | v;
            }
            out[3] = 0xff;
            Ok(out)
        }
        6 => Ok([pair(0)?, pair(2)?, pair(4)?, 0xff]),
        8 => Ok([pair(0)?, pair(2)?, pair(4)?, pair(6)?]),
        _ => Err(bad()),
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> std::result::Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Vec<u8>, D::Error> {
        let text = String::deserialize(de)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_hex() {
        assert_eq!(parse_hex_color("#ff8000").unwrap(), [255, 128, 0, 255]);
        assert_eq!(parse_hex_color("0000FF").unwrap(), [0, 0, 255, 255]);
    }

    #[test]
    fn parses_shorthand_and_alpha() {
        assert_eq!(parse_hex_color("#1af").unwrap(), [0x11, 0xaa, 0xff, 255]);
        assert_eq!(parse_hex_color("#00000080").unwrap(), [0, 0, 0, 0x80]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_hex_color("#12").is_err());
        assert!(parse_hex_color("#zzzzzz").is_err());
        assert!(parse_hex_color("").is_err());
    }

    #[test]
    fn styling_deserializes_sparse_json() {
        let styling: StylingOptions =
            serde_json::from_str(r##"{"foregroundColor": "#112233"}"##).unwrap();
        assert_eq!(styling.foreground_color, "#112233");
        assert_eq!(styling.background_color, "#FFFFFF");
        assert_eq!(styling.dot_style, DotStyle::Square);
        assert!(styling.logo.is_none());
    }

    #[test]
    fn styling_deserializes_shapes_and_gradient() {
        let styling: StylingOptions = serde_json::from_str(
            r##"{
                "dotStyle": "rounded",
                "cornerStyle": "dot",
                "gradient": {
                    "type": "linear",
                    "rotation": 45.0,
                    "stops": [
                        {"offset": 0.0, "color": "#ff0000"},
                        {"offset": 1.0, "color": "#0000ff"}
                    ]
                }
            }"##,
        )
        .unwrap();
        assert_eq!(styling.dot_style, DotStyle::Rounded);
        assert_eq!(styling.corner_style, CornerStyle::Dot);
        let gradient = styling.gradient.unwrap();
        assert_eq!(gradient.kind, GradientKind::Linear);
        assert_eq!(gradient.stops.len(), 2);
    }

    #[test]
    fn logo_bytes_round_trip_as_base64() {
        let logo = LogoOptions::new(vec![1, 2, 3, 255]);
        let json = serde_json::to_string(&logo).unwrap();
        assert!(json.contains("\"image\":\"AQID/w==\""));
        let back: LogoOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.image, vec![1, 2, 3, 255]);
        assert_eq!(back.size_percent, 20.0);
        assert_eq!(back.margin, 5);
    }
}
