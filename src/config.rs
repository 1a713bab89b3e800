use std::{fmt, str::FromStr};

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::common::error::{QRError, QRResult};

// Paint
//------------------------------------------------------------------------------

/// An RGBA color for the foreground or background of a generated code.
///
/// Parsed from CSS-style names (`"black"`, `"navy"`), hex strings (`#rgb`, `#rrggbb`,
/// `#rrggbbaa`) or channel arrays (`[r, g, b]`, `[r, g, b, a]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PaintSpec", into = "PaintSpec")]
pub struct Paint([u8; 4]);

impl Paint {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn channels(&self) -> [u8; 4] {
        self.0
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba(self.0)
    }

    fn from_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => Some(Self::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, [r, g, b])| Self::rgb(r, g, b))
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Paint {
    type Err = QRError;

    fn from_str(s: &str) -> QRResult<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix('#') {
            Some(hex) => Self::from_hex(hex),
            None => Self::from_name(s),
        };
        parsed.ok_or_else(|| QRError::InvalidColor(s.to_string()))
    }
}

impl From<[u8; 3]> for Paint {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<[u8; 4]> for Paint {
    fn from(rgba: [u8; 4]) -> Self {
        Self(rgba)
    }
}

impl From<(u8, u8, u8)> for Paint {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<Paint> for Rgba<u8> {
    fn from(paint: Paint) -> Self {
        paint.to_rgba()
    }
}

impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")?;
        if a != 255 {
            write!(f, "{a:02x}")?;
        }
        Ok(())
    }
}

// Wire form of a paint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PaintSpec {
    Text(String),
    Rgb([u8; 3]),
    Rgba([u8; 4]),
}

impl TryFrom<PaintSpec> for Paint {
    type Error = QRError;

    fn try_from(spec: PaintSpec) -> QRResult<Self> {
        match spec {
            PaintSpec::Text(s) => s.parse(),
            PaintSpec::Rgb(rgb) => Ok(rgb.into()),
            PaintSpec::Rgba(rgba) => Ok(rgba.into()),
        }
    }
}

impl From<Paint> for PaintSpec {
    fn from(paint: Paint) -> Self {
        Self::Text(paint.to_string())
    }
}

static NAMED_COLORS: [(&str, [u8; 3]); 22] = [
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("navy", [0, 0, 128]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
    ("teal", [0, 128, 128]),
    ("cyan", [0, 255, 255]),
    ("aqua", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("fuchsia", [255, 0, 255]),
    ("silver", [192, 192, 192]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
];


// Generate options
//------------------------------------------------------------------------------

/// Rendering options for [`generate`](crate::generate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub foreground: Paint,
    pub background: Paint,
    /// Side of the final square image in pixels
    pub output_size: u32,
    /// Pixels per module before the final resize
    pub box_size: u32,
    /// Quiet zone width in modules
    pub border: u32,
    /// Encoded logo image (PNG, JPEG, ...) pasted in the centre
    #[serde(skip)]
    pub logo: Option<Vec<u8>>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            foreground: Paint::BLACK,
            background: Paint::WHITE,
            output_size: 600,
            box_size: 10,
            border: 4,
            logo: None,
        }
    }
}

impl GenerateOptions {
    pub fn foreground(&mut self, paint: impl Into<Paint>) -> &mut Self {
        self.foreground = paint.into();
        self
    }

    pub fn background(&mut self, paint: impl Into<Paint>) -> &mut Self {
        self.background = paint.into();
        self
    }

    pub fn output_size(&mut self, size: u32) -> &mut Self {
        self.output_size = size;
        self
    }

    pub fn box_size(&mut self, size: u32) -> &mut Self {
        self.box_size = size;
        self
    }

    pub fn border(&mut self, border: u32) -> &mut Self {
        self.border = border;
        self
    }

    pub fn logo(&mut self, logo: Vec<u8>) -> &mut Self {
        self.logo = Some(logo);
        self
    }

    pub fn unset_logo(&mut self) -> &mut Self {
        self.logo = None;
        self
    }

    pub fn validate(&self) -> QRResult<()> {
        if self.output_size == 0 {
            return Err(QRError::InvalidSize(self.output_size));
        }
        if self.box_size == 0 {
            return Err(QRError::InvalidSize(self.box_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod options_tests {
    use super::{GenerateOptions, Paint};
    use crate::common::error::QRError;

    #[test]
    fn test_defaults() {
        let opts = GenerateOptions::default();
        assert_eq!(opts.foreground, Paint::BLACK);
        assert_eq!(opts.background, Paint::WHITE);
        assert_eq!(opts.output_size, 600);
        assert_eq!((opts.box_size, opts.border), (10, 4));
        assert!(opts.logo.is_none());
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_setters() {
        let mut opts = GenerateOptions::default();
        opts.foreground([10, 20, 30]).background((1, 2, 3)).output_size(300).logo(vec![1, 2]);
        assert_eq!(opts.foreground, Paint::rgb(10, 20, 30));
        assert_eq!(opts.background, Paint::rgb(1, 2, 3));
        assert_eq!(opts.output_size, 300);
        assert_eq!(opts.logo.as_deref(), Some(&[1u8, 2][..]));
        opts.unset_logo();
        assert!(opts.logo.is_none());
    }

    #[test]
    fn test_validate_zero_sizes() {
        let mut opts = GenerateOptions::default();
        opts.output_size(0);
        assert!(matches!(opts.validate(), Err(QRError::InvalidSize(0))));
        let mut opts = GenerateOptions::default();
        opts.box_size(0);
        assert!(matches!(opts.validate(), Err(QRError::InvalidSize(0))));
    }

    #[test]
    fn test_deserialize_partial() {
        let opts: GenerateOptions =
            serde_json::from_str(r#"{"foreground": "navy", "output_size": 300}"#).unwrap();
        assert_eq!(opts.foreground, Paint::rgb(0, 0, 128));
        assert_eq!(opts.background, Paint::WHITE);
        assert_eq!(opts.output_size, 300);
        assert_eq!(opts.box_size, 10);
    }

    #[test]
    fn test_serialize_skips_logo() {
        let mut opts = GenerateOptions::default();
        opts.logo(vec![0x89, 0x50]);
        let json = serde_json::to_value(&opts).unwrap();
        assert!(json.get("logo").is_none());
        assert_eq!(json["foreground"], "#000000");
        let back: GenerateOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back.logo, None);
        assert_eq!(back.output_size, 600);
    }
}
