use serde::{Deserialize, Serialize};

/// Errors from parsing color strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("invalid hex color: {0:?}")]
    InvalidHex(String),
    #[error("unknown color name: {0:?}")]
    UnknownName(String),
}

/// An sRGB color with components in `[0, 1]`.
///
/// Serialized as a `#rrggbb` string so config files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let [_, r, g, b] = hex.to_be_bytes();
        Self::from_srgb8([r, g, b])
    }

    pub fn from_srgb8(rgb: [u8; 3]) -> Self {
        Self {
            r: rgb[0] as f32 / 255.0,
            g: rgb[1] as f32 / 255.0,
            b: rgb[2] as f32 / 255.0,
        }
    }

    pub fn to_srgb8(&self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    pub fn to_hex(&self) -> u32 {
        let [r, g, b] = self.to_srgb8();
        u32::from_be_bytes([0, r, g, b])
    }

    /// Six lowercase hex digits without a leading `#`.
    pub fn hex_string(&self) -> String {
        format!("{:06x}", self.to_hex())
    }

    /// Parse `#rrggbb`, `#rgb` (with or without `#`) or a basic CSS color name.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let trimmed = s.trim();
        if let Some(named) = Self::named(trimmed) {
            return Ok(named);
        }
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return if trimmed.starts_with('#') || digits.is_empty() {
                Err(ColorError::InvalidHex(s.to_string()))
            } else {
                Err(ColorError::UnknownName(s.to_string()))
            };
        }
        match digits.len() {
            6 => u32::from_str_radix(digits, 16)
                .map(Self::from_hex)
                .map_err(|_| ColorError::InvalidHex(s.to_string())),
            3 => {
                let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16)
                    .map(Self::from_hex)
                    .map_err(|_| ColorError::InvalidHex(s.to_string()))
            }
            _ => Err(ColorError::InvalidHex(s.to_string())),
        }
    }

    fn named(name: &str) -> Option<Self> {
        let hex = match name.to_ascii_lowercase().as_str() {
            "white" => 0xffffff,
            "black" => 0x000000,
            "red" => 0xff0000,
            "green" => 0x008000,
            "blue" => 0x0000ff,
            "yellow" => 0xffff00,
            "gray" | "grey" => 0x808080,
            _ => return None,
        };
        Some(Self::from_hex(hex))
    }

    /// Linear-light components for shading.
    pub fn to_linear(&self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }

    pub fn scaled_linear(&self, intensity: f32) -> [f32; 3] {
        let [r, g, b] = self.to_linear();
        [r * intensity, g * intensity, b * intensity]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        format!("#{}", color.hex_string())
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.hex_string())
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let c = Color::from_hex(0x654321);
        assert_eq!(c.hex_string(), "654321");
        assert_eq!(c.to_hex(), 0x654321);
    }

    #[test]
    fn parse_variants() {
        assert_eq!(Color::parse("#404040").unwrap().to_hex(), 0x404040);
        assert_eq!(Color::parse("ff8800").unwrap().to_hex(), 0xff8800);
        assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("white").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("Blue").unwrap(), Color::BLUE);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            Color::parse("#12345"),
            Err(ColorError::InvalidHex(_))
        ));
        assert!(matches!(
            Color::parse("#zzzzzz"),
            Err(ColorError::InvalidHex(_))
        ));
        assert!(matches!(
            Color::parse("chartreuse-ish"),
            Err(ColorError::UnknownName(_))
        ));
    }

    #[test]
    fn linear_conversion_endpoints() {
        assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let [r, _, _] = Color::WHITE.to_linear();
        assert!((r - 1.0).abs() < 1e-5);
        // mid gray is darker in linear space
        let [g, _, _] = Color::from_hex(0x808080).to_linear();
        assert!(g < 0.25 && g > 0.2);
    }

    #[test]
    fn display_has_hash_prefix() {
        assert_eq!(Color::from_hex(0x0000ff).to_string(), "#0000ff");
        let s: String = Color::WHITE.into();
        assert_eq!(s, "#ffffff");
    }
}
