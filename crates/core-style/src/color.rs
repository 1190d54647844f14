//! Three-mode terminal color with lossy palette conversions.

use thiserror::Error;

/// 6x6x6 cube channel levels used by the 256-color palette.
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
/// Decision thresholds between adjacent cube levels.
const CUBE_THRESHOLDS: [u8; 5] = [48, 115, 155, 195, 235];

/// Invalid color construction arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("ANSI-8 color index {0} out of range -1..=7")]
    Ansi8OutOfRange(i16),
    #[error("ANSI-256 color index {0} out of range -1..=255")]
    Ansi256OutOfRange(i32),
    #[error("grayscale step {0} out of range 0..=23")]
    GrayscaleOutOfRange(i32),
    #[error("hex color {0:?} is not six hex digits")]
    InvalidHex(String),
}

/// A terminal color in one of three palettes. Index `-1` selects the
/// terminal's default color for the plane it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Ansi8(i8),
    Ansi256(i16),
    Rgb(u8, u8, u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Ansi8(-1)
    }
}

impl Color {
    /// The terminal default color.
    pub const DEFAULT: Color = Color::Ansi8(-1);

    /// Validated ANSI-8 constructor.
    pub fn ansi8(index: i16) -> Result<Color, ArgumentError> {
        if !(-1..=7).contains(&index) {
            return Err(ArgumentError::Ansi8OutOfRange(index));
        }
        Ok(Color::Ansi8(index as i8))
    }

    /// Validated ANSI-256 constructor.
    pub fn ansi256(index: i32) -> Result<Color, ArgumentError> {
        if !(-1..=255).contains(&index) {
            return Err(ArgumentError::Ansi256OutOfRange(index));
        }
        Ok(Color::Ansi256(index as i16))
    }

    /// One of the 24 grayscale ramp entries (232..=255).
    pub fn grayscale(step: i32) -> Result<Color, ArgumentError> {
        if !(0..=23).contains(&step) {
            return Err(ArgumentError::GrayscaleOutOfRange(step));
        }
        Ok(Color::Ansi256(232 + step as i16))
    }

    /// Parse an `RRGGBB` hex triplet (leading `#` accepted).
    pub fn from_hex(hex: &str) -> Result<Color, ArgumentError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ArgumentError::InvalidHex(hex.to_string()));
        }
        let parse = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
        Ok(Color::Rgb(
            parse(&digits[0..2]),
            parse(&digits[2..4]),
            parse(&digits[4..6]),
        ))
    }

    /// Whether this is the terminal default in any palette.
    pub fn is_default(self) -> bool {
        matches!(self, Color::Ansi8(-1) | Color::Ansi256(-1))
    }

    /// Convert to the 256-color palette. RGB input snaps to the 6x6x6 cube,
    /// or to the grayscale ramp when all channels are equal.
    pub fn to_ansi256(self) -> Color {
        match self {
            Color::Ansi8(n) => Color::Ansi256(n as i16),
            Color::Ansi256(_) => self,
            Color::Rgb(r, g, b) => Color::Ansi256(rgb_to_ansi256(r, g, b) as i16),
        }
    }

    /// Convert to the 8-color palette by channel thresholding.
    pub fn to_ansi8(self) -> Color {
        match self {
            Color::Ansi8(_) => self,
            Color::Ansi256(n) if n < 0 => Color::Ansi8(-1),
            Color::Ansi256(n) if n < 8 => Color::Ansi8(n as i8),
            Color::Ansi256(n) if n < 16 => Color::Ansi8((n - 8) as i8),
            Color::Ansi256(n) => {
                let (r, g, b) = ansi256_to_rgb(n as u8);
                Color::Ansi8(rgb_to_ansi8(r, g, b) as i8)
            }
            Color::Rgb(r, g, b) => Color::Ansi8(rgb_to_ansi8(r, g, b) as i8),
        }
    }

    /// Convert to direct RGB. The default color has no RGB identity and maps
    /// to black, matching the palette inverse for index 0.
    pub fn to_rgb(self) -> Color {
        match self {
            Color::Ansi8(n) if n < 0 => Color::Rgb(0, 0, 0),
            Color::Ansi8(n) => {
                let (r, g, b) = ansi256_to_rgb(n as u8);
                Color::Rgb(r, g, b)
            }
            Color::Ansi256(n) if n < 0 => Color::Rgb(0, 0, 0),
            Color::Ansi256(n) => {
                let (r, g, b) = ansi256_to_rgb(n as u8);
                Color::Rgb(r, g, b)
            }
            Color::Rgb(..) => self,
        }
    }
}

/// Map an RGB triple onto the 256-color palette.
pub fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        // Pure grays use the 24-step ramp, clamped to its endpoints.
        if g < 8 {
            return 16;
        }
        if g > 247 {
            return 231;
        }
        return 232 + (g - 8) / 10;
    }
    16 + 36 * cube_index(r) + 6 * cube_index(g) + cube_index(b)
}

/// Map an RGB triple onto the 8-color palette: one bit per channel at
/// threshold 128.
pub fn rgb_to_ansi8(r: u8, g: u8, b: u8) -> u8 {
    let mut index = 0u8;
    if r >= 128 {
        index |= 1;
    }
    if g >= 128 {
        index |= 2;
    }
    if b >= 128 {
        index |= 4;
    }
    index
}

/// Inverse palette mapping for every 256-color index.
pub fn ansi256_to_rgb(index: u8) -> (u8, u8, u8) {
    match index {
        0..=7 => {
            let channel = |bit: u8| if index & bit != 0 { 128 } else { 0 };
            (channel(1), channel(2), channel(4))
        }
        8..=15 => {
            // Bright variants: the base color boosted by 85 per channel.
            let base = index - 8;
            let channel = |bit: u8| if base & bit != 0 { 128 + 85 } else { 85 };
            (channel(1), channel(2), channel(4))
        }
        16..=231 => {
            let n = index - 16;
            (
                CUBE_LEVELS[(n / 36) as usize],
                CUBE_LEVELS[((n / 6) % 6) as usize],
                CUBE_LEVELS[(n % 6) as usize],
            )
        }
        232..=255 => {
            let gray = 8 + (index - 232) * 10;
            (gray, gray, gray)
        }
    }
}

fn cube_index(channel: u8) -> u8 {
    let mut index = 0u8;
    for threshold in CUBE_THRESHOLDS {
        if channel >= threshold {
            index += 1;
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_identity() {
        assert_eq!(Color::default(), Color::Ansi8(-1));
        assert!(Color::Ansi8(-1).is_default());
        assert!(Color::Ansi256(-1).is_default());
        assert!(!Color::Rgb(0, 0, 0).is_default());
    }

    #[test]
    fn constructors_validate_ranges() {
        assert!(Color::ansi8(7).is_ok());
        assert!(Color::ansi8(-1).is_ok());
        assert_eq!(Color::ansi8(8), Err(ArgumentError::Ansi8OutOfRange(8)));
        assert!(Color::ansi256(255).is_ok());
        assert_eq!(
            Color::ansi256(256),
            Err(ArgumentError::Ansi256OutOfRange(256))
        );
        assert_eq!(Color::grayscale(0), Ok(Color::Ansi256(232)));
        assert_eq!(Color::grayscale(23), Ok(Color::Ansi256(255)));
        assert!(Color::grayscale(24).is_err());
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Color::from_hex("ff8000"), Ok(Color::Rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("#102030"), Ok(Color::Rgb(16, 32, 48)));
        assert!(Color::from_hex("fff").is_err());
        assert!(Color::from_hex("gggggg").is_err());
    }

    #[test]
    fn cube_thresholds() {
        // Just below and at each threshold picks adjacent levels.
        assert_eq!(rgb_to_ansi256(47, 0, 0), 16 + 36 * 0);
        assert_eq!(rgb_to_ansi256(48, 0, 0), 16 + 36 * 1);
        assert_eq!(rgb_to_ansi256(235, 0, 0), 16 + 36 * 5);
        assert_eq!(rgb_to_ansi256(255, 0, 0), 196);
        assert_eq!(rgb_to_ansi256(0, 0, 255), 21);
    }

    #[test]
    fn grayscale_ramp_and_clamps() {
        assert_eq!(rgb_to_ansi256(7, 7, 7), 16);
        assert_eq!(rgb_to_ansi256(8, 8, 8), 232);
        assert_eq!(rgb_to_ansi256(18, 18, 18), 233);
        assert_eq!(rgb_to_ansi256(247, 247, 247), 255);
        assert_eq!(rgb_to_ansi256(248, 248, 248), 231);
    }

    #[test]
    fn ansi8_octants() {
        assert_eq!(rgb_to_ansi8(0, 0, 0), 0);
        assert_eq!(rgb_to_ansi8(255, 0, 0), 1);
        assert_eq!(rgb_to_ansi8(0, 255, 0), 2);
        assert_eq!(rgb_to_ansi8(0, 0, 255), 4);
        assert_eq!(rgb_to_ansi8(255, 255, 255), 7);
        assert_eq!(rgb_to_ansi8(127, 128, 0), 2);
    }

    #[test]
    fn palette_inverse() {
        assert_eq!(ansi256_to_rgb(16), (0, 0, 0));
        assert_eq!(ansi256_to_rgb(231), (255, 255, 255));
        assert_eq!(ansi256_to_rgb(196), (255, 0, 0));
        assert_eq!(ansi256_to_rgb(232), (8, 8, 8));
        assert_eq!(ansi256_to_rgb(255), (238, 238, 238));
        assert_eq!(ansi256_to_rgb(9), (213, 85, 85));
        assert_eq!(ansi256_to_rgb(1), (128, 0, 0));
    }

    #[test]
    fn cube_round_trip_stays_in_level() {
        // A cube color's RGB projection maps back to the same index.
        for index in 16u8..=231 {
            let (r, g, b) = ansi256_to_rgb(index);
            if r == g && g == b {
                continue; // axis grays fold into the ramp
            }
            assert_eq!(rgb_to_ansi256(r, g, b), index);
        }
    }

    #[test]
    fn conversions_are_total_over_variants() {
        for color in [
            Color::Ansi8(-1),
            Color::Ansi8(5),
            Color::Ansi256(-1),
            Color::Ansi256(12),
            Color::Ansi256(250),
            Color::Rgb(1, 2, 3),
        ] {
            let _ = color.to_ansi8();
            let _ = color.to_ansi256();
            let _ = color.to_rgb();
        }
        assert_eq!(Color::Ansi256(12).to_ansi8(), Color::Ansi8(4));
        assert_eq!(Color::Ansi8(3).to_ansi256(), Color::Ansi256(3));
        assert_eq!(Color::Rgb(255, 0, 0).to_ansi8(), Color::Ansi8(1));
    }
}
