use rand::Rng;
use serde::{Deserialize, Serialize};

/// Packed 32-bit ARGB color, `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);

    pub fn from_argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Color(
            (alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | (blue as u32),
        )
    }

    /// Fully opaque color with uniformly random RGB channels, assigned to
    /// every freshly started note.
    pub fn random_opaque() -> Self {
        let mut rng = rand::thread_rng();
        Self::from_argb(255, rng.gen(), rng.gen(), rng.gen())
    }

    pub fn argb(self) -> u32 {
        self.0
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_packing() {
        let color = Color::from_argb(0xFF, 0x12, 0x34, 0x56);
        assert_eq!(color.argb(), 0xFF12_3456);
        assert_eq!(color.alpha(), 0xFF);
        assert_eq!(color.red(), 0x12);
        assert_eq!(color.green(), 0x34);
        assert_eq!(color.blue(), 0x56);
    }

    #[test]
    fn test_random_opaque_is_opaque() {
        for _ in 0..32 {
            assert_eq!(Color::random_opaque().alpha(), 255);
        }
    }
}
