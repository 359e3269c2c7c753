//! Packed RGBA8 color used throughout the rendering core.

/// Straight-alpha 8-bit-per-channel color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Pack into a little-endian `0xAABBGGRR` u32, matching the layout the
    /// `cell_bg` shader expects when it unpacks the SSBO entry.
    pub const fn pack(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }

    pub const fn unpack(word: u32) -> Self {
        let bytes = word.to_le_bytes();
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    pub fn to_f32_array(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// Apply the `dim` attribute: halve RGB, leave alpha untouched.
    pub fn dimmed(self) -> Self {
        Self::new(self.r / 2, self.g / 2, self.b / 2, self.a)
    }
}

/// The 16-color ANSI base palette plus the 256-color cube/grayscale ramp,
/// used by [`term_vt`] to turn SGR color indices into concrete [`Rgba8`].
#[derive(Clone, Debug)]
pub struct Palette {
    entries: [Rgba8; 256],
    pub default_fg: Rgba8,
    pub default_bg: Rgba8,
}

impl Default for Palette {
    fn default() -> Self {
        let mut entries = [Rgba8::BLACK; 256];

        const BASE16: [(u8, u8, u8); 16] = [
            (0, 0, 0),
            (205, 49, 49),
            (13, 188, 121),
            (229, 229, 16),
            (36, 114, 200),
            (188, 63, 188),
            (17, 168, 205),
            (229, 229, 229),
            (102, 102, 102),
            (241, 76, 76),
            (35, 209, 139),
            (245, 245, 67),
            (59, 142, 234),
            (214, 112, 214),
            (41, 184, 219),
            (229, 229, 229),
        ];
        for (i, (r, g, b)) in BASE16.into_iter().enumerate() {
            entries[i] = Rgba8::rgb(r, g, b);
        }

        // 216-color cube: indices 16..=231.
        for i in 0..216u32 {
            let r = i / 36;
            let g = (i / 6) % 6;
            let b = i % 6;
            let level = |v: u32| if v == 0 { 0 } else { (v * 40 + 55) as u8 };
            entries[16 + i as usize] = Rgba8::rgb(level(r), level(g), level(b));
        }

        // Grayscale ramp: indices 232..=255.
        for i in 0..24u32 {
            let v = (i * 10 + 8) as u8;
            entries[232 + i as usize] = Rgba8::rgb(v, v, v);
        }

        Self {
            entries,
            default_fg: Rgba8::rgb(229, 229, 229),
            default_bg: Rgba8::BLACK,
        }
    }
}

impl Palette {
    pub fn get(&self, index: u8) -> Rgba8 {
        self.entries[index as usize]
    }

    pub fn set(&mut self, index: u8, color: Rgba8) {
        self.entries[index as usize] = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let c = Rgba8::new(10, 20, 30, 40);
        assert_eq!(Rgba8::unpack(c.pack()), c);
    }

    #[test]
    fn zero_word_is_transparent_black() {
        assert_eq!(Rgba8::unpack(0), Rgba8::TRANSPARENT);
    }

    #[test]
    fn palette_base16_matches_ansi_red() {
        let p = Palette::default();
        assert_eq!(p.get(1), Rgba8::rgb(205, 49, 49));
    }

    #[test]
    fn palette_cube_black_corner() {
        let p = Palette::default();
        assert_eq!(p.get(16), Rgba8::rgb(0, 0, 0));
    }

    #[test]
    fn dimmed_halves_rgb_not_alpha() {
        let c = Rgba8::new(200, 100, 50, 255);
        assert_eq!(c.dimmed(), Rgba8::new(100, 50, 25, 255));
    }
}
