//! GPU-facing packed structs. Layouts are fixed and asserted at compile time
//! so they match the WGSL `Uniforms`/`AtlasDimensions` struct declarations
//! in `term_gpu::shaders` exactly.

use crate::attrs::CellAttributes;
use crate::color::Rgba8;

/// Per-glyph instanced vertex attribute. Fixed 32-byte layout: `stride = 32`,
/// `step_mode = Instance` (the spec's "attribute divisor 1").
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CellInstance {
    pub glyph_pos: [u32; 2],
    pub glyph_size: [u32; 2],
    pub bearings: [i16; 2],
    pub grid_pos: [u16; 2],
    pub color: [u8; 4],
    pub atlas: u8,
    pub flags: u8,
    pub attributes: u16,
}

const _: () = assert!(std::mem::size_of::<CellInstance>() == 32);

/// Bit 0 of `CellInstance.flags`: glyph sampled from the color atlas (RGBA)
/// rather than the grayscale alpha atlas.
pub const FLAG_COLOR_GLYPH: u8 = 1 << 0;

impl CellInstance {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        glyph_pos: [u32; 2],
        glyph_size: [u32; 2],
        bearings: [i16; 2],
        grid_pos: [u16; 2],
        color: Rgba8,
        atlas: u8,
        is_color_glyph: bool,
        attributes: CellAttributes,
    ) -> Self {
        Self {
            glyph_pos,
            glyph_size,
            bearings,
            grid_pos,
            color: [color.r, color.g, color.b, color.a],
            atlas,
            flags: if is_color_glyph { FLAG_COLOR_GLYPH } else { 0 },
            attributes: attributes.pack(),
        }
    }
}

/// Global per-frame uniform block (binding 0). `#[repr(C)]` field order keeps
/// every `vec4`/`mat4` 16-byte aligned as WGSL's uniform address space requires.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub projection: [[f32; 4]; 4],
    pub screen_size: [f32; 2],
    pub cell_size: [f32; 2],
    pub grid_size: [u32; 2],
    pub padding_rect: [f32; 2],
    pub padding_extend_flags: [u32; 2],
    pub min_contrast: f32,
    pub bool_flags: u32,
    pub cursor_pos: [u32; 2],
    pub cursor_color: u32,
    pub global_bg_color: u32,
    pub decoration_metrics: [f32; 4],
    pub baseline: f32,
    pub _pad: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<Uniforms>() % 16 == 0);

/// `bool_flags` bit positions.
pub const UNIFORM_FLAG_CURSOR_WIDE: u32 = 1 << 0;
pub const UNIFORM_FLAG_P3: u32 = 1 << 1;
pub const UNIFORM_FLAG_LINEAR_BLENDING: u32 = 1 << 2;
pub const UNIFORM_FLAG_LINEAR_CORRECTION: u32 = 1 << 3;

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            projection: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            screen_size: [0.0, 0.0],
            cell_size: [0.0, 0.0],
            grid_size: [0, 0],
            padding_rect: [0.0, 0.0],
            padding_extend_flags: [0, 0],
            min_contrast: 1.0,
            bool_flags: 0,
            cursor_pos: [0, 0],
            cursor_color: 0,
            global_bg_color: 0,
            decoration_metrics: [0.0; 4],
            baseline: 0.0,
            _pad: [0.0; 3],
        }
    }
}

/// Normalizes pixel-space atlas lookups into `[0, 1]` (binding 2).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AtlasDimensions {
    pub grayscale_size: [f32; 2],
    pub color_size: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_instance_is_32_bytes() {
        assert_eq!(std::mem::size_of::<CellInstance>(), 32);
    }

    #[test]
    fn uniforms_is_16_byte_aligned_size() {
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
    }

    #[test]
    fn cell_instance_constructor_packs_fields() {
        let inst = CellInstance::new(
            [4, 8],
            [10, 16],
            [1, -2],
            [3, 5],
            Rgba8::rgb(255, 0, 0),
            1,
            true,
            CellAttributes::CLEARED,
        );
        assert_eq!(inst.glyph_pos, [4, 8]);
        assert_eq!(inst.color, [255, 0, 0, 255]);
        assert_eq!(inst.flags & FLAG_COLOR_GLYPH, FLAG_COLOR_GLYPH);
    }
}
