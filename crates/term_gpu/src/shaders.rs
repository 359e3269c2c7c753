//! WGSL sources for the three render pipelines that make up one terminal
//! frame: a full-viewport background clear, a full-viewport per-cell
//! background fill read from a storage buffer, and instanced glyph quads
//! sampled from the atlas textures.
//!
//! The `Uniforms`/`AtlasDimensions` struct declarations below are kept
//! field-for-field in sync with `term_core::gpu_types`; nothing here
//! re-derives the layout, it only mirrors it for the shader compiler.

pub const COMMON_UNIFORMS: &str = r#"
struct Uniforms {
    projection: mat4x4<f32>,
    screen_size: vec2<f32>,
    cell_size: vec2<f32>,
    grid_size: vec2<u32>,
    padding_rect: vec2<f32>,
    padding_extend_flags: vec2<u32>,
    min_contrast: f32,
    bool_flags: u32,
    cursor_pos: vec2<u32>,
    cursor_color: u32,
    global_bg_color: u32,
    decoration_metrics: vec4<f32>,
    baseline: f32,
}

struct AtlasDimensions {
    grayscale_size: vec2<f32>,
    color_size: vec2<f32>,
}

fn unpack_color(packed: u32) -> vec4<f32> {
    let r = f32(packed & 0xFFu) / 255.0;
    let g = f32((packed >> 8u) & 0xFFu) / 255.0;
    let b = f32((packed >> 16u) & 0xFFu) / 255.0;
    let a = f32((packed >> 24u) & 0xFFu) / 255.0;
    return vec4<f32>(r, g, b, a);
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;
"#;

/// Full-screen triangle that paints the terminal's default background
/// color; draw with `draw(0..3, 0..1)` and no vertex buffer bound, no
/// blending (it's the bottommost layer of the frame).
pub const BG_CLEAR_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[index], 0.0, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return unpack_color(uniforms.global_bg_color);
}
"#;

/// Cell-background pipeline: also a full-screen triangle (no per-cell
/// vertex data); the fragment shader derives `(col, row)` from its own
/// framebuffer position and looks the color up in the `bg_colors` storage
/// buffer. Alpha blending enabled to composite atop the bg-clear pass.
pub const CELL_BG_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
}

@group(0) @binding(1)
var<storage, read> bg_colors: array<u32>;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[index], 0.0, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let col = u32(in.clip_position.x / uniforms.cell_size.x);
    let row = u32(in.clip_position.y / uniforms.cell_size.y);
    if (col >= uniforms.grid_size.x || row >= uniforms.grid_size.y) {
        discard;
    }
    let index = row * uniforms.grid_size.x + col;
    return unpack_color(bg_colors[index]);
}
"#;

/// Cell-text pipeline: one instance per glyph, `TriangleStrip` with 4
/// vertices/instance (the spec's "attribute divisor 1"). Instances that
/// carry underline, strikethrough, or inverse attributes expand their
/// quad to full cell bounds and carry the original glyph rect (normalized
/// to the cell) as a varying, so the fragment shader knows where to
/// sample the atlas versus where to paint decoration/inverse fill.
pub const CELL_TEXT_SHADER: &str = r#"
struct CellTextInstance {
    @location(0) glyph_pos: vec2<u32>,
    @location(1) glyph_size: vec2<u32>,
    @location(2) bearings: vec2<i32>,
    @location(3) grid_pos: vec2<u32>,
    @location(4) color: u32,
    @location(5) packed_tail: u32,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) cell_uv: vec2<f32>,
    @location(3) glyph_rect: vec4<f32>,
    @location(4) @interpolate(flat) flags: u32,
    @location(5) @interpolate(flat) attrs: u32,
    @location(6) @interpolate(flat) grid_pos: vec2<u32>,
}

@group(0) @binding(1) var<storage, read> bg_colors: array<u32>;
@group(0) @binding(2) var<uniform> atlas_dims: AtlasDimensions;
@group(0) @binding(3) var grayscale_atlas: texture_2d<f32>;
@group(0) @binding(4) var color_atlas: texture_2d<f32>;
@group(0) @binding(5) var atlas_sampler: sampler;

const STRIKETHROUGH_BIT: u32 = 1u << 3u;
const INVERSE_BIT: u32 = 1u << 4u;
const DIM_BIT: u32 = 1u << 2u;

fn needs_full_cell(attrs: u32) -> bool {
    let underline_variant = (attrs >> 5u) & 0x7u;
    return underline_variant != 0u || (attrs & STRIKETHROUGH_BIT) != 0u || (attrs & (1u << 4u)) != 0u;
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    instance: CellTextInstance,
) -> VertexOutput {
    var corners = array<vec2<f32>, 4>(
        vec2<f32>(0.0, 0.0), vec2<f32>(1.0, 0.0), vec2<f32>(0.0, 1.0), vec2<f32>(1.0, 1.0),
    );
    let corner = corners[vertex_index];

    let flags = (instance.packed_tail >> 8u) & 0xFFu;
    let attrs = (instance.packed_tail >> 16u) & 0xFFFFu;
    let is_color = flags & 1u;

    let glyph_size_f = vec2<f32>(f32(instance.glyph_size.x), f32(instance.glyph_size.y));
    let bearing = vec2<f32>(f32(instance.bearings.x), f32(instance.bearings.y));
    let grid_pos_f = vec2<f32>(f32(instance.grid_pos.x), f32(instance.grid_pos.y));
    let cell_origin = grid_pos_f * uniforms.cell_size;

    let glyph_min = cell_origin + vec2<f32>(bearing.x, uniforms.cell_size.y - bearing.y);
    let glyph_max = glyph_min + glyph_size_f;

    var quad_min = glyph_min;
    var quad_max = glyph_max;
    if (needs_full_cell(attrs)) {
        quad_min = cell_origin;
        quad_max = cell_origin + uniforms.cell_size;
    }

    let pixel_pos = mix(quad_min, quad_max, corner);
    let ndc = (pixel_pos / uniforms.screen_size) * 2.0 - vec2<f32>(1.0, 1.0);

    let atlas_size = select(atlas_dims.grayscale_size, atlas_dims.color_size, is_color == 1u);
    let glyph_pos_f = vec2<f32>(f32(instance.glyph_pos.x), f32(instance.glyph_pos.y));

    // uv within the glyph's own atlas rect, extrapolated outside [0,1]
    // when the quad was expanded to full cell bounds (the fragment
    // shader clamps sampling to glyph_rect before it trusts uv).
    let local = select(
        corner,
        (pixel_pos - glyph_min) / max(glyph_size_f, vec2<f32>(1.0, 1.0)),
        needs_full_cell(attrs),
    );
    let uv = (glyph_pos_f + local * glyph_size_f) / atlas_size;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc.x, -ndc.y, 0.0, 1.0);
    out.uv = uv;
    out.color = unpack_color(instance.color);
    out.cell_uv = (pixel_pos - cell_origin) / uniforms.cell_size;
    out.glyph_rect = vec4<f32>(
        (glyph_min - cell_origin) / uniforms.cell_size,
        (glyph_max - cell_origin) / uniforms.cell_size,
    );
    out.flags = flags;
    out.attrs = attrs;
    out.grid_pos = instance.grid_pos;
    return out;
}

fn underline_coverage(variant: u32, cell_uv: vec2<f32>) -> f32 {
    let thickness = 0.04;
    if (variant == 1u) {
        return select(0.0, 1.0, abs(cell_uv.y - 0.88) < thickness * 0.5);
    }
    if (variant == 2u) {
        let near_first = abs(cell_uv.y - 0.82) < thickness * 0.5;
        let near_second = abs(cell_uv.y - 0.92) < thickness * 0.5;
        return select(0.0, 1.0, near_first || near_second);
    }
    if (variant == 3u) {
        let wave = 0.88 + 0.03 * sin(cell_uv.x * 6.28318 * 3.0);
        return select(0.0, 1.0, abs(cell_uv.y - wave) < thickness * 0.5);
    }
    if (variant == 4u) {
        let on = fract(cell_uv.x * 8.0) < 0.5;
        return select(0.0, select(0.0, 1.0, on), abs(cell_uv.y - 0.88) < thickness * 0.5);
    }
    if (variant == 5u) {
        let on = fract(cell_uv.x * 4.0) < 0.6;
        return select(0.0, select(0.0, 1.0, on), abs(cell_uv.y - 0.88) < thickness * 0.5);
    }
    return 0.0;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let is_color = in.flags & 1u;
    let bold = (in.attrs & 1u) != 0u;
    let dim = (in.attrs & DIM_BIT) != 0u;
    let strikethrough = (in.attrs & STRIKETHROUGH_BIT) != 0u;
    let inverse = (in.attrs & INVERSE_BIT) != 0u;
    let underline_variant = (in.attrs >> 5u) & 0x7u;

    var base_color = in.color;
    if (inverse) {
        let index = in.grid_pos.y * uniforms.grid_size.x + in.grid_pos.x;
        base_color = unpack_color(bg_colors[index]);
    }
    if (dim) {
        base_color = vec4<f32>(base_color.rgb * 0.5, base_color.a);
    }

    let inside_glyph = all(in.cell_uv >= in.glyph_rect.xy) && all(in.cell_uv <= in.glyph_rect.zw);
    var out_color = vec4<f32>(0.0, 0.0, 0.0, 0.0);

    if (inside_glyph) {
        if (is_color == 1u) {
            out_color = textureSample(color_atlas, atlas_sampler, in.uv);
        } else {
            let coverage = textureSample(grayscale_atlas, atlas_sampler, in.uv).r;
            out_color = vec4<f32>(base_color.rgb, base_color.a * coverage);
        }
    }

    if (underline_variant != 0u) {
        let coverage = underline_coverage(underline_variant, in.cell_uv);
        out_color = mix(out_color, vec4<f32>(base_color.rgb, base_color.a), coverage);
    }
    if (strikethrough) {
        let coverage = select(0.0, 1.0, abs(in.cell_uv.y - 0.52) < 0.02);
        out_color = mix(out_color, vec4<f32>(base_color.rgb, base_color.a), coverage);
    }

    return out_color;
}
"#;
