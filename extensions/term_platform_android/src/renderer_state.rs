//! Renderer Orchestrator: per-handle state tying the VT terminal, the
//! Dynamic Font System, and the GPU renderer together. Screen dimensions,
//! DPI, font size, and grid dimensions live here; `on_surface_changed`
//! (re)builds the GPU-facing pieces, `on_draw_frame` extracts-and-renders.
//!
//! UI-thread requests (font size, terminal size, scroll, show-fps) are not
//! applied immediately — they're recorded in `pending` and consumed at the
//! next `on_surface_changed`/`on_draw_frame` call on the render thread, per
//! SPEC_FULL §5's "queue changes rather than mutate render-thread state
//! directly" rule.

use std::sync::{Arc, Mutex};

use term_core::{FontSize, FontStyle, FontSystemConfig, Palette, Uniforms, WidthTable};
use term_extract::extract_screen;
use term_font::{CoverageHint, FontCollection, FontFace, FontFamily, FontSource, FontSystem, SwashRasterizer};
use term_gpu::{assemble_frame, GpuRenderer, RendererConfig as GpuRendererConfig};
use term_vt::{CellContent, GridTerminal, Terminal};

use crate::error::{PlatformError, Result};
use crate::window::AndroidWindowHandle;

const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;
const DEFAULT_FONT_SIZE_PX: f32 = 16.0;
const DEFAULT_DPI: u16 = 160;

/// The four weight/slant variants of a font family, as bytes the platform
/// layer read from `assets/fonts/` via the NDK asset manager. Only
/// `regular` is mandatory; the renderer falls back to it for styles whose
/// bytes weren't supplied (mirroring `FontFamily::get`'s own fallback).
#[derive(Clone, Default)]
pub struct FontAssetBytes {
    pub regular: Vec<u8>,
    pub bold: Option<Vec<u8>>,
    pub italic: Option<Vec<u8>>,
    pub bold_italic: Option<Vec<u8>>,
}

#[derive(Default, Clone, Copy)]
struct PendingRequests {
    font_size_px: Option<f32>,
    terminal_size: Option<(u16, u16)>,
    show_fps: Option<bool>,
    scroll_delta: Option<i32>,
    scroll_to_bottom: bool,
    pixel_offset: Option<f32>,
}

#[derive(Clone, Copy, Default)]
struct Selection {
    anchor: (u16, u16),
    cursor: (u16, u16),
    active: bool,
}

struct SurfaceState {
    gpu: GpuRenderer,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    // Kept alive for as long as the surface needs the window; never read.
    _window: Arc<AndroidWindowHandle>,
}

/// Everything one platform-boundary handle owns. Created empty by
/// `on_surface_created`; `on_surface_changed` builds (or rebuilds) the font
/// system and GPU renderer from the stored config.
pub struct RendererState {
    terminal: Mutex<GridTerminal>,
    font_bytes: FontAssetBytes,
    font_system: Option<FontSystem>,
    surface: Option<SurfaceState>,
    palette: Palette,
    dpi: u16,
    font_size_px: f32,
    show_fps: bool,
    /// Rows scrolled back from the bottom. `GridTerminal` keeps no
    /// scrollback (see SPEC_FULL §6's VT non-goals), so this only ever
    /// reports 0 — tracked as a field rather than hardcoded so the day a
    /// scrollback-capable `Terminal` impl plugs in, the plumbing is ready.
    scroll_offset: u32,
    pending: PendingRequests,
    selection: Selection,
    width_table: WidthTable,
}

impl RendererState {
    pub fn new(font_bytes: FontAssetBytes) -> Self {
        Self {
            terminal: Mutex::new(GridTerminal::new(DEFAULT_COLS, DEFAULT_ROWS)),
            font_bytes,
            font_system: None,
            surface: None,
            palette: Palette::default(),
            dpi: DEFAULT_DPI,
            font_size_px: DEFAULT_FONT_SIZE_PX,
            show_fps: false,
            scroll_offset: 0,
            pending: PendingRequests::default(),
            selection: Selection::default(),
            width_table: WidthTable::default(),
        }
    }

    #[cfg(test)]
    pub fn new_headless_for_test() -> Self {
        Self::new(FontAssetBytes::default())
    }

    fn build_font_system(&self) -> Result<FontSystem> {
        let size = FontSize::from_pixels(self.font_size_px, self.dpi);
        let data = Arc::new(self.font_bytes.regular.clone());
        let regular = FontFace::load(data, 0, FontSource::SystemPath("assets/fonts/regular.ttf".into()), CoverageHint::FullCoverage, size)?;
        let mut family = FontFamily::default();
        family.set(FontStyle::Regular, regular);

        for (style, bytes) in [
            (FontStyle::Bold, &self.font_bytes.bold),
            (FontStyle::Italic, &self.font_bytes.italic),
            (FontStyle::BoldItalic, &self.font_bytes.bold_italic),
        ] {
            if let Some(bytes) = bytes {
                let name = match style {
                    FontStyle::Bold => "bold",
                    FontStyle::Italic => "italic",
                    FontStyle::BoldItalic => "bold_italic",
                    FontStyle::Regular => "regular",
                };
                let data = Arc::new(bytes.clone());
                if let Ok(face) = FontFace::load(data, 0, FontSource::SystemPath(format!("assets/fonts/{name}.ttf")), CoverageHint::FullCoverage, size) {
                    family.set(style, face);
                }
            }
        }

        let fallbacks = term_font::discover_fallback_families(size);
        let collection = FontCollection::new(family, fallbacks, size)?;
        let config = FontSystemConfig::default();
        Ok(FontSystem::new(collection, &config, Box::new(SwashRasterizer::new())))
    }

    fn primary_metrics(&self) -> term_core::FontMetrics {
        self.font_system
            .as_ref()
            .and_then(|fs| fs.collection().primary_face(FontStyle::Regular))
            .map(|f| f.metrics())
            .unwrap_or_default()
    }

    /// First call (or a call after `on_surface_created` discarded the old
    /// state) builds the surface, font system, and GPU renderer from
    /// scratch; subsequent calls apply resize and/or a pending font-size
    /// change to the existing ones.
    pub async fn on_surface_changed(&mut self, window: AndroidWindowHandle, width_px: u32, height_px: u32, dpi: u16, font_size_px: f32) -> Result<()> {
        self.dpi = dpi;
        self.font_size_px = font_size_px;

        if self.font_system.is_none() || self.pending.font_size_px.take().is_some() {
            self.font_system = Some(self.build_font_system()?);
        }

        match &mut self.surface {
            Some(state) => {
                state.config.width = width_px.max(1);
                state.config.height = height_px.max(1);
                state.surface.configure(state.gpu.device(), &state.config);
                state.gpu.resize(width_px, height_px);
            }
            None => {
                let window = Arc::new(window);
                let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
                // `create_surface` takes ownership of anything implementing
                // `HasWindowHandle + HasDisplayHandle + Send + Sync`, giving
                // back a `Surface<'static>` — the window outlives it via the
                // `Arc` cloned into `SurfaceState`.
                let surface = instance.create_surface(Arc::clone(&window))?;
                let gpu = GpuRenderer::with_instance_and_surface(instance, &surface, GpuRendererConfig::default(), (width_px, height_px)).await?;
                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format: gpu.texture_format(),
                    width: width_px.max(1),
                    height: height_px.max(1),
                    present_mode: wgpu::PresentMode::AutoVsync,
                    alpha_mode: wgpu::CompositeAlphaMode::Auto,
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                surface.configure(gpu.device(), &config);
                self.surface = Some(SurfaceState {
                    gpu,
                    surface,
                    config,
                    _window: window,
                });
            }
        }
        Ok(())
    }

    fn apply_pending(&mut self) -> Result<()> {
        if let Some(cols_rows) = self.pending.terminal_size.take() {
            self.terminal.lock().unwrap().resize(cols_rows.0, cols_rows.1);
        }
        if let Some(show_fps) = self.pending.show_fps.take() {
            self.show_fps = show_fps;
        }
        if let Some(delta) = self.pending.scroll_delta.take() {
            self.scroll_offset = self.scroll_offset.saturating_add_signed(delta);
        }
        if self.pending.scroll_to_bottom {
            self.scroll_offset = 0;
            self.pending.scroll_to_bottom = false;
        }
        let _ = self.pending.pixel_offset.take();
        if self.pending.font_size_px.take().is_some() {
            self.font_system = Some(self.build_font_system()?);
        }
        Ok(())
    }

    /// Extracts the current terminal viewport and draws + presents one
    /// frame. A no-op (not an error) if the surface hasn't been created.
    pub fn on_draw_frame(&mut self) -> Result<()> {
        self.apply_pending()?;

        let cell_metrics = self.primary_metrics().cell_metrics();
        let palette = self.palette.clone();

        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        let Some(font_system) = self.font_system.as_mut() else {
            return Ok(());
        };

        let (cols, rows) = self.terminal.lock().unwrap().dimensions();
        let cells = {
            let terminal = self.terminal.lock().unwrap();
            extract_screen(&*terminal, &palette, &self.width_table).unwrap_or_default()
        };
        let frame = assemble_frame(&cells, cols, rows, font_system, palette.default_fg);
        surface.gpu.sync_atlases(font_system);

        let uniforms = Uniforms {
            screen_size: [surface.config.width as f32, surface.config.height as f32],
            cell_size: [cell_metrics.cell_width as f32, cell_metrics.cell_height as f32],
            grid_size: [cols as u32, rows as u32],
            global_bg_color: palette.default_bg.pack(),
            baseline: cell_metrics.baseline as f32,
            ..Uniforms::default()
        };
        surface.gpu.update_uniforms(&uniforms);

        let frame_texture = surface.surface.get_current_texture()?;
        let view = frame_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        surface.gpu.render(&view, &frame);
        frame_texture.present();
        Ok(())
    }

    pub fn on_destroy(&mut self) {
        self.surface = None;
        self.font_system = None;
    }

    pub fn process_input(&mut self, bytes: &[u8]) {
        self.terminal.lock().unwrap().feed(bytes);
    }

    pub fn set_font_size(&mut self, px: f32) {
        self.pending.font_size_px = Some(px);
    }

    pub fn set_terminal_size(&mut self, cols: u16, rows: u16) {
        self.pending.terminal_size = Some((cols, rows));
    }

    pub fn set_show_fps(&mut self, show: bool) {
        self.pending.show_fps = Some(show);
    }

    pub fn scroll_delta(&mut self, rows: i32) {
        self.pending.scroll_delta = Some(self.pending.scroll_delta.unwrap_or(0) + rows);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.pending.scroll_to_bottom = true;
    }

    pub fn is_viewport_at_bottom(&self) -> bool {
        self.scroll_offset == 0
    }

    pub fn get_viewport_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn get_scrollback_rows(&self) -> u32 {
        // GridTerminal keeps no scrollback; see the field doc on `scroll_offset`.
        0
    }

    pub fn get_content_height(&self) -> u32 {
        let (_, rows) = self.terminal.lock().unwrap().dimensions();
        rows as u32 * self.primary_metrics().cell_metrics().cell_height
    }

    pub fn get_font_line_spacing(&self) -> f32 {
        self.primary_metrics().cell_metrics().cell_height as f32
    }

    pub fn set_scroll_pixel_offset(&mut self, px: f32) {
        self.pending.pixel_offset = Some(px);
    }

    pub fn get_grid_size(&self) -> (u16, u16) {
        self.terminal.lock().unwrap().dimensions()
    }

    pub fn get_cell_size(&self) -> (u32, u32) {
        let m = self.primary_metrics().cell_metrics();
        (m.cell_width, m.cell_height)
    }

    pub fn start_selection(&mut self, col: u16, row: u16) {
        self.selection = Selection {
            anchor: (col, row),
            cursor: (col, row),
            active: true,
        };
    }

    pub fn update_selection(&mut self, col: u16, row: u16) {
        if self.selection.active {
            self.selection.cursor = (col, row);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.active = false;
    }

    pub fn has_selection(&self) -> bool {
        self.selection.active
    }

    fn selection_bounds_ordered(&self) -> Option<(u16, u16, u16, u16)> {
        if !self.selection.active {
            return None;
        }
        let (mut sc, mut sr) = self.selection.anchor;
        let (mut ec, mut er) = self.selection.cursor;
        if (sr, sc) > (er, ec) {
            std::mem::swap(&mut sr, &mut er);
            std::mem::swap(&mut sc, &mut ec);
        }
        Some((sc, sr, ec, er))
    }

    pub fn get_selection_bounds(&self) -> Option<(u16, u16, u16, u16)> {
        self.selection_bounds_ordered()
    }

    /// Reads the selected cells' codepoints out of the live viewport,
    /// row-major, clipping each row to `[start_col, end_col]` except the
    /// first/last rows, which clip to the selection's own start/end column.
    pub fn get_selection_text(&self) -> String {
        let Some((sc, sr, ec, er)) = self.selection_bounds_ordered() else {
            return String::new();
        };
        let terminal = self.terminal.lock().unwrap();
        let (total_cols, _) = terminal.dimensions();
        let mut rows: Vec<Vec<char>> = vec![Vec::new(); (er - sr + 1) as usize];
        terminal.iterate_viewport(&mut |row, col, cell| {
            if row < sr || row > er {
                return;
            }
            let row_start = if row == sr { sc } else { 0 };
            let row_end = if row == er { ec } else { total_cols.saturating_sub(1) };
            if col < row_start || col > row_end {
                return;
            }
            match cell.content {
                CellContent::Char(c) => rows[(row - sr) as usize].push(c),
                CellContent::Empty => rows[(row - sr) as usize].push(' '),
                CellContent::WideSpacer => {}
            }
        });
        rows.into_iter()
            .map(|chars| chars.into_iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn hyperlink_at_cell(&self, _col: u16, _row: u16) -> Option<String> {
        // `GridTerminal` carries no OSC-8 hyperlink state (see SPEC_FULL §6's
        // VT non-goals); a VT implementation that tracks hyperlink spans
        // would resolve one here.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_input_feeds_terminal() {
        let mut state = RendererState::new_headless_for_test();
        state.process_input(b"HI");
        let (cols, rows) = state.get_grid_size();
        assert_eq!((cols, rows), (DEFAULT_COLS, DEFAULT_ROWS));
    }

    #[test]
    fn selection_bounds_normalize_reversed_drag() {
        let mut state = RendererState::new_headless_for_test();
        state.start_selection(5, 2);
        state.update_selection(1, 0);
        assert_eq!(state.get_selection_bounds(), Some((1, 0, 5, 2)));
    }

    #[test]
    fn clearing_selection_drops_bounds_and_text() {
        let mut state = RendererState::new_headless_for_test();
        state.start_selection(0, 0);
        state.update_selection(3, 0);
        assert!(state.has_selection());
        state.clear_selection();
        assert!(!state.has_selection());
        assert_eq!(state.get_selection_bounds(), None);
        assert_eq!(state.get_selection_text(), "");
    }

    #[test]
    fn selection_text_reads_fed_cells() {
        let mut state = RendererState::new_headless_for_test();
        state.process_input(b"HELLO");
        state.start_selection(0, 0);
        state.update_selection(4, 0);
        assert_eq!(state.get_selection_text(), "HELLO");
    }

    #[test]
    fn scroll_to_bottom_resets_offset() {
        let mut state = RendererState::new_headless_for_test();
        state.scroll_delta(5);
        state.apply_pending().unwrap();
        assert_eq!(state.get_viewport_offset(), 5);
        state.scroll_to_bottom();
        state.apply_pending().unwrap();
        assert!(state.is_viewport_at_bottom());
    }

    #[test]
    fn hyperlink_lookup_is_always_none_without_vt_support() {
        let state = RendererState::new_headless_for_test();
        assert_eq!(state.hyperlink_at_cell(0, 0), None);
    }
}
