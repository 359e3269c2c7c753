//! Font size: the single source of truth for point-to-pixel scale.

/// `{points, dpi}` pair. Points are device-independent; pixels depend on DPI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSize {
    pub points: f32,
    pub dpi: u16,
}

impl FontSize {
    pub const fn new(points: f32, dpi: u16) -> Self {
        Self { points, dpi }
    }

    /// Pixels at this DPI: `points * dpi / 72`.
    pub fn to_pixels(self) -> f32 {
        self.points * self.dpi as f32 / 72.0
    }

    /// Reconstruct a `FontSize` from a pixel size at a given DPI (inverse of [`to_pixels`]).
    ///
    /// [`to_pixels`]: Self::to_pixels
    pub fn from_pixels(pixels: f32, dpi: u16) -> Self {
        Self {
            points: pixels * 72.0 / dpi as f32,
            dpi,
        }
    }

    /// 26.6 fixed-point representation used when sizing a scalable rasterizer face.
    pub fn to_26_6(self) -> i32 {
        (self.points * 64.0).round() as i32
    }
}

/// Metrics computed once from the primary regular face at the current size.
/// All fields are in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    pub cap_height: f32,
    pub x_height: f32,
    pub average_width: f32,
    pub max_width: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
}

/// Derived per-cell geometry, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellMetrics {
    pub cell_width: u32,
    pub cell_height: u32,
    pub baseline: u32,
}

impl FontMetrics {
    pub fn cell_metrics(&self) -> CellMetrics {
        CellMetrics {
            cell_width: self.max_width.ceil() as u32,
            cell_height: (self.ascent - self.descent + self.line_gap).ceil() as u32,
            baseline: (self.ascent + self.line_gap / 2.0).ceil() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_conversion() {
        let size = FontSize::new(12.0, 160);
        assert!((size.to_pixels() - 26.666_666).abs() < 1e-3);
    }

    #[test]
    fn round_trip_within_epsilon() {
        let size = FontSize::new(14.5, 240);
        let px = size.to_pixels();
        let back = FontSize::from_pixels(px, 240);
        assert!((back.points - size.points).abs() < 1e-3);
    }

    #[test]
    fn fixed_point_rounding() {
        let size = FontSize::new(12.0, 72);
        assert_eq!(size.to_26_6(), 768);
    }

    #[test]
    fn cell_metrics_derivation() {
        let metrics = FontMetrics {
            ascent: 10.2,
            descent: -3.1,
            line_gap: 1.0,
            max_width: 8.4,
            ..Default::default()
        };
        let cell = metrics.cell_metrics();
        assert_eq!(cell.cell_width, 9);
        assert_eq!(cell.cell_height, 15);
        assert_eq!(cell.baseline, 11);
    }
}
