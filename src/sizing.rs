//! Cover-fit calculations for drawing frames onto a viewport-sized canvas.

/// Pixel dimensions of the viewport (and therefore the canvas).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Canvas pixel size for this viewport, rounded down.
    pub fn pixel_size(&self) -> (u32, u32) {
        (to_pixels(self.width), to_pixels(self.height))
    }
}

fn to_pixels(v: f64) -> u32 {
    if v.is_finite() && v > 0.0 {
        v as u32
    } else {
        0
    }
}

/// Placement of a bitmap scaled to cover a canvas.
///
/// The bitmap is scaled up just enough to cover the canvas in both
/// dimensions and centered, so the overflow on one axis is cropped
/// symmetrically. Offsets are therefore usually negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    /// Uniform scale factor applied to the bitmap
    pub scale: f64,
    /// Drawn width in canvas pixels
    pub width: f64,
    /// Drawn height in canvas pixels
    pub height: f64,
    /// Horizontal offset of the drawn bitmap
    pub offset_x: f64,
    /// Vertical offset of the drawn bitmap
    pub offset_y: f64,
}

impl CoverFit {
    /// Calculate the cover-fit placement of a bitmap on a canvas.
    ///
    /// ## Arguments
    ///
    /// * `bitmap_width` / `bitmap_height` - Intrinsic bitmap size in pixels
    /// * `canvas_width` / `canvas_height` - Canvas size in pixels
    ///
    /// ## Returns
    ///
    /// `None` when any dimension is zero, negative or not finite.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use scroll_frames::CoverFit;
    ///
    /// let fit = CoverFit::compute(100.0, 50.0, 200.0, 200.0).unwrap();
    /// assert_eq!(fit.scale, 4.0);
    /// assert_eq!((fit.width, fit.height), (400.0, 200.0));
    /// assert_eq!((fit.offset_x, fit.offset_y), (-100.0, 0.0));
    /// ```
    pub fn compute(bitmap_width: f64, bitmap_height: f64, canvas_width: f64, canvas_height: f64) -> Option<Self> {
        let dims = [bitmap_width, bitmap_height, canvas_width, canvas_height];
        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return None;
        }

        let scale = (canvas_width / bitmap_width).max(canvas_height / bitmap_height);
        let width = bitmap_width * scale;
        let height = bitmap_height * scale;

        Some(Self {
            scale,
            width,
            height,
            offset_x: (canvas_width - width) / 2.0,
            offset_y: (canvas_height - height) / 2.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_wide_image_on_square_canvas() {
        let fit = CoverFit::compute(100.0, 50.0, 200.0, 200.0).unwrap();
        assert_eq!(fit.scale, 4.0);
        assert_eq!(fit.width, 400.0);
        assert_eq!(fit.height, 200.0);
        assert_eq!(fit.offset_x, -100.0);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn test_cover_wide_image_on_portrait_canvas() {
        let fit = CoverFit::compute(200.0, 100.0, 100.0, 200.0).unwrap();
        assert_eq!(fit.scale, 2.0);
        assert_eq!((fit.width, fit.height), (400.0, 200.0));
        assert_eq!((fit.offset_x, fit.offset_y), (-150.0, 0.0));
    }

    #[test]
    fn test_cover_tall_image_crops_vertically() {
        let fit = CoverFit::compute(100.0, 400.0, 400.0, 400.0).unwrap();
        assert_eq!(fit.scale, 4.0);
        assert_eq!(fit.offset_x, 0.0);
        assert_eq!(fit.offset_y, -600.0);
    }

    #[test]
    fn test_cover_always_covers() {
        for &(bw, bh, cw, ch) in &[
            (1920.0, 1080.0, 390.0, 844.0),
            (1080.0, 1920.0, 1440.0, 900.0),
            (640.0, 640.0, 1.0, 3000.0),
        ] {
            let fit = CoverFit::compute(bw, bh, cw, ch).unwrap();
            assert!(fit.width >= cw - 1e-9 && fit.height >= ch - 1e-9);
            assert!(fit.offset_x <= 0.0 && fit.offset_y <= 0.0);
        }
    }

    #[test]
    fn test_degenerate_dimensions() {
        assert!(CoverFit::compute(0.0, 50.0, 200.0, 200.0).is_none());
        assert!(CoverFit::compute(100.0, 50.0, 0.0, 200.0).is_none());
        assert!(CoverFit::compute(100.0, f64::NAN, 200.0, 200.0).is_none());
        assert!(CoverFit::compute(100.0, 50.0, 200.0, -1.0).is_none());
    }

    #[test]
    fn test_viewport_pixel_size() {
        assert_eq!(Viewport::new(1280.5, 720.9).pixel_size(), (1280, 720));
        assert_eq!(Viewport::new(-3.0, f64::INFINITY).pixel_size(), (0, 0));
    }
}
