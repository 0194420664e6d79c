//! Drawing frames onto the canvas surface.

use crate::data::Bitmap;
use crate::error::ScrubResult;
use crate::sizing::{CoverFit, Viewport};

/// A 2D drawing surface the renderer can size, clear and draw onto.
///
/// The browser implementation is [`web::CanvasSurface`]; native hosts and
/// tests provide their own.
pub trait Surface {
    type Bitmap: Bitmap;

    /// Viewport the surface is bound to
    fn viewport(&self) -> Viewport;

    /// Current pixel size as (width, height)
    fn size(&self) -> (u32, u32);

    /// Resize the backing store in pixels
    fn set_size(&mut self, width: u32, height: u32);

    /// Clear the whole surface
    fn clear(&mut self) -> ScrubResult<()>;

    /// Draw `image` at the placement given by `fit`, with high-quality smoothing
    fn draw_image(&mut self, image: &Self::Bitmap, fit: &CoverFit) -> ScrubResult<()>;
}

/// Draws frames onto a surface with a cover-fit transform.
///
/// The renderer keeps no memory of what it drew last: every call to
/// [`draw`](Self::draw) repaints. Callers coalesce redundant draws.
#[derive(Debug)]
pub struct CanvasRenderer<S> {
    surface: S,
}

impl<S: Surface> CanvasRenderer<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Match the surface's pixel size to its current viewport.
    pub fn resize_to_viewport(&mut self) {
        let (width, height) = self.surface.viewport().pixel_size();
        self.surface.set_size(width, height);
    }

    /// Clear the surface and draw `image` cover-fitted and centered.
    ///
    /// An absent image, or a surface or image with no area, leaves the
    /// surface untouched. Returns `true` when something was drawn.
    pub fn draw(&mut self, image: Option<&S::Bitmap>) -> ScrubResult<bool> {
        let Some(image) = image else {
            return Ok(false);
        };

        let (canvas_width, canvas_height) = self.surface.size();
        let Some(fit) = CoverFit::compute(
            image.width() as f64,
            image.height() as f64,
            canvas_width as f64,
            canvas_height as f64,
        ) else {
            return Ok(false);
        };

        self.surface.clear()?;
        self.surface.draw_image(image, &fit)?;
        tracing::trace!(scale = fit.scale, "frame drawn");
        Ok(true)
    }
}

/// Web-specific rendering implementation.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use crate::error::ScrubError;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::JsValue;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

    /// An `HtmlCanvasElement` and its 2D context.
    ///
    /// If the browser refuses a 2D context, the surface still tracks its size
    /// but every clear and draw is a no-op.
    #[derive(Clone, Debug)]
    pub struct CanvasSurface {
        canvas: HtmlCanvasElement,
        context: Option<CanvasRenderingContext2d>,
    }

    impl CanvasSurface {
        pub fn new(canvas: HtmlCanvasElement) -> Self {
            let context = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
            if context.is_none() {
                tracing::warn!("2d canvas context unavailable, frames will not be drawn");
            }
            Self { canvas, context }
        }

        #[inline]
        pub fn canvas(&self) -> &HtmlCanvasElement {
            &self.canvas
        }

        #[inline]
        pub fn has_context(&self) -> bool {
            self.context.is_some()
        }
    }

    impl Surface for CanvasSurface {
        type Bitmap = HtmlImageElement;

        fn viewport(&self) -> Viewport {
            window_viewport().unwrap_or_else(|err| {
                tracing::warn!(%err, "viewport unavailable");
                Viewport::default()
            })
        }

        fn size(&self) -> (u32, u32) {
            (self.canvas.width(), self.canvas.height())
        }

        fn set_size(&mut self, width: u32, height: u32) {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }

        fn clear(&mut self) -> ScrubResult<()> {
            if let Some(ctx) = &self.context {
                ctx.clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
            }
            Ok(())
        }

        fn draw_image(&mut self, image: &HtmlImageElement, fit: &CoverFit) -> ScrubResult<()> {
            let Some(ctx) = &self.context else {
                return Ok(());
            };
            // Resizing the canvas resets context state, so smoothing is set per draw.
            ctx.set_image_smoothing_enabled(true);
            js_sys::Reflect::set(ctx, &JsValue::from_str("imageSmoothingQuality"), &JsValue::from_str("high"))?;
            ctx.draw_image_with_html_image_element_and_dw_and_dh(image, fit.offset_x, fit.offset_y, fit.width, fit.height)
                .map_err(|_| ScrubError::surface("Failed to draw frame image"))
        }
    }

    /// Read the current window viewport (`innerWidth` x `innerHeight`).
    pub fn window_viewport() -> ScrubResult<Viewport> {
        let window = web_sys::window().ok_or_else(|| ScrubError::web("No window available"))?;
        let width = window.inner_width()?.as_f64().unwrap_or(0.0);
        let height = window.inner_height()?.as_f64().unwrap_or(0.0);
        Ok(Viewport::new(width, height))
    }

    /// Apply the inline style a fixed background canvas needs on mobile:
    /// touch gestures pass through to the page and the layer is composited.
    pub fn prepare_canvas_style(canvas: &HtmlCanvasElement) -> ScrubResult<()> {
        let style = canvas.style();
        style.set_property("touch-action", "none")?;
        style.set_property("will-change", "transform")?;
        Ok(())
    }
}
