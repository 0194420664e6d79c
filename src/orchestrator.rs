//! Lifecycle that ties loading, scrolling, resizing and drawing together.
//!
//! ```text
//! Initializing --start()--> Loading --all frames attempted--> Active
//!       \                      \                               |
//!        `-------------------------------- dispose() ----------+--> Disposed
//! ```
//!
//! The orchestrator is driven entirely by its host: the host feeds it load
//! outcomes, scroll ticks and viewport signals from a single thread, and it
//! answers by drawing. Once disposed every input is ignored.

use std::cell::RefCell;

use crate::config::ScrubConfig;
use crate::data::FrameAsset;
use crate::error::ScrubResult;
use crate::loader::{FrameSet, LoadingProgress};
use crate::render::{CanvasRenderer, Surface};
use crate::resize::{ResizeCoordinator, ViewportSignal};
use crate::timeline::{ScrollRegion, ScrollTimeline};

/// Orchestrator lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, nothing requested yet
    Initializing,
    /// Frames requested, waiting for every frame to be attempted
    Loading,
    /// Scrubbing with scroll
    Active,
    /// Torn down for good
    Disposed,
}

/// Owns all animation state for one canvas.
pub struct Orchestrator<S: Surface> {
    lifecycle: Lifecycle,
    region: ScrollRegion,
    frames: FrameSet<S::Bitmap>,
    timeline: ScrollTimeline,
    renderer: CanvasRenderer<S>,
    resize: ResizeCoordinator,
    displayed: Option<usize>,
}

impl<S: Surface> Orchestrator<S> {
    /// Build every component in its inert state.
    pub fn new(config: &ScrubConfig, surface: S) -> ScrubResult<Self> {
        config.validate()?;
        let region = config.region.resolve()?;
        Ok(Self {
            lifecycle: Lifecycle::Initializing,
            region,
            frames: FrameSet::new(config.frames.clone(), config.frame_count),
            timeline: ScrollTimeline::new(),
            renderer: CanvasRenderer::new(surface),
            resize: ResizeCoordinator::new(),
            displayed: None,
        })
    }

    /// Enter `Loading` and return the frames the host must fetch.
    ///
    /// Returns nothing when called outside `Initializing`.
    pub fn start(&mut self) -> Vec<FrameAsset> {
        if self.lifecycle != Lifecycle::Initializing {
            tracing::debug!(lifecycle = ?self.lifecycle, "start ignored");
            return Vec::new();
        }
        self.set_lifecycle(Lifecycle::Loading);
        self.frames.requests()
    }

    /// Record one load outcome.
    ///
    /// Returns `true` when this outcome completed loading and the
    /// orchestrator became `Active`; the host should then start observing
    /// scroll for [`region`](Self::region).
    ///
    /// Outcomes are only recorded while `Loading`, that is for frames
    /// handed out by [`start`](Self::start).
    pub fn on_frame_loaded(&mut self, index: usize, outcome: ScrubResult<S::Bitmap>) -> bool {
        if self.lifecycle != Lifecycle::Loading {
            tracing::debug!(index, lifecycle = ?self.lifecycle, "load outcome outside loading dropped");
            return false;
        }
        let ready = self.frames.record(index, outcome);
        if ready {
            self.activate();
        }
        ready
    }

    fn activate(&mut self) {
        let progress = self.frames.progress();
        tracing::debug!(loaded = progress.loaded, failed = progress.failed, "all frames attempted");

        self.renderer.resize_to_viewport();
        self.paint(0);
        self.timeline.activate(&self.region, self.frames.len());
        self.resize.enable();
        self.set_lifecycle(Lifecycle::Active);
    }

    /// Feed one animation tick of scroll progress.
    ///
    /// Returns `true` when a frame was drawn.
    pub fn on_tick(&mut self, progress: f64, dt: f64) -> bool {
        if self.lifecycle != Lifecycle::Active {
            return false;
        }
        match self.timeline.tick(progress, dt) {
            Some(position) => self.on_position(position),
            None => false,
        }
    }

    /// Show the frame for a smoothed position.
    ///
    /// Draws only when `floor(position)` differs from the frame on screen.
    /// Returns `true` when a frame was drawn.
    pub fn on_position(&mut self, position: f64) -> bool {
        if self.lifecycle != Lifecycle::Active || !position.is_finite() {
            return false;
        }
        let last = self.frames.len().saturating_sub(1);
        let index = (position.floor().max(0.0) as usize).min(last);
        if self.displayed == Some(index) {
            return false;
        }
        self.paint(index)
    }

    /// Resize the canvas and redraw the frame on screen.
    ///
    /// Ignored before the first frame is shown and after dispose.
    pub fn on_viewport_signal(&mut self, signal: ViewportSignal) -> bool {
        if self.lifecycle != Lifecycle::Active || !self.resize.accepts(signal) {
            return false;
        }
        let index = self.displayed.unwrap_or(0);
        self.renderer.resize_to_viewport();
        tracing::debug!(?signal, index, "viewport changed, redrawing");
        self.paint(index)
    }

    /// Whether scroll sampling can pause: the timeline has caught up with
    /// the last progress, or the orchestrator is no longer active.
    pub fn is_settled(&self) -> bool {
        self.lifecycle != Lifecycle::Active || self.timeline.is_converged()
    }

    /// Tear down. Safe to call repeatedly and in any state.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        self.timeline.deactivate();
        self.resize.disable();
        self.frames.release_images();
        self.set_lifecycle(Lifecycle::Disposed);
    }

    fn paint(&mut self, index: usize) -> bool {
        self.displayed = Some(index);
        match self.renderer.draw(self.frames.get(index)) {
            Ok(drawn) => drawn,
            Err(err) => {
                tracing::warn!(index, %err, "frame draw failed");
                false
            }
        }
    }

    fn set_lifecycle(&mut self, next: Lifecycle) {
        tracing::debug!(from = ?self.lifecycle, to = ?next, "lifecycle");
        self.lifecycle = next;
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Index of the frame on screen, once one has been shown.
    #[inline]
    pub fn displayed_index(&self) -> Option<usize> {
        self.displayed
    }

    /// Smoothed timeline position.
    #[inline]
    pub fn position(&self) -> f64 {
        self.timeline.position()
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn region(&self) -> &ScrollRegion {
        &self.region
    }

    pub fn progress(&self) -> LoadingProgress {
        self.frames.progress()
    }

    #[inline]
    pub fn surface(&self) -> &S {
        self.renderer.surface()
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        self.renderer.surface_mut()
    }
}

/// Load outcomes waiting for an orchestrator that is borrowed elsewhere.
///
/// Every outcome pushed here eventually reaches the orchestrator, so a
/// busy moment never costs an attempt toward readiness.
pub struct OutcomeQueue<B> {
    pending: RefCell<Vec<(usize, ScrubResult<B>)>>,
}

impl<B> Default for OutcomeQueue<B> {
    fn default() -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
        }
    }
}

impl<B> OutcomeQueue<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, index: usize, outcome: ScrubResult<B>) {
        self.pending.borrow_mut().push((index, outcome));
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Drop everything queued.
    pub fn clear(&self) {
        self.pending.borrow_mut().clear();
    }

    /// Hand every queued outcome to `orch`, in arrival order.
    ///
    /// When `orch` is already borrowed the outcomes stay queued for the
    /// next call. Returns `true` when delivery made the orchestrator `Active`.
    pub fn deliver<S>(&self, orch: &RefCell<Orchestrator<S>>) -> bool
    where
        S: Surface<Bitmap = B>,
    {
        let Ok(mut orch) = orch.try_borrow_mut() else {
            tracing::debug!(queued = self.len(), "orchestrator busy, load outcomes queued");
            return false;
        };
        let queued = std::mem::take(&mut *self.pending.borrow_mut());
        let mut activated = false;
        for (index, outcome) in queued {
            activated |= orch.on_frame_loaded(index, outcome);
        }
        activated
    }
}

/// Browser mounting.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use crate::loader::preload_frames;
    use crate::loader::web::ImageSource;
    use crate::render::web::{prepare_canvas_style, CanvasSurface};
    use crate::resize::web::ViewportListeners;
    use crate::timeline::web::WindowScrollObserver;
    use crate::timeline::ScrollObserver;
    use std::rc::{Rc, Weak};
    use web_sys::{HtmlCanvasElement, HtmlImageElement};

    type Shared = Rc<RefCell<Orchestrator<CanvasSurface>>>;

    /// A mounted animation. Dropping the handle disposes it.
    pub struct ScrubHandle {
        orchestrator: Shared,
        observer: Rc<RefCell<WindowScrollObserver>>,
        listeners: RefCell<Option<ViewportListeners>>,
    }

    /// Mount the scroll animation on `canvas` and start preloading frames.
    ///
    /// ## Example
    ///
    /// ```rust,ignore
    /// use scroll_frames::{mount, ScrubConfig};
    ///
    /// let canvas: web_sys::HtmlCanvasElement = // ... get canvas element
    /// let handle = mount(ScrubConfig::new(120, "/FRAMES"), canvas)?;
    /// // on unmount
    /// handle.dispose();
    /// ```
    pub fn mount(config: ScrubConfig, canvas: HtmlCanvasElement) -> ScrubResult<ScrubHandle> {
        if let Err(err) = prepare_canvas_style(&canvas) {
            tracing::warn!(%err, "could not style canvas");
        }

        let orchestrator: Shared = Rc::new(RefCell::new(Orchestrator::new(&config, CanvasSurface::new(canvas))?));
        let observer = Rc::new(RefCell::new(WindowScrollObserver::new()));

        let weak = Rc::downgrade(&orchestrator);
        let listeners = ViewportListeners::attach(Rc::new(move |signal: ViewportSignal| {
            if let Some(orch) = weak.upgrade() {
                if let Ok(mut orch) = orch.try_borrow_mut() {
                    orch.on_viewport_signal(signal);
                }
            }
        }))?;

        let assets = orchestrator.borrow_mut().start();
        let weak = Rc::downgrade(&orchestrator);
        let weak_observer = Rc::downgrade(&observer);
        wasm_bindgen_futures::spawn_local(async move {
            let backlog: OutcomeQueue<HtmlImageElement> = OutcomeQueue::new();
            preload_frames(&ImageSource, &assets, |index, outcome| {
                backlog.push(index, outcome);
                deliver(&weak, &weak_observer, &backlog);
            })
            .await;

            // Outcomes that met a busy orchestrator are retried until taken.
            while !backlog.is_empty() && weak.strong_count() > 0 {
                yield_to_event_loop().await;
                deliver(&weak, &weak_observer, &backlog);
            }
        });

        Ok(ScrubHandle {
            orchestrator,
            observer,
            listeners: RefCell::new(Some(listeners)),
        })
    }

    fn deliver(
        orch: &Weak<RefCell<Orchestrator<CanvasSurface>>>,
        observer: &Weak<RefCell<WindowScrollObserver>>,
        backlog: &OutcomeQueue<HtmlImageElement>,
    ) {
        let Some(orch) = orch.upgrade() else {
            backlog.clear();
            return;
        };
        if backlog.deliver(&orch) {
            start_observer(&orch, observer);
        }
    }

    /// Resolve on a later macrotask.
    async fn yield_to_event_loop() {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0);
            } else {
                let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }

    fn start_observer(orch: &Shared, observer: &Weak<RefCell<WindowScrollObserver>>) {
        let Some(observer) = observer.upgrade() else {
            return;
        };
        let region = orch.borrow().region().clone();
        let weak = Rc::downgrade(orch);
        let on_progress = Box::new(move |progress: f64, dt: f64| {
            let Some(orch) = weak.upgrade() else {
                return false;
            };
            let Ok(mut orch) = orch.try_borrow_mut() else {
                return true;
            };
            orch.on_tick(progress, dt);
            !orch.is_settled()
        });
        if let Err(err) = observer.borrow_mut().activate(&region, on_progress) {
            tracing::warn!(%err, "scroll observation unavailable");
        };
    }

    impl ScrubHandle {
        /// Stop scroll observation, remove listeners and release frames.
        /// Safe to call repeatedly.
        pub fn dispose(&self) {
            if let Ok(mut orch) = self.orchestrator.try_borrow_mut() {
                orch.dispose();
            }
            if let Ok(mut observer) = self.observer.try_borrow_mut() {
                observer.deactivate();
            }
            self.listeners.borrow_mut().take();
        }

        pub fn lifecycle(&self) -> Lifecycle {
            self.orchestrator.borrow().lifecycle()
        }

        pub fn progress(&self) -> LoadingProgress {
            self.orchestrator.borrow().progress()
        }
    }

    impl Drop for ScrubHandle {
        fn drop(&mut self) {
            self.dispose();
        }
    }
}
