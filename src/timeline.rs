//! Scroll-driven frame position with scrub smoothing.

use crate::error::ScrubResult;
use crate::parser::{Edge, ScrollOffset};

/// Remaining distance, in frames, below which smoothing snaps to the target.
pub const CONVERGENCE_EPSILON: f64 = 1e-3;

/// How the displayed position follows the scroll target.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrubLag {
    /// Position tracks scroll progress exactly
    Immediate,
    /// Position eases toward the target, covering 99% of the distance in
    /// this many seconds
    Seconds(f64),
}

impl Default for ScrubLag {
    fn default() -> Self {
        ScrubLag::Seconds(2.0)
    }
}

/// The scroll span that drives the animation.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollRegion {
    /// CSS selector of the trigger element
    pub trigger_selector: String,
    /// Boundary where progress is 0
    pub start: ScrollOffset,
    /// Boundary where progress is 1
    pub end: ScrollOffset,
    pub scrub_lag: ScrubLag,
}

impl Default for ScrollRegion {
    fn default() -> Self {
        Self {
            trigger_selector: ".scroll-area".to_string(),
            start: ScrollOffset::new(Edge::Top, Edge::Top),
            end: ScrollOffset::new(Edge::Bottom, Edge::Top),
            scrub_lag: ScrubLag::default(),
        }
    }
}

/// Layout of the trigger element relative to the viewport at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollGeometry {
    /// Top of the element relative to the viewport top (bounding rect `top`)
    pub element_top: f64,
    /// Height of the element
    pub element_height: f64,
    /// Height of the viewport
    pub viewport_height: f64,
}

impl ScrollRegion {
    /// Scroll progress through the region in `[0, 1]`.
    ///
    /// Progress is 0 while the start boundary has not yet reached its
    /// viewport line, 1 once the end boundary has, and linear in between.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use scroll_frames::{ScrollGeometry, ScrollRegion};
    ///
    /// let region = ScrollRegion::default(); // "top top" -> "bottom top"
    /// let halfway = ScrollGeometry { element_top: -1000.0, element_height: 2000.0, viewport_height: 800.0 };
    /// assert_eq!(region.progress(&halfway), 0.5);
    /// ```
    pub fn progress(&self, geometry: &ScrollGeometry) -> f64 {
        // Distance of each boundary below its viewport line; scrolling down
        // shrinks both by the same amount.
        let distance = |offset: &ScrollOffset| {
            geometry.element_top + offset.element.resolve(geometry.element_height)
                - offset.viewport.resolve(geometry.viewport_height)
        };
        let start = distance(&self.start);
        let end = distance(&self.end);
        let span = end - start;

        let progress = if span > 0.0 {
            -start / span
        } else if start <= 0.0 {
            1.0
        } else {
            0.0
        };

        if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Raw target position for a progress value: `p * (frame_count - 1)`.
#[inline]
pub fn target_position(progress: f64, frame_count: usize) -> f64 {
    if frame_count <= 1 {
        return 0.0;
    }
    progress.clamp(0.0, 1.0) * (frame_count - 1) as f64
}

/// Move `current` toward `target` by the share of the remaining distance
/// that `lag` allows in `dt` seconds.
///
/// The approach is exponential and independent of tick rate: any sequence of
/// ticks summing to `lag` seconds covers 99% of the initial distance.
pub fn smooth_toward(current: f64, target: f64, lag: ScrubLag, dt: f64) -> f64 {
    let lag = match lag {
        ScrubLag::Immediate => return target,
        ScrubLag::Seconds(secs) if secs <= 0.0 || !secs.is_finite() => return target,
        ScrubLag::Seconds(secs) => secs,
    };
    if !dt.is_finite() || dt <= 0.0 {
        return current;
    }
    let alpha = 1.0 - (-dt * 100f64.ln() / lag).exp();
    current + (target - current) * alpha
}

/// Lifecycle of a [`ScrollTimeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineState {
    /// Created, not yet observing
    Inert,
    /// Observing and emitting positions
    Active,
    /// Stopped for good
    Deactivated,
}

/// Smoothed frame position driven by scroll progress.
///
/// The timeline does not observe anything itself. A [`ScrollObserver`]
/// samples progress once per animation tick and feeds it to
/// [`tick`](Self::tick), which returns the position to emit, if any.
///
/// ## Example
///
/// ```rust
/// use scroll_frames::{ScrollRegion, ScrollTimeline, ScrubLag};
///
/// let region = ScrollRegion { scrub_lag: ScrubLag::Immediate, ..ScrollRegion::default() };
/// let mut timeline = ScrollTimeline::new();
/// timeline.activate(&region, 120);
///
/// assert_eq!(timeline.tick(0.5, 1.0 / 60.0), Some(59.5));
/// // Nothing moved, nothing to emit
/// assert_eq!(timeline.tick(0.5, 1.0 / 60.0), None);
/// ```
#[derive(Clone, Debug)]
pub struct ScrollTimeline {
    state: TimelineState,
    frame_count: usize,
    lag: ScrubLag,
    position: f64,
    target: f64,
    last_progress: Option<f64>,
}

impl Default for ScrollTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollTimeline {
    /// Create an inert timeline.
    pub fn new() -> Self {
        Self {
            state: TimelineState::Inert,
            frame_count: 0,
            lag: ScrubLag::Immediate,
            position: 0.0,
            target: 0.0,
            last_progress: None,
        }
    }

    /// Start emitting positions for `frame_count` frames.
    ///
    /// Only an inert timeline can be activated; the position starts at 0.
    pub fn activate(&mut self, region: &ScrollRegion, frame_count: usize) {
        if self.state != TimelineState::Inert {
            tracing::debug!(state = ?self.state, "timeline activation ignored");
            return;
        }
        self.state = TimelineState::Active;
        self.frame_count = frame_count;
        self.lag = region.scrub_lag;
        self.position = 0.0;
        self.target = 0.0;
        self.last_progress = None;
        tracing::debug!(frame_count, lag = ?self.lag, trigger = %region.trigger_selector, "timeline activated");
    }

    /// Stop emitting. Safe to call repeatedly and before activation.
    pub fn deactivate(&mut self) {
        if self.state != TimelineState::Deactivated {
            self.state = TimelineState::Deactivated;
            tracing::debug!("timeline deactivated");
        }
    }

    /// Advance by one animation tick sampled at `progress`, `dt` seconds
    /// after the previous tick.
    ///
    /// Returns the new position while progress is changing or smoothing has
    /// not converged, `None` otherwise or when not active. Each tick works
    /// from the current progress only; nothing is queued.
    pub fn tick(&mut self, progress: f64, dt: f64) -> Option<f64> {
        if self.state != TimelineState::Active {
            return None;
        }

        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            self.last_progress.unwrap_or(0.0)
        };
        let changed = self.last_progress != Some(progress);
        self.last_progress = Some(progress);
        self.target = target_position(progress, self.frame_count);

        if !changed && self.is_converged() {
            return None;
        }

        let next = smooth_toward(self.position, self.target, self.lag, dt);
        self.position = if (self.target - next).abs() < CONVERGENCE_EPSILON {
            self.target
        } else {
            next
        };
        Some(self.position)
    }

    #[inline]
    pub fn state(&self) -> TimelineState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == TimelineState::Active
    }

    /// Current smoothed position in `[0, frame_count - 1]`.
    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current raw target position.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    pub fn is_converged(&self) -> bool {
        self.position == self.target
    }
}

/// Source of scroll progress samples for one region.
///
/// `on_progress(progress, dt_seconds)` is called once per animation tick with
/// the current progress through the region, until `deactivate`. It returns
/// whether sampling should continue; once it returns `false` the observer
/// idles until the page scrolls or resizes.
pub trait ScrollObserver {
    fn activate(
        &mut self,
        region: &ScrollRegion,
        on_progress: Box<dyn FnMut(f64, f64) -> bool>,
    ) -> ScrubResult<()>;

    /// Stop sampling. Safe to call repeatedly and before `activate`.
    fn deactivate(&mut self);
}

/// Browser scroll observation.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use crate::error::ScrubError;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{AddEventListenerOptions, Element, Event, Window};

    type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

    /// Events that wake an idle observer.
    const WAKE_EVENTS: [&str; 2] = ["scroll", "resize"];

    /// Samples the trigger element's bounding rect on every animation frame
    /// while the scrub is moving, and sleeps until the next scroll once it
    /// has settled.
    #[derive(Default)]
    pub struct WindowScrollObserver {
        active: Rc<Cell<bool>>,
        handle: Rc<Cell<Option<i32>>>,
        callback: FrameCallback,
        wake: Option<(Window, Closure<dyn FnMut(Event)>)>,
    }

    impl WindowScrollObserver {
        pub fn new() -> Self {
            Self::default()
        }
    }

    fn resolve_trigger(selector: &str) -> ScrubResult<Element> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ScrubError::web("No document available"))?;
        if let Some(element) = document.query_selector(selector)? {
            return Ok(element);
        }
        tracing::warn!(selector, "scroll trigger not found, using the whole document");
        document
            .document_element()
            .ok_or_else(|| ScrubError::web("No document element"))
    }

    fn sample(element: &Element) -> ScrollGeometry {
        let rect = element.get_bounding_client_rect();
        let viewport_height = web_sys::window()
            .and_then(|w| w.inner_height().ok())
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0);
        ScrollGeometry {
            element_top: rect.top(),
            element_height: rect.height(),
            viewport_height,
        }
    }

    fn request_frame(callback: &FrameCallback, handle: &Cell<Option<i32>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(closure) = callback.borrow().as_ref() {
            match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                Ok(id) => handle.set(Some(id)),
                Err(err) => tracing::warn!(?err, "requestAnimationFrame failed"),
            }
        }
    }

    impl ScrollObserver for WindowScrollObserver {
        fn activate(
            &mut self,
            region: &ScrollRegion,
            mut on_progress: Box<dyn FnMut(f64, f64) -> bool>,
        ) -> ScrubResult<()> {
            if self.active.get() {
                return Ok(());
            }
            let element = resolve_trigger(&region.trigger_selector)?;
            let region = region.clone();

            let window = web_sys::window().ok_or_else(|| ScrubError::web("No window available"))?;

            let active = self.active.clone();
            let handle = self.handle.clone();
            let callback = self.callback.clone();
            let last_ts: Cell<Option<f64>> = Cell::new(None);

            *self.callback.borrow_mut() = Some(Closure::wrap(Box::new(move |ts_ms: f64| {
                handle.set(None);
                if !active.get() {
                    return;
                }
                let dt = last_ts
                    .replace(Some(ts_ms))
                    .map(|prev| ((ts_ms - prev) / 1000.0).max(0.0))
                    .unwrap_or(0.0);
                let keep_going = on_progress(region.progress(&sample(&element)), dt);

                if !keep_going {
                    // The next wake starts a fresh dt.
                    last_ts.set(None);
                    tracing::trace!("scrub settled, sampling paused");
                } else if active.get() {
                    request_frame(&callback, &handle);
                }
            }) as Box<dyn FnMut(f64)>));

            let active = self.active.clone();
            let handle = self.handle.clone();
            let callback = self.callback.clone();
            let wake = Closure::wrap(Box::new(move |_e: Event| {
                if active.get() && handle.get().is_none() {
                    request_frame(&callback, &handle);
                }
            }) as Box<dyn FnMut(Event)>);

            let options = AddEventListenerOptions::new();
            options.set_passive(true);
            for event in WAKE_EVENTS {
                window.add_event_listener_with_callback_and_add_event_listener_options(
                    event,
                    wake.as_ref().unchecked_ref(),
                    &options,
                )?;
            }
            self.wake = Some((window, wake));

            self.active.set(true);
            request_frame(&self.callback, &self.handle);
            Ok(())
        }

        fn deactivate(&mut self) {
            self.active.set(false);
            if let Some(id) = self.handle.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(id);
                }
            }
            if let Some((window, wake)) = self.wake.take() {
                for event in WAKE_EVENTS {
                    let _ = window.remove_event_listener_with_callback(event, wake.as_ref().unchecked_ref());
                }
            }
            // Breaks the closure's reference to its own slot.
            self.callback.borrow_mut().take();
        }
    }

    impl Drop for WindowScrollObserver {
        fn drop(&mut self) {
            self.deactivate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn region(lag: ScrubLag) -> ScrollRegion {
        ScrollRegion {
            scrub_lag: lag,
            ..ScrollRegion::default()
        }
    }

    fn settle(timeline: &mut ScrollTimeline, progress: f64) -> f64 {
        for _ in 0..2000 {
            timeline.tick(progress, DT);
            if timeline.is_converged() {
                break;
            }
        }
        assert!(timeline.is_converged());
        timeline.position()
    }

    #[test]
    fn test_progress_default_region() {
        let region = ScrollRegion::default();
        let at = |top: f64| {
            region.progress(&ScrollGeometry {
                element_top: top,
                element_height: 4000.0,
                viewport_height: 900.0,
            })
        };
        assert_eq!(at(100.0), 0.0); // start not reached, clamped
        assert_eq!(at(0.0), 0.0);
        assert_eq!(at(-1000.0), 0.25);
        assert_eq!(at(-4000.0), 1.0);
        assert_eq!(at(-9000.0), 1.0); // past the end, clamped
    }

    #[test]
    fn test_progress_pixel_end() {
        let region = ScrollRegion {
            end: ScrollOffset::pixels(300.0),
            ..ScrollRegion::default()
        };
        let geometry = ScrollGeometry {
            element_top: -150.0,
            element_height: 5000.0,
            viewport_height: 800.0,
        };
        assert_eq!(region.progress(&geometry), 0.5);
    }

    #[test]
    fn test_progress_empty_span() {
        let region = ScrollRegion {
            end: ScrollOffset::new(Edge::Top, Edge::Top),
            ..ScrollRegion::default()
        };
        let before = ScrollGeometry { element_top: 10.0, element_height: 0.0, viewport_height: 800.0 };
        let after = ScrollGeometry { element_top: -10.0, ..before };
        assert_eq!(region.progress(&before), 0.0);
        assert_eq!(region.progress(&after), 1.0);
    }

    #[test]
    fn test_target_position_mapping() {
        assert_eq!(target_position(0.0, 120), 0.0);
        assert_eq!(target_position(1.0, 120), 119.0);
        assert_eq!(target_position(0.5, 120), 59.5);
        assert_eq!(target_position(1.5, 120), 119.0);
        assert_eq!(target_position(0.7, 1), 0.0);
        assert_eq!(target_position(0.7, 0), 0.0);
    }

    #[test]
    fn test_smooth_toward_is_rate_independent() {
        let lag = ScrubLag::Seconds(2.0);
        let coarse = smooth_toward(0.0, 100.0, lag, 2.0);
        assert!((coarse - 99.0).abs() < 1e-9);

        let mut fine = 0.0;
        for _ in 0..120 {
            fine = smooth_toward(fine, 100.0, lag, 2.0 / 120.0);
        }
        assert!((fine - 99.0).abs() < 1e-6);
    }

    #[test]
    fn test_smooth_toward_edge_cases() {
        assert_eq!(smooth_toward(3.0, 50.0, ScrubLag::Immediate, DT), 50.0);
        assert_eq!(smooth_toward(3.0, 50.0, ScrubLag::Seconds(0.0), DT), 50.0);
        assert_eq!(smooth_toward(3.0, 50.0, ScrubLag::Seconds(2.0), 0.0), 3.0);
        assert_eq!(smooth_toward(3.0, 50.0, ScrubLag::Seconds(2.0), f64::NAN), 3.0);
    }

    #[test]
    fn test_smoothing_moves_partially() {
        let mut timeline = ScrollTimeline::new();
        timeline.activate(&region(ScrubLag::Seconds(2.0)), 120);
        let first = timeline.tick(1.0, DT).unwrap();
        assert!(first > 0.0 && first < 119.0);
        let second = timeline.tick(1.0, DT).unwrap();
        assert!(second > first && second < 119.0);
    }

    #[test]
    fn test_scrolling_up_rewinds() {
        let mut timeline = ScrollTimeline::new();
        timeline.activate(&region(ScrubLag::Seconds(2.0)), 120);
        let high = settle(&mut timeline, 0.8);
        let step = timeline.tick(0.1, DT).unwrap();
        assert!(step < high);
    }

    #[test]
    fn test_reversible_round_trip() {
        let mut timeline = ScrollTimeline::new();
        timeline.activate(&region(ScrubLag::Seconds(2.0)), 120);

        let original = settle(&mut timeline, 0.2).floor();
        let forward = settle(&mut timeline, 0.6).floor();
        let back = settle(&mut timeline, 0.2).floor();

        assert_eq!(original, 23.0);
        assert_eq!(forward, 71.0);
        assert_eq!(back, original);
    }

    #[test]
    fn test_silent_when_converged_and_still() {
        let mut timeline = ScrollTimeline::new();
        timeline.activate(&region(ScrubLag::Immediate), 120);
        assert_eq!(timeline.tick(0.0, DT), Some(0.0));
        assert_eq!(timeline.tick(0.0, DT), None);
        assert_eq!(timeline.tick(1.0, DT), Some(119.0));
        assert_eq!(timeline.tick(1.0, DT), None);
    }

    #[test]
    fn test_single_frame_stays_at_zero() {
        let mut timeline = ScrollTimeline::new();
        timeline.activate(&region(ScrubLag::Seconds(2.0)), 1);
        assert_eq!(timeline.tick(0.9, DT), Some(0.0));
        assert_eq!(timeline.tick(0.9, DT), None);
        assert_eq!(timeline.tick(0.3, DT), Some(0.0));
    }

    #[test]
    fn test_inert_and_deactivated_emit_nothing() {
        let mut timeline = ScrollTimeline::new();
        assert_eq!(timeline.tick(0.5, DT), None);

        timeline.deactivate();
        timeline.deactivate();
        assert_eq!(timeline.state(), TimelineState::Deactivated);

        timeline.activate(&region(ScrubLag::Immediate), 120);
        assert_eq!(timeline.tick(0.5, DT), None);
    }

    #[test]
    fn test_non_finite_progress_reuses_last() {
        let mut timeline = ScrollTimeline::new();
        timeline.activate(&region(ScrubLag::Immediate), 11);
        assert_eq!(timeline.tick(0.5, DT), Some(5.0));
        assert_eq!(timeline.tick(f64::NAN, DT), None);
        assert_eq!(timeline.position(), 5.0);
    }
}
