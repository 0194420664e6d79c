//! Viewport resize and orientation handling.

/// A viewport change the canvas must follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportSignal {
    Resize,
    OrientationChange,
}

impl ViewportSignal {
    pub const ALL: [ViewportSignal; 2] = [ViewportSignal::Resize, ViewportSignal::OrientationChange];

    /// DOM event name on `window`.
    pub fn event_name(self) -> &'static str {
        match self {
            ViewportSignal::Resize => "resize",
            ViewportSignal::OrientationChange => "orientationchange",
        }
    }

    /// Signal for a DOM event type, `None` for anything else.
    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.event_name() == name)
    }
}

/// Decides whether a viewport signal should trigger a redraw.
///
/// Inert until enabled. Once disabled it stays disabled, so a late signal
/// after teardown never reaches the canvas.
#[derive(Clone, Debug, Default)]
pub struct ResizeCoordinator {
    enabled: bool,
    torn_down: bool,
}

impl ResizeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting signals. Has no effect after [`disable`](Self::disable).
    pub fn enable(&mut self) {
        if !self.torn_down {
            self.enabled = true;
        }
    }

    /// Stop accepting signals for good.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.torn_down = true;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether `signal` should cause one resize-and-redraw.
    pub fn accepts(&self, signal: ViewportSignal) -> bool {
        if !self.enabled {
            tracing::trace!(?signal, "viewport signal ignored");
        }
        self.enabled
    }
}

/// Browser viewport listeners.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use crate::error::{ScrubError, ScrubResult};
    use std::rc::Rc;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{Event, Window};

    /// `resize` and `orientationchange` listeners on `window`.
    ///
    /// Listeners are removed on [`detach`](Self::detach) or drop.
    pub struct ViewportListeners {
        window: Window,
        listeners: Vec<(ViewportSignal, Closure<dyn FnMut(Event)>)>,
    }

    impl ViewportListeners {
        /// Register `on_signal` for every [`ViewportSignal`].
        pub fn attach(on_signal: Rc<dyn Fn(ViewportSignal)>) -> ScrubResult<Self> {
            let window = web_sys::window().ok_or_else(|| ScrubError::web("No window available"))?;
            let mut attached = Self {
                window,
                listeners: Vec::with_capacity(ViewportSignal::ALL.len()),
            };

            for signal in ViewportSignal::ALL {
                let handler = on_signal.clone();
                let closure = Closure::wrap(Box::new(move |e: Event| {
                    if let Some(signal) = ViewportSignal::from_event_name(&e.type_()) {
                        handler(signal);
                    }
                }) as Box<dyn FnMut(Event)>);
                attached
                    .window
                    .add_event_listener_with_callback(signal.event_name(), closure.as_ref().unchecked_ref())?;
                attached.listeners.push((signal, closure));
            }

            Ok(attached)
        }

        /// Remove every listener. Safe to call repeatedly.
        pub fn detach(&mut self) {
            for (signal, closure) in self.listeners.drain(..) {
                let _ = self
                    .window
                    .remove_event_listener_with_callback(signal.event_name(), closure.as_ref().unchecked_ref());
            }
        }
    }

    impl Drop for ViewportListeners {
        fn drop(&mut self) {
            self.detach();
        }
    }
}
