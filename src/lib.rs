//! # scroll-frames
//!
//! Scroll-synchronized image-sequence animation for full-viewport canvas
//! backgrounds.
//!
//! This crate provides platform-agnostic data structures and logic for:
//! - Preloading a numbered frame sequence behind a one-shot readiness barrier
//! - Mapping scroll progress through a region to a smoothed frame position
//! - Cover-fit drawing of the current frame onto a canvas
//! - Following viewport resizes and orientation changes
//! - Tying it all together in a disposable lifecycle
//!
//! ## Features
//!
//! - `web` - Browser canvas, image loading and scroll observation
//! - `serde` - Enable serialization/deserialization for configuration
//! - `toml` - Load [`ScrubConfig`] from TOML
//!
//! ## Example
//!
//! ```rust,ignore
//! use scroll_frames::{Orchestrator, ScrubConfig};
//!
//! let mut orch = Orchestrator::new(&ScrubConfig::new(120, "/FRAMES"), surface)?;
//!
//! // Fetch these, then report each outcome
//! for asset in orch.start() {
//!     let outcome = fetch_and_decode(&asset.url);
//!     orch.on_frame_loaded(asset.index, outcome);
//! }
//!
//! // Once active, feed scroll progress every animation frame
//! orch.on_tick(scroll_progress, dt_seconds);
//!
//! orch.dispose();
//! ```

mod config;
mod data;
mod error;
pub mod loader;
pub mod orchestrator;
mod parser;
pub mod render;
pub mod resize;
mod sizing;
pub mod timeline;

pub use config::{OffsetSetting, RegionConfig, ScrubConfig, ScrubSetting};
pub use data::{Bitmap, FrameAsset, FramePattern, FrameSlot, SlotState};
pub use error::{ScrubError, ScrubResult};
pub use loader::{preload_frames, FrameSet, FrameSource, LoadingProgress, ReadinessBarrier};
pub use orchestrator::{Lifecycle, Orchestrator, OutcomeQueue};
pub use parser::{parse_offset, Edge, ParseError, ScrollOffset};
pub use render::{CanvasRenderer, Surface};
pub use resize::{ResizeCoordinator, ViewportSignal};
pub use sizing::{CoverFit, Viewport};
pub use timeline::{
    smooth_toward, target_position, ScrollGeometry, ScrollObserver, ScrollRegion, ScrollTimeline,
    ScrubLag, TimelineState,
};

#[cfg(feature = "web")]
pub use orchestrator::web::{mount, ScrubHandle};
