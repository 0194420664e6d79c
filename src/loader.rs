//! Frame preloading and the readiness barrier.
//!
//! Every frame of the sequence is fetched concurrently. Each outcome, success
//! or failure, is recorded as one attempt; once every frame has been attempted
//! the set becomes ready, exactly once. A broken frame therefore costs one
//! blank frame in the scrub, never a stalled animation.

use futures::stream::{FuturesUnordered, StreamExt};

use crate::data::{Bitmap, FrameAsset, FramePattern, FrameSlot, SlotState};
use crate::error::{ScrubError, ScrubResult};

/// Progress information for frame loading
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadingProgress {
    /// Frames decoded successfully
    pub loaded: usize,
    /// Frames that failed to load or decode
    pub failed: usize,
    /// Total number of frames in the sequence
    pub total: usize,
}

impl LoadingProgress {
    /// Number of frames with a recorded outcome
    #[inline]
    pub fn attempted(&self) -> usize {
        self.loaded + self.failed
    }

    /// Get loading percentage (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.attempted() as f32 / self.total as f32) * 100.0) as u8
        }
    }

    /// Format loading message
    pub fn message(&self) -> String {
        if self.total == 0 {
            return "Loading frames...".to_string();
        }
        let mut msg = format!(
            "Loading frames... {} / {} ({}%)",
            self.attempted(),
            self.total,
            self.percent()
        );
        if self.failed > 0 {
            msg.push_str(&format!(", {} failed", self.failed));
        }
        msg
    }
}

/// One-shot gate that opens once `total` attempts have been recorded.
#[derive(Clone, Debug)]
pub struct ReadinessBarrier {
    total: usize,
    attempted: usize,
    fired: bool,
}

impl ReadinessBarrier {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            attempted: 0,
            fired: false,
        }
    }

    /// Record one attempt.
    ///
    /// Returns `true` on exactly the call that brings the count to `total`.
    /// Calls past that point are ignored.
    pub fn record(&mut self) -> bool {
        if self.attempted >= self.total {
            return false;
        }
        self.attempted += 1;
        if self.attempted == self.total && !self.fired {
            self.fired = true;
            return true;
        }
        false
    }

    #[inline]
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether the readiness notification has fired.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.fired
    }
}

/// The ordered bank of frames for one sequence.
#[derive(Clone, Debug)]
pub struct FrameSet<B> {
    pattern: FramePattern,
    slots: Vec<FrameSlot<B>>,
    barrier: ReadinessBarrier,
    failed: usize,
}

impl<B: Bitmap> FrameSet<B> {
    /// Create `count` unloaded slots addressed by `pattern`.
    pub fn new(pattern: FramePattern, count: usize) -> Self {
        let mut slots = Vec::with_capacity(count);
        slots.resize_with(count, FrameSlot::default);
        Self {
            pattern,
            slots,
            barrier: ReadinessBarrier::new(count),
            failed: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The assets to fetch, one per slot, in slot order.
    pub fn requests(&self) -> Vec<FrameAsset> {
        (0..self.slots.len())
            .map(|index| FrameAsset::for_index(&self.pattern, index))
            .collect()
    }

    /// Record the outcome of one fetch.
    ///
    /// Returns `true` when this outcome opened the readiness barrier.
    /// Out-of-range indices and repeat outcomes for an attempted slot are
    /// ignored.
    pub fn record(&mut self, index: usize, outcome: ScrubResult<B>) -> bool {
        match outcome {
            Ok(image) => self.record_loaded(index, image),
            Err(err) => self.record_failed(index, &err),
        }
    }

    /// Store a decoded frame.
    pub fn record_loaded(&mut self, index: usize, image: B) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            tracing::warn!(index, "load outcome for unknown frame slot");
            return false;
        };
        if slot.is_attempted() {
            tracing::debug!(index, "ignoring repeat load outcome");
            return false;
        }
        slot.set_loaded(image);
        if let Some((width, height)) = slot.dimensions() {
            tracing::trace!(index, width, height, "frame decoded");
        }
        self.barrier.record()
    }

    /// Mark a frame as failed. The error is logged and absorbed.
    pub fn record_failed(&mut self, index: usize, err: &ScrubError) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            tracing::warn!(index, "load outcome for unknown frame slot");
            return false;
        };
        if slot.is_attempted() {
            tracing::debug!(index, "ignoring repeat load outcome");
            return false;
        }
        tracing::warn!(index, error = %err, "Failed to load frame");
        slot.set_failed();
        self.failed += 1;
        self.barrier.record()
    }

    /// The bitmap at `index`, or `None` for unloaded, failed or out-of-range slots.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&B> {
        self.slots.get(index).and_then(FrameSlot::image)
    }

    pub fn state(&self, index: usize) -> Option<SlotState> {
        self.slots.get(index).map(FrameSlot::state)
    }

    /// Whether every frame has been attempted.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.barrier.is_open()
    }

    pub fn progress(&self) -> LoadingProgress {
        LoadingProgress {
            loaded: self.barrier.attempted() - self.failed,
            failed: self.failed,
            total: self.barrier.total(),
        }
    }

    /// Drop every decoded bitmap. Bookkeeping is left untouched.
    pub fn release_images(&mut self) {
        for slot in &mut self.slots {
            slot.release();
        }
    }
}

/// Trait for async frame image sources.
///
/// Implement this trait to fetch and decode frames with your specific I/O
/// mechanism (browser image elements, fetch API, filesystem, etc.)
///
/// No `Send` bounds: works in both native and WASM (single-threaded) contexts.
pub trait FrameSource {
    type Bitmap: Bitmap;

    /// Fetch and decode one frame.
    fn fetch(&self, asset: &FrameAsset) -> impl std::future::Future<Output = ScrubResult<Self::Bitmap>>;
}

/// Fetch all `assets` concurrently, reporting each outcome as it completes.
///
/// `on_outcome(index, result)` is called once per asset, in completion order.
/// Returns the number of outcomes reported.
pub async fn preload_frames<S, F>(source: &S, assets: &[FrameAsset], mut on_outcome: F) -> usize
where
    S: FrameSource,
    F: FnMut(usize, ScrubResult<S::Bitmap>),
{
    let mut pending: FuturesUnordered<_> = assets
        .iter()
        .map(|asset| async move { (asset.index, source.fetch(asset).await) })
        .collect();

    let mut reported = 0;
    while let Some((index, outcome)) = pending.next().await {
        on_outcome(index, outcome);
        reported += 1;
    }
    reported
}

/// Web-specific image loading.
#[cfg(feature = "web")]
pub mod web {
    use super::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::HtmlImageElement;

    impl Bitmap for HtmlImageElement {
        fn width(&self) -> u32 {
            self.natural_width()
        }

        fn height(&self) -> u32 {
            self.natural_height()
        }
    }

    /// Loads frames through `HtmlImageElement`, letting the browser fetch and
    /// decode them.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct ImageSource;

    impl FrameSource for ImageSource {
        type Bitmap = HtmlImageElement;

        fn fetch(&self, asset: &FrameAsset) -> impl std::future::Future<Output = ScrubResult<HtmlImageElement>> {
            let url = asset.url.clone();
            async move {
                let image = HtmlImageElement::new()?;
                let promise = js_sys::Promise::new(&mut |resolve, reject| {
                    image.set_onload(Some(&resolve));
                    image.set_onerror(Some(&reject));
                });
                image.set_src(&url);

                let result = JsFuture::from(promise).await;
                image.set_onload(None);
                image.set_onerror(None);

                match result {
                    Ok(_) if image.natural_width() > 0 && image.natural_height() > 0 => Ok(image),
                    Ok(_) => Err(ScrubError::decode(format!("{url}: image decoded with zero size"))),
                    Err(_) => Err(ScrubError::load(url, "image failed to load or decode")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::collections::HashSet;

    #[derive(Debug, PartialEq)]
    struct Img(u32, u32);

    impl Bitmap for Img {
        fn width(&self) -> u32 {
            self.0
        }
        fn height(&self) -> u32 {
            self.1
        }
    }

    /// Serves every frame except the ones listed as broken.
    struct MemorySource {
        broken: HashSet<usize>,
    }

    impl FrameSource for MemorySource {
        type Bitmap = Img;

        async fn fetch(&self, asset: &FrameAsset) -> ScrubResult<Img> {
            if self.broken.contains(&asset.index) {
                Err(ScrubError::load(asset.url.clone(), "404"))
            } else {
                Ok(Img(1920, 1080))
            }
        }
    }

    #[test]
    fn test_barrier_fires_once() {
        let mut barrier = ReadinessBarrier::new(3);
        assert!(!barrier.record());
        assert!(!barrier.record());
        assert!(barrier.record());
        assert!(barrier.is_open());
        assert!(!barrier.record());
        assert_eq!(barrier.attempted(), 3);
    }

    #[test]
    fn test_ready_fires_once_for_every_outcome_mix() {
        for n in 1..=6usize {
            for mask in 0..(1u32 << n) {
                let mut set: FrameSet<Img> = FrameSet::new(FramePattern::default(), n);
                let mut fired = 0;
                for i in 0..n {
                    let outcome = if mask & (1 << i) != 0 {
                        Err(ScrubError::decode("corrupt"))
                    } else {
                        Ok(Img(10, 10))
                    };
                    if set.record(i, outcome) {
                        fired += 1;
                        assert_eq!(set.progress().attempted(), n);
                    }
                }
                assert_eq!(fired, 1, "n={n} mask={mask:b}");
                assert_eq!(set.progress().failed, mask.count_ones() as usize);
            }
        }
    }

    #[test]
    fn test_repeat_and_unknown_outcomes_ignored() {
        let mut set: FrameSet<Img> = FrameSet::new(FramePattern::default(), 2);
        assert!(!set.record_loaded(0, Img(1, 1)));
        assert!(!set.record_failed(0, &ScrubError::decode("late")));
        assert!(!set.record_loaded(7, Img(1, 1)));
        assert_eq!(set.state(0), Some(SlotState::Loaded));
        assert_eq!(set.progress().attempted(), 1);

        assert!(set.record_failed(1, &ScrubError::decode("bad")));
        assert!(set.is_ready());
    }

    #[test]
    fn test_get_absent_for_failed_and_unloaded() {
        let mut set: FrameSet<Img> = FrameSet::new(FramePattern::default(), 3);
        set.record_loaded(0, Img(4, 3));
        set.record_failed(1, &ScrubError::decode("bad"));

        assert_eq!(set.get(0), Some(&Img(4, 3)));
        assert_eq!(set.get(1), None);
        assert_eq!(set.get(2), None);
        assert_eq!(set.get(99), None);
    }

    #[test]
    fn test_release_images_keeps_bookkeeping() {
        let mut set: FrameSet<Img> = FrameSet::new(FramePattern::default(), 1);
        assert!(set.record_loaded(0, Img(4, 3)));
        set.release_images();
        assert_eq!(set.get(0), None);
        assert!(set.is_ready());
        assert_eq!(set.progress().attempted(), 1);
    }

    #[test]
    fn test_requests_follow_pattern() {
        let set: FrameSet<Img> = FrameSet::new(FramePattern::default(), 120);
        let requests = set.requests();
        assert_eq!(requests.len(), 120);
        assert_eq!(requests[0].url, "/FRAMES/frame_0001.jpeg");
        assert_eq!(requests[119].url, "/FRAMES/frame_0120.jpeg");
    }

    #[test]
    fn test_preload_with_failures_reaches_ready() {
        let source = MemorySource {
            broken: [3, 7].into_iter().collect(),
        };
        let mut set: FrameSet<Img> = FrameSet::new(FramePattern::default(), 10);
        let assets = set.requests();
        let mut ready_calls = 0;

        let reported = block_on(preload_frames(&source, &assets, |index, outcome| {
            if set.record(index, outcome) {
                ready_calls += 1;
            }
        }));

        assert_eq!(reported, 10);
        assert_eq!(ready_calls, 1);
        assert!(set.is_ready());
        assert_eq!(set.state(3), Some(SlotState::Failed));
        assert_eq!(set.get(4), Some(&Img(1920, 1080)));
        assert_eq!(set.progress().message(), "Loading frames... 10 / 10 (100%), 2 failed");
    }

    #[test]
    fn test_loading_progress() {
        let progress = LoadingProgress {
            loaded: 4,
            failed: 1,
            total: 10,
        };
        assert_eq!(progress.percent(), 50);
        assert_eq!(LoadingProgress::default().message(), "Loading frames...");
        assert_eq!(LoadingProgress::default().percent(), 0);
    }
}
