//! Core data structures for frame assets and their load slots.

/// A decoded image with intrinsic pixel dimensions.
///
/// Implemented for `web_sys::HtmlImageElement` with the `web` feature; tests
/// and native hosts provide their own.
pub trait Bitmap {
    /// Intrinsic width in pixels
    fn width(&self) -> u32;
    /// Intrinsic height in pixels
    fn height(&self) -> u32;
}

/// Naming scheme for the frames of a sequence.
///
/// Frames are addressed 1-based on disk with a 4-digit zero-padded index,
/// e.g. `/FRAMES/frame_0001.jpeg`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FramePattern {
    /// Directory or URL prefix the frames live under
    pub base_path: String,
    /// Filename prefix before the index
    pub prefix: String,
    /// File extension without the dot
    pub extension: String,
}

impl Default for FramePattern {
    fn default() -> Self {
        Self {
            base_path: "/FRAMES".to_string(),
            prefix: "frame_".to_string(),
            extension: "jpeg".to_string(),
        }
    }
}

impl FramePattern {
    /// Largest index representable with 4 digits
    pub const MAX_INDEX: u32 = 9999;

    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Filename for a 1-based frame number, e.g. `frame_0042.jpeg`.
    pub fn file_name(&self, number: u32) -> String {
        format!("{}{:04}.{}", self.prefix, number, self.extension)
    }

    /// Full URL for a 1-based frame number.
    pub fn url(&self, number: u32) -> String {
        let base = self.base_path.trim_end_matches('/');
        format!("{}/{}", base, self.file_name(number))
    }
}

/// One frame to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameAsset {
    /// Full URL of the image
    pub url: String,
    /// Filename (e.g., "frame_0001.jpeg")
    pub name: String,
    /// Internal 0-based slot index
    pub index: usize,
}

impl FrameAsset {
    /// Build the asset for internal slot `index` (on-disk number `index + 1`).
    pub fn for_index(pattern: &FramePattern, index: usize) -> Self {
        let number = (index + 1) as u32;
        Self {
            url: pattern.url(number),
            name: pattern.file_name(number),
            index,
        }
    }
}

/// Load state of a single frame slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// No outcome reported yet
    Unloaded,
    /// Decoded successfully
    Loaded,
    /// Network or decode failure; never holds a bitmap
    Failed,
}

/// A frame slot: its state plus the decoded bitmap when loaded.
#[derive(Clone, Debug)]
pub struct FrameSlot<B> {
    state: SlotState,
    image: Option<B>,
}

impl<B> Default for FrameSlot<B> {
    fn default() -> Self {
        Self {
            state: SlotState::Unloaded,
            image: None,
        }
    }
}

impl<B: Bitmap> FrameSlot<B> {
    #[inline]
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// The bitmap, only for `Loaded` slots.
    #[inline]
    pub fn image(&self) -> Option<&B> {
        self.image.as_ref()
    }

    /// Intrinsic (width, height) of the loaded bitmap.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| (img.width(), img.height()))
    }

    /// Whether an outcome (success or failure) has been recorded.
    #[inline]
    pub fn is_attempted(&self) -> bool {
        self.state != SlotState::Unloaded
    }

    pub(crate) fn set_loaded(&mut self, image: B) {
        self.state = SlotState::Loaded;
        self.image = Some(image);
    }

    pub(crate) fn set_failed(&mut self) {
        self.state = SlotState::Failed;
        self.image = None;
    }

    pub(crate) fn release(&mut self) {
        self.image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Img(u32, u32);

    impl Bitmap for Img {
        fn width(&self) -> u32 {
            self.0
        }
        fn height(&self) -> u32 {
            self.1
        }
    }

    #[test]
    fn test_default_pattern_urls() {
        let pattern = FramePattern::default();
        assert_eq!(pattern.url(1), "/FRAMES/frame_0001.jpeg");
        assert_eq!(pattern.url(120), "/FRAMES/frame_0120.jpeg");
        assert_eq!(FramePattern::new("https://cdn.example/seq/").url(7), "https://cdn.example/seq/frame_0007.jpeg");
    }

    #[test]
    fn test_asset_is_one_based_on_disk() {
        let asset = FrameAsset::for_index(&FramePattern::default(), 0);
        assert_eq!(asset.index, 0);
        assert_eq!(asset.name, "frame_0001.jpeg");

        let last = FrameAsset::for_index(&FramePattern::default(), 119);
        assert_eq!(last.url, "/FRAMES/frame_0120.jpeg");
    }

    #[test]
    fn test_slot_transitions() {
        let mut slot: FrameSlot<Img> = FrameSlot::default();
        assert_eq!(slot.state(), SlotState::Unloaded);
        assert!(!slot.is_attempted());
        assert!(slot.image().is_none());

        slot.set_loaded(Img(640, 360));
        assert_eq!(slot.state(), SlotState::Loaded);
        assert_eq!(slot.dimensions(), Some((640, 360)));

        slot.set_failed();
        assert_eq!(slot.state(), SlotState::Failed);
        assert!(slot.image().is_none());
        assert!(slot.is_attempted());
    }
}
