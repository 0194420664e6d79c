//! Mount-time configuration.

use crate::data::FramePattern;
use crate::error::{ScrubError, ScrubResult};
use crate::parser::{parse_offset, ScrollOffset};
use crate::timeline::{ScrollRegion, ScrubLag};

/// The `scrub` setting as written in configuration: `true` or a lag in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ScrubSetting {
    Enabled(bool),
    Seconds(f64),
}

impl Default for ScrubSetting {
    fn default() -> Self {
        ScrubSetting::Seconds(2.0)
    }
}

impl ScrubSetting {
    pub fn lag(self) -> ScrubResult<ScrubLag> {
        match self {
            ScrubSetting::Enabled(true) => Ok(ScrubLag::Immediate),
            ScrubSetting::Enabled(false) => Err(ScrubError::config("scrub cannot be disabled")),
            ScrubSetting::Seconds(secs) if !secs.is_finite() || secs < 0.0 => {
                Err(ScrubError::config(format!("scrub lag must be a non-negative number of seconds, got {secs}")))
            }
            ScrubSetting::Seconds(secs) if secs == 0.0 => Ok(ScrubLag::Immediate),
            ScrubSetting::Seconds(secs) => Ok(ScrubLag::Seconds(secs)),
        }
    }
}

/// A scroll offset as written in configuration: the offset grammar
/// (`"bottom top"`, `"300 top"`) or a bare number of pixels.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum OffsetSetting {
    Text(String),
    Pixels(f64),
}

impl OffsetSetting {
    pub fn resolve(&self) -> ScrubResult<ScrollOffset> {
        match self {
            OffsetSetting::Text(text) => Ok(parse_offset(text)?),
            OffsetSetting::Pixels(px) if px.is_finite() => Ok(ScrollOffset::pixels(*px)),
            OffsetSetting::Pixels(px) => Err(ScrubError::config(format!("offset must be finite, got {px}"))),
        }
    }
}

impl From<&str> for OffsetSetting {
    fn from(text: &str) -> Self {
        OffsetSetting::Text(text.to_string())
    }
}

impl From<f64> for OffsetSetting {
    fn from(px: f64) -> Self {
        OffsetSetting::Pixels(px)
    }
}

/// Unresolved scroll region, as written in configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegionConfig {
    /// CSS selector of the trigger element
    pub trigger: String,
    /// Start boundary, e.g. "top top"
    pub start: OffsetSetting,
    /// End boundary, e.g. "bottom top" or `300`
    pub end: OffsetSetting,
    pub scrub: ScrubSetting,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            trigger: ".scroll-area".to_string(),
            start: "top top".into(),
            end: "bottom top".into(),
            scrub: ScrubSetting::default(),
        }
    }
}

impl RegionConfig {
    /// Parse offsets and lag into a [`ScrollRegion`].
    pub fn resolve(&self) -> ScrubResult<ScrollRegion> {
        if self.trigger.trim().is_empty() {
            return Err(ScrubError::config("trigger selector is empty"));
        }
        Ok(ScrollRegion {
            trigger_selector: self.trigger.trim().to_string(),
            start: self.start.resolve()?,
            end: self.end.resolve()?,
            scrub_lag: self.scrub.lag()?,
        })
    }
}

/// Everything needed to mount the animation.
///
/// All fields are optional in TOML; missing ones take the defaults: 120
/// frames under `/FRAMES`, with the `.scroll-area` element mapped onto the
/// whole sequence and a 2 second scrub lag.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrubConfig {
    pub frame_count: usize,
    pub frames: FramePattern,
    pub region: RegionConfig,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            frame_count: 120,
            frames: FramePattern::default(),
            region: RegionConfig::default(),
        }
    }
}

impl ScrubConfig {
    /// Config for `frame_count` frames under `base_path`, other fields default.
    pub fn new(frame_count: usize, base_path: impl Into<String>) -> Self {
        Self {
            frame_count,
            frames: FramePattern::new(base_path),
            ..Self::default()
        }
    }

    /// Parse a TOML document into a validated `ScrubConfig`.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> ScrubResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ScrubError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check frame count bounds and that the region resolves.
    pub fn validate(&self) -> ScrubResult<()> {
        if self.frame_count == 0 {
            return Err(ScrubError::config("frame_count must be at least 1"));
        }
        if self.frame_count > FramePattern::MAX_INDEX as usize {
            return Err(ScrubError::config(format!(
                "frame_count {} exceeds 4-digit frame numbering",
                self.frame_count
            )));
        }
        self.region.resolve().map(|_| ())
    }
}
