//! Error types shared across the crate.

use crate::parser::ParseError;

/// Result alias used throughout the crate.
pub type ScrubResult<T> = Result<T, ScrubError>;

/// Errors produced while loading, configuring or drawing frames.
///
/// None of these are fatal to the host page: load errors are absorbed by the
/// frame set and surface errors turn draws into no-ops.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScrubError {
    #[error("load error: {url}: {reason}")]
    Load { url: String, reason: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("offset error: {0}")]
    Parse(#[from] ParseError),

    #[error("web error: {0}")]
    Web(String),
}

impl ScrubError {
    pub fn load(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn web(msg: impl Into<String>) -> Self {
        Self::Web(msg.into())
    }
}

#[cfg(feature = "web")]
impl From<wasm_bindgen::JsValue> for ScrubError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        let msg = value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}"));
        Self::Web(msg)
    }
}
