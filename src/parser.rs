//! Parsing of scroll boundary offsets such as `"top top"` or `"300 top"`.

/// Error type for offset parsing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Offset string contained no tokens
    #[error("empty offset")]
    Empty,
    /// More than two edge tokens were given
    #[error("too many tokens in offset `{0}`, expected `<element> <viewport>`")]
    TooManyTokens(String),
    /// A token was not a keyword, pixel length or percentage
    #[error("invalid edge `{0}`, expected top, center, bottom, <px> or <percent>%")]
    InvalidEdge(String),
}

/// One side of a scroll boundary, measured from the top of its box.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Absolute distance from the top in CSS pixels
    Pixels(f64),
    /// Fraction of the box height, in percent
    Percent(f64),
}

impl Edge {
    /// Distance of this edge from the top of a box with the given extent.
    #[inline]
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Edge::Top => 0.0,
            Edge::Center => extent / 2.0,
            Edge::Bottom => extent,
            Edge::Pixels(px) => px,
            Edge::Percent(pct) => extent * pct / 100.0,
        }
    }
}

/// A scroll boundary: the point where `element` edge meets `viewport` edge.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollOffset {
    pub element: Edge,
    pub viewport: Edge,
}

impl ScrollOffset {
    pub const fn new(element: Edge, viewport: Edge) -> Self {
        Self { element, viewport }
    }

    /// Pixel offset from the element top, against the viewport top.
    pub const fn pixels(px: f64) -> Self {
        Self::new(Edge::Pixels(px), Edge::Top)
    }
}

impl std::str::FromStr for ScrollOffset {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_offset(s)
    }
}

/// Parse a boundary offset string.
///
/// ## Format
///
/// `<element-edge> [<viewport-edge>]`, where each edge is one of `top`,
/// `center`, `bottom`, a pixel length (`300` or `300px`) or a percentage
/// (`80%`). A missing viewport edge means `top`.
///
/// ## Example
///
/// ```rust
/// use scroll_frames::{parse_offset, Edge};
///
/// let start = parse_offset("top top").unwrap();
/// assert_eq!(start.element, Edge::Top);
/// assert_eq!(start.viewport, Edge::Top);
///
/// let nav = parse_offset("300 top").unwrap();
/// assert_eq!(nav.element, Edge::Pixels(300.0));
/// ```
pub fn parse_offset(s: &str) -> Result<ScrollOffset, ParseError> {
    let mut tokens = s.split_whitespace();

    let element = match tokens.next() {
        Some(token) => parse_edge(token)?,
        None => return Err(ParseError::Empty),
    };
    let viewport = match tokens.next() {
        Some(token) => parse_edge(token)?,
        None => Edge::Top,
    };

    if tokens.next().is_some() {
        return Err(ParseError::TooManyTokens(s.trim().to_string()));
    }

    Ok(ScrollOffset { element, viewport })
}

fn parse_edge(token: &str) -> Result<Edge, ParseError> {
    match token.to_ascii_lowercase().as_str() {
        "top" => return Ok(Edge::Top),
        "center" => return Ok(Edge::Center),
        "bottom" => return Ok(Edge::Bottom),
        _ => {}
    }

    let invalid = || ParseError::InvalidEdge(token.to_string());

    if let Some(pct) = token.strip_suffix('%') {
        let value: f64 = pct.parse().map_err(|_| invalid())?;
        return if value.is_finite() {
            Ok(Edge::Percent(value))
        } else {
            Err(invalid())
        };
    }

    let px = token.strip_suffix("px").unwrap_or(token);
    let value: f64 = px.parse().map_err(|_| invalid())?;
    if value.is_finite() {
        Ok(Edge::Pixels(value))
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_pairs() {
        assert_eq!(
            parse_offset("top top").unwrap(),
            ScrollOffset::new(Edge::Top, Edge::Top)
        );
        assert_eq!(
            parse_offset("bottom top").unwrap(),
            ScrollOffset::new(Edge::Bottom, Edge::Top)
        );
        assert_eq!(
            parse_offset("  Center   BOTTOM ").unwrap(),
            ScrollOffset::new(Edge::Center, Edge::Bottom)
        );
    }

    #[test]
    fn test_lengths_and_percentages() {
        assert_eq!(parse_offset("300 top").unwrap(), ScrollOffset::pixels(300.0));
        assert_eq!(parse_offset("300px top").unwrap(), ScrollOffset::pixels(300.0));
        assert_eq!(
            parse_offset("top 80%").unwrap(),
            ScrollOffset::new(Edge::Top, Edge::Percent(80.0))
        );
        assert_eq!(parse_offset("-20").unwrap(), ScrollOffset::pixels(-20.0));
    }

    #[test]
    fn test_single_token_defaults_viewport_top() {
        let offset = parse_offset("bottom").unwrap();
        assert_eq!(offset.viewport, Edge::Top);
    }

    #[test]
    fn test_invalid_offsets() {
        assert_eq!(parse_offset(""), Err(ParseError::Empty));
        assert_eq!(parse_offset("   "), Err(ParseError::Empty));
        assert!(matches!(
            parse_offset("top top top"),
            Err(ParseError::TooManyTokens(_))
        ));
        assert!(matches!(parse_offset("middle top"), Err(ParseError::InvalidEdge(_))));
        assert!(matches!(parse_offset("top abc%"), Err(ParseError::InvalidEdge(_))));
        assert!(matches!(parse_offset("inf top"), Err(ParseError::InvalidEdge(_))));
    }

    #[test]
    fn test_edge_resolve() {
        assert_eq!(Edge::Top.resolve(800.0), 0.0);
        assert_eq!(Edge::Center.resolve(800.0), 400.0);
        assert_eq!(Edge::Bottom.resolve(800.0), 800.0);
        assert_eq!(Edge::Pixels(120.0).resolve(800.0), 120.0);
        assert_eq!(Edge::Percent(25.0).resolve(800.0), 200.0);
    }
}
