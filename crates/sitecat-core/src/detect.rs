//! URL pattern detection.
//!
//! Maps a single URL to a candidate category label by inspecting only the
//! path component; scheme, host, and query are ignored.
//!
//! # Algorithm
//!
//! 1. Trim and lowercase the URL, then parse it; extract the path and strip
//!    leading/trailing `/`.
//! 2. Empty path → `Homepage`.
//! 3. Match the first path segment against [`PATTERN_TABLE`] in priority
//!    order, by substring containment; first hit wins.
//! 4. No hit but ≥2 path segments → `Product` (deep paths are assumed to be
//!    product detail pages).
//! 5. Otherwise → [`Detection::Undetermined`].
//!
//! Parse failures are inspectable through [`try_detect`]; [`detect`] maps
//! them to `Undetermined` so callers never see an error per URL.

use thiserror::Error;
use url::Url;

use crate::taxonomy::{HOMEPAGE, PATTERN_TABLE, PRODUCT};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("empty url")]
    EmptyUrl,

    #[error("unparseable url: {0}")]
    Parse(#[from] url::ParseError),
}

/// Outcome of pattern detection for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// A concrete category label from the taxonomy.
    Category(&'static str),
    /// No pattern matched; callers map this to `Other` with confidence 0.0.
    Undetermined,
}

impl Detection {
    /// The detected label, if any.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Category(label) => Some(label),
            Self::Undetermined => None,
        }
    }
}

/// Detect a category for `url`, exposing parse failures to the caller.
pub fn try_detect(url: &str) -> Result<Detection, DetectError> {
    let lowered = url.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(DetectError::EmptyUrl);
    }

    let parsed = Url::parse(&lowered)?;
    let path = parsed.path().trim_matches('/');

    if path.is_empty() {
        return Ok(Detection::Category(HOMEPAGE));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(first) = segments.first() else {
        return Ok(Detection::Category(HOMEPAGE));
    };

    for (label, keywords) in PATTERN_TABLE {
        if keywords.iter().any(|kw| first.contains(kw)) {
            return Ok(Detection::Category(label));
        }
    }

    // Deep paths with an unrecognized first segment are usually product
    // detail pages.
    if segments.len() >= 2 {
        return Ok(Detection::Category(PRODUCT));
    }

    Ok(Detection::Undetermined)
}

/// Detect a category for `url`, folding failures into `Undetermined`.
pub fn detect(url: &str) -> Detection {
    try_detect(url).unwrap_or(Detection::Undetermined)
}
