pub mod categorize;
pub mod detect;
pub mod taxonomy;

pub use categorize::{Classification, categorize_automatic, categorize_manual};
pub use detect::{DetectError, Detection, detect, try_detect};
pub use taxonomy::{FALLBACK_CONFIDENCE, HOMEPAGE, OTHER, PATTERN_TABLE, SIMILARITY_THRESHOLD};
