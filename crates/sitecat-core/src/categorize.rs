//! Batch categorization over URL lists.
//!
//! Two of the three categorization modes live here: automatic (patterns
//! only, master list collected from the batch) and manual (patterns checked
//! against a user-supplied category list). Semantic reconciliation needs an
//! embedding provider and lives in the `sitecat-ai` crate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detect::{Detection, detect};
use crate::taxonomy::{FALLBACK_CONFIDENCE, OTHER};

/// Classification of a single URL. Immutable once produced.
///
/// Confidence encoding: 1.0 = exact keyword or master-list match, 0.5 =
/// accepted fallback, 0.0 = no match ("Other"), [0.6, 1.0) = semantic
/// similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub url: String,
    pub category: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(url: &str, category: impl Into<String>, confidence: f32) -> Self {
        Self {
            url: url.to_string(),
            category: category.into(),
            confidence,
        }
    }

    /// The `("Other", 0.0)` result for an undetermined URL.
    pub fn other(url: &str) -> Self {
        Self::new(url, OTHER, 0.0)
    }
}

/// Categorize a batch by URL patterns alone.
///
/// Returns per-URL classifications in input order, plus the master category
/// list: the deduplicated set of concrete labels observed across the batch,
/// sorted alphabetically. Undetermined URLs become `("Other", 0.0)` and do
/// not join the master list.
pub fn categorize_automatic<S: AsRef<str>>(urls: &[S]) -> (Vec<Classification>, Vec<String>) {
    let mut observed: BTreeSet<&'static str> = BTreeSet::new();
    let mut results = Vec::with_capacity(urls.len());

    for url in urls {
        let url = url.as_ref();
        match detect(url) {
            Detection::Category(label) => {
                debug!(url, label, "pattern match");
                observed.insert(label);
                results.push(Classification::new(url, label, 1.0));
            }
            Detection::Undetermined => {
                debug!(url, "no pattern match");
                results.push(Classification::other(url));
            }
        }
    }

    let master = observed.into_iter().map(String::from).collect();
    (results, master)
}

/// Categorize a batch against a fixed, user-supplied category list.
///
/// A detected label that is literally present in `allowed` gets confidence
/// 1.0. An undetermined URL becomes `("Other", 0.0)`. A detected label
/// absent from `allowed` is kept as-is at confidence 0.5 rather than being
/// collapsed to "Other" — intentionally different from semantic
/// reconciliation, which only keeps raw labels below the similarity
/// threshold.
pub fn categorize_manual<S, C>(urls: &[S], allowed: &[C]) -> Vec<Classification>
where
    S: AsRef<str>,
    C: AsRef<str>,
{
    urls.iter()
        .map(|url| {
            let url = url.as_ref();
            match detect(url) {
                Detection::Category(label) => {
                    if allowed.iter().any(|c| c.as_ref() == label) {
                        Classification::new(url, label, 1.0)
                    } else {
                        debug!(url, label, "detected label not in allowed list");
                        Classification::new(url, label, FALLBACK_CONFIDENCE)
                    }
                }
                Detection::Undetermined => Classification::other(url),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automatic_end_to_end_example() {
        let urls = [
            "https://site.com/",
            "https://site.com/shop/shoes",
            "https://site.com/blog/post-1",
            "https://site.com/xyz123",
        ];

        let (results, master) = categorize_automatic(&urls);

        let categories: Vec<&str> = results.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(categories, vec!["Homepage", "Product", "Blog", "Other"]);

        assert_eq!(results[0].confidence, 1.0);
        assert_eq!(results[1].confidence, 1.0);
        assert_eq!(results[2].confidence, 1.0);
        assert_eq!(results[3].confidence, 0.0);

        // Alphabetical, and "Other" never joins the master list.
        assert_eq!(master, vec!["Blog", "Homepage", "Product"]);
    }

    #[test]
    fn automatic_results_preserve_input_order() {
        let urls = [
            "https://site.com/blog",
            "https://site.com/",
            "https://site.com/blog/again",
        ];
        let (results, _) = categorize_automatic(&urls);
        let got: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(got, urls.to_vec());
    }

    #[test]
    fn automatic_master_list_is_deterministic() {
        let urls = [
            "https://site.com/wishlist",
            "https://site.com/blog",
            "https://site.com/",
        ];
        let (_, first) = categorize_automatic(&urls);
        let (_, second) = categorize_automatic(&urls);
        assert_eq!(first, second);
        assert_eq!(first, vec!["Blog", "Homepage", "Wishlist"]);
    }

    #[test]
    fn automatic_empty_input() {
        let (results, master) = categorize_automatic::<&str>(&[]);
        assert!(results.is_empty());
        assert!(master.is_empty());
    }

    #[test]
    fn manual_confidence_one_iff_allowed() {
        let allowed = ["Homepage", "Blog"];
        let results = categorize_manual(
            &["https://site.com/", "https://site.com/blog", "https://site.com/contact"],
            &allowed,
        );

        assert_eq!(results[0].category, "Homepage");
        assert_eq!(results[0].confidence, 1.0);

        assert_eq!(results[1].category, "Blog");
        assert_eq!(results[1].confidence, 1.0);

        // Detected but not allowed: raw label kept at the fallback
        // confidence, not collapsed to "Other".
        assert_eq!(results[2].category, "Contact");
        assert_eq!(results[2].confidence, 0.5);
    }

    #[test]
    fn manual_undetermined_is_other() {
        let results = categorize_manual(&["https://site.com/xyz123"], &["Homepage"]);
        assert_eq!(results[0].category, "Other");
        assert_eq!(results[0].confidence, 0.0);
    }

    #[test]
    fn manual_membership_is_case_sensitive() {
        let results = categorize_manual(&["https://site.com/blog"], &["blog"]);
        assert_eq!(results[0].category, "Blog");
        assert_eq!(results[0].confidence, 0.5);
    }

    #[test]
    fn manual_empty_inputs() {
        assert!(categorize_manual::<&str, &str>(&[], &["Homepage"]).is_empty());

        let results = categorize_manual(&["https://site.com/blog"], &[] as &[&str]);
        assert_eq!(results[0].category, "Blog");
        assert_eq!(results[0].confidence, 0.5);
    }

    #[test]
    fn classification_serializes_round_trip() {
        let c = Classification::new("https://site.com/blog", "Blog", 1.0);
        let json = serde_json::to_string(&c).unwrap();
        let back: Classification = serde_json::from_str(&json).unwrap();
        assert_eq!(back.url, c.url);
        assert_eq!(back.category, c.category);
        assert_eq!(back.confidence, c.confidence);
    }
}
