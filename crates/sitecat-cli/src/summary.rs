//! Category distribution summaries and client-vs-competitor comparison.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use sitecat_core::Classification;

const LABEL_WIDTH: usize = 20;

/// Category counts for one dataset, sorted by descending count (ties
/// alphabetical).
pub struct CategoryCounts {
    entries: Vec<(String, usize)>,
    total: usize,
}

impl CategoryCounts {
    pub fn from_results(results: &[Classification]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for r in results {
            *counts.entry(r.category.as_str()).or_insert(0) += 1;
        }

        let mut entries: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(cat, n)| (cat.to_string(), n))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            entries,
            total: results.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Count for one category (0 when absent).
    pub fn get(&self, category: &str) -> usize {
        self.entries
            .iter()
            .find(|(cat, _)| cat == category)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// All `(category, count)` entries in display order.
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    /// The `n` most frequent categories.
    pub fn top(&self, n: usize) -> &[(String, usize)] {
        &self.entries[..self.entries.len().min(n)]
    }

    /// Percentage share of one count against the dataset total.
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

/// Render one dataset's distribution as an aligned text table.
pub fn render_distribution(name: &str, counts: &CategoryCounts) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{name} — {} URLs", counts.total());
    for (category, n) in counts.entries() {
        let _ = writeln!(
            out,
            "  {category:<LABEL_WIDTH$} {n:>6}  ({:5.1}%)",
            counts.percent(*n)
        );
    }
    out
}

/// Render a comparison table across datasets, one count column per dataset,
/// over the sorted union of observed categories.
pub fn render_comparison(datasets: &[(String, CategoryCounts)]) -> String {
    let categories: BTreeSet<&str> = datasets
        .iter()
        .flat_map(|(_, counts)| counts.entries().iter().map(|(cat, _)| cat.as_str()))
        .collect();

    let mut out = String::new();

    let _ = write!(out, "{:<LABEL_WIDTH$}", "Category");
    for (name, _) in datasets {
        let _ = write!(out, " {name:>14}");
    }
    let _ = writeln!(out);

    for category in categories {
        let _ = write!(out, "{category:<LABEL_WIDTH$}");
        for (_, counts) in datasets {
            let _ = write!(out, " {:>14}", counts.get(category));
        }
        let _ = writeln!(out);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, category: &str) -> Classification {
        Classification::new(url, category, 1.0)
    }

    #[test]
    fn counts_sorted_by_frequency_then_name() {
        let results = vec![
            result("a", "Blog"),
            result("b", "Product"),
            result("c", "Product"),
            result("d", "About"),
        ];
        let counts = CategoryCounts::from_results(&results);

        let entries: Vec<(&str, usize)> = counts
            .entries()
            .iter()
            .map(|(c, n)| (c.as_str(), *n))
            .collect();
        assert_eq!(
            entries,
            vec![("Product", 2), ("About", 1), ("Blog", 1)]
        );
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn get_missing_category_is_zero() {
        let counts = CategoryCounts::from_results(&[result("a", "Blog")]);
        assert_eq!(counts.get("Blog"), 1);
        assert_eq!(counts.get("Product"), 0);
    }

    #[test]
    fn top_truncates() {
        let results = vec![
            result("a", "Blog"),
            result("b", "Product"),
            result("c", "Product"),
        ];
        let counts = CategoryCounts::from_results(&results);
        assert_eq!(counts.top(1).len(), 1);
        assert_eq!(counts.top(1)[0].0, "Product");
        assert_eq!(counts.top(10).len(), 2);
    }

    #[test]
    fn percent_of_empty_dataset_is_zero() {
        let counts = CategoryCounts::from_results(&[]);
        assert_eq!(counts.percent(0), 0.0);
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn distribution_includes_percentages() {
        let results = vec![
            result("a", "Blog"),
            result("b", "Blog"),
            result("c", "Product"),
            result("d", "Product"),
        ];
        let rendered = render_distribution("client", &CategoryCounts::from_results(&results));

        assert!(rendered.contains("client — 4 URLs"));
        assert!(rendered.contains("Blog"));
        assert!(rendered.contains("50.0%"));
    }

    #[test]
    fn comparison_covers_category_union() {
        let client = CategoryCounts::from_results(&[result("a", "Blog")]);
        let comp = CategoryCounts::from_results(&[result("b", "Product")]);

        let rendered = render_comparison(&[
            ("client".to_string(), client),
            ("competitor_1".to_string(), comp),
        ]);

        let mut lines = rendered.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("client"));
        assert!(header.contains("competitor_1"));

        // Union of categories, alphabetical.
        let rows: Vec<&str> = lines.collect();
        assert!(rows[0].starts_with("Blog"));
        assert!(rows[1].starts_with("Product"));
    }
}
