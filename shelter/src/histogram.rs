//! Breed frequency counts for the dashboard's bar chart.

use std::collections::HashMap;

use serde::Serialize;

use crate::{Record, Value};

/// The field aggregated by [`histogram`].
pub const BREED_FIELD: &str = "breed";

/// Bucket for records without a usable breed.
pub const UNKNOWN_BREED: &str = "Unknown";

/// Breed names paired with how many records carry them, most frequent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Histogram(Vec<(String, usize)>);

impl Histogram {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts. Always equals the number of records aggregated.
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn as_slice(&self) -> &[(String, usize)] {
        &self.0
    }
}

/// Count the records per breed.
///
/// Records whose breed is missing or isn't a string are counted under
/// [`UNKNOWN_BREED`]. Breeds are ordered by descending count; equal counts
/// keep the order in which the breeds first appear in `records`.
pub fn histogram(records: &[Record]) -> Histogram {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let breed = record
            .get(BREED_FIELD)
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_BREED);
        match index.get(breed) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(breed, counts.len());
                counts.push((breed.to_string(), 1));
            }
        }
    }
    // Stable, so ties stay in first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Histogram(counts)
}

/// Everything a charting layer needs to draw the breed bar chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub categories: Vec<String>,
    pub counts: Vec<usize>,
}

impl BarChart {
    pub const TITLE: &'static str = "Preferred Dog Breeds";

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl From<&Histogram> for BarChart {
    fn from(h: &Histogram) -> Self {
        let (categories, counts) = h.as_slice().iter().cloned().unzip();
        Self {
            title: Self::TITLE.to_string(),
            x_title: "Breed".to_string(),
            y_title: "Count".to_string(),
            categories,
            counts,
        }
    }
}
