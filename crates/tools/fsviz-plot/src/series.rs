//! Named numeric series aligned to category labels.

/// A named sequence of values, one per category.
///
/// The label and value sequences always have the same length and keep the
/// order they had in the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    name: String,
    labels: Vec<String>,
    values: Vec<f64>,
}

impl MetricSeries {
    /// Pair `labels` with `values`. Returns `None` when the lengths differ.
    pub fn new(name: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Option<Self> {
        if labels.len() != values.len() {
            return None;
        }
        Some(Self {
            name: name.into(),
            labels,
            values,
        })
    }

    /// Series name, used as the legend entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category labels in input order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Values in input order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the series has no categories.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Apply `f` to every value, keeping name and labels.
    #[must_use]
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            name: self.name.clone(),
            labels: self.labels.clone(),
            values: self.values.iter().copied().map(f).collect(),
        }
    }
}
