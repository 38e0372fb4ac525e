//! Held-out confusion counts and the per-class scores derived from them.

use std::fmt;

use crate::error::RfError;

/// Square count table, rows indexed by actual class, columns by predicted class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

/// Scores for one class, read off a [`ConfusionMatrix`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassMetrics {
    /// The class index.
    pub class: usize,
    /// TP / (TP + FP). 0.0 if the class was never predicted.
    pub precision: f64,
    /// TP / (TP + FN). 0.0 if the class has no true samples.
    pub recall: f64,
    /// Harmonic mean of precision and recall. 0.0 if both are zero.
    pub f1: f64,
    /// Rows whose actual class is this one.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Tally `predicted` against `true_labels`, both class indices below `n_classes`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::LengthMismatch`] | the slices differ in length |
    /// | [`RfError::EmptyDataset`] | zero labels provided |
    /// | [`RfError::LabelOutOfRange`] | a label is `>= n_classes` |
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, RfError> {
        if true_labels.len() != predicted.len() {
            return Err(RfError::LengthMismatch {
                n_predicted: predicted.len(),
                n_truth: true_labels.len(),
            });
        }
        if true_labels.is_empty() {
            return Err(RfError::EmptyDataset);
        }
        let mut counts = vec![vec![0; n_classes]; n_classes];
        for (sample_index, (&t, &p)) in true_labels.iter().zip(predicted).enumerate() {
            if let Some(label) = [t, p].into_iter().find(|&l| l >= n_classes) {
                return Err(RfError::LabelOutOfRange {
                    sample_index,
                    label,
                    n_classes,
                });
            }
            counts[t][p] += 1;
        }
        Ok(Self { counts })
    }

    /// Share of the diagonal in the total count.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let hits = self.counts.iter().enumerate().map(|(c, row)| row[c]).sum();
        ratio(hits, self.total())
    }

    /// Total number of samples counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// One [`ClassMetrics`] per class, in class-index order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        self.counts
            .iter()
            .enumerate()
            .map(|(c, row)| {
                let hits = row[c];
                let support: usize = row.iter().sum();
                let called: usize = self.counts.iter().map(|r| r[c]).sum();
                let precision = ratio(hits, called);
                let recall = ratio(hits, support);
                let f1 = harmonic_mean(precision, recall);
                ClassMetrics {
                    class: c,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Row-normalised proportions: each true class's row sums to 1.
    ///
    /// Rows of classes with no true samples stay all zero.
    #[must_use]
    pub fn normalized(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let support: usize = row.iter().sum();
                row.iter().map(|&count| ratio(count, support)).collect()
            })
            .collect()
    }

    /// Raw counts, one row per actual class.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.counts
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a + b > 0.0 { 2.0 * a * b / (a + b) } else { 0.0 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total().to_string().len().max(4);
        write!(f, "actual\\pred")?;
        for c in 0..self.n_classes() {
            write!(f, " {c:>width$}")?;
        }
        writeln!(f)?;
        for (c, row) in self.counts.iter().enumerate() {
            write!(f, "{c:>11}")?;
            for count in row {
                write!(f, " {count:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
