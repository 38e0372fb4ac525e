//! Accuracy and the per-class classification report.

use std::fmt;

use tracing::instrument;

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;

/// Fraction of predictions equal to the true label.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::LengthMismatch`] | the slices differ in length |
/// | [`RfError::EmptyDataset`] | both slices are empty |
pub fn accuracy(predicted: &[usize], truth: &[usize]) -> Result<f64, RfError> {
    if predicted.len() != truth.len() {
        return Err(RfError::LengthMismatch {
            n_predicted: predicted.len(),
            n_truth: truth.len(),
        });
    }
    if truth.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Precision, recall and F1 for one named class.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassReport {
    /// Class name.
    pub name: String,
    /// TP / (TP + FP).
    pub precision: f64,
    /// TP / (TP + FN).
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// True samples of this class.
    pub support: usize,
}

/// Unweighted or support-weighted mean of the per-class scores.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct AverageScores {
    /// Mean precision.
    pub precision: f64,
    /// Mean recall.
    pub recall: f64,
    /// Mean F1.
    pub f1: f64,
}

/// Per-class metrics with accuracy and macro/weighted averages.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClassificationReport {
    /// One entry per class, in class-index order.
    pub classes: Vec<ClassReport>,
    /// Overall accuracy.
    pub accuracy: f64,
    /// Unweighted mean over classes.
    pub macro_avg: AverageScores,
    /// Mean over classes weighted by support.
    pub weighted_avg: AverageScores,
    /// Total number of samples scored.
    pub support: usize,
}

impl ClassificationReport {
    /// Build the report from a confusion matrix and the class names it indexes.
    ///
    /// Names beyond the matrix width are ignored; missing names fall back to
    /// the class index.
    #[must_use]
    pub fn from_confusion(confusion: &ConfusionMatrix, class_names: &[String]) -> Self {
        let classes: Vec<ClassReport> = confusion
            .class_metrics()
            .into_iter()
            .map(|m| ClassReport {
                name: class_names
                    .get(m.class)
                    .cloned()
                    .unwrap_or_else(|| m.class.to_string()),
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect();

        let support = confusion.total();
        let n = classes.len().max(1) as f64;
        let macro_avg = AverageScores {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
        };
        let weight = |c: &ClassReport| c.support as f64 / support.max(1) as f64;
        let weighted_avg = AverageScores {
            precision: classes.iter().map(|c| c.precision * weight(c)).sum(),
            recall: classes.iter().map(|c| c.recall * weight(c)).sum(),
            f1: classes.iter().map(|c| c.f1 * weight(c)).sum(),
        };

        Self {
            classes,
            accuracy: confusion.accuracy(),
            macro_avg,
            weighted_avg,
            support,
        }
    }
}

/// Score `predicted` against `truth` per class.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::LengthMismatch`] | the slices differ in length |
/// | [`RfError::EmptyDataset`] | both slices are empty |
/// | [`RfError::LabelOutOfRange`] | a label has no class name |
#[instrument(skip_all, fields(n = truth.len(), n_classes = class_names.len()))]
pub fn classification_report(
    predicted: &[usize],
    truth: &[usize],
    class_names: &[String],
) -> Result<ClassificationReport, RfError> {
    let confusion = ConfusionMatrix::from_labels(truth, predicted, class_names.len())?;
    Ok(ClassificationReport::from_confusion(&confusion, class_names))
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.name.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (label, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}
