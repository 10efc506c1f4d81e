// ============================================================
// Layer 6 — Metrics
// ============================================================
// Everything the training loop reports about itself:
//
//   Score             — loss, accuracy, precision, recall, MAE
//                       for one pass over a dataset
//   MetricAccumulator — builds a Score batch by batch from the
//                       softmax probabilities pulled to the host
//   EpochMetrics      — train + validation Score of one epoch
//   TrainingHistory   — EpochMetrics of both fit phases
//   MetricsLogger     — appends one CSV row per epoch
//
// Precision and recall are computed over the one-hot matrix
// with probabilities rounded at 0.5 (a class counts as
// "predicted" only when the network is more than half sure):
//
//   precision = Σ round(p)·y / Σ round(p)
//   recall    = Σ round(p)·y / Σ y
//   mae       = Σ |p - y| / (N · classes)
//
// Output file: <model_dir>/<model_name>_metrics.csv

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::to_categorical;

// ─── Metric ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Accuracy,
    Precision,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy  => "accuracy",
            Metric::Precision => "precision",
        }
    }
}

// ─── Score ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub loss:      f64,
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub mae:       f64,
}

impl Score {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy  => self.accuracy,
            Metric::Precision => self.precision,
        }
    }

    /// Percentage of misclassified samples
    pub fn error_percent(&self) -> f64 {
        (1.0 - self.accuracy) * 100.0
    }

    /// `[loss, accuracy, precision, recall, mae]`
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.loss, self.accuracy, self.precision, self.recall, self.mae]
    }
}

// ─── MetricAccumulator ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    loss_sum:        f64,
    samples:         usize,
    correct:         usize,
    true_positives:  usize,
    predicted:       usize,
    abs_error_sum:   f64,
    cells:           usize,
}

impl MetricAccumulator {
    pub fn new() -> Self { Self::default() }

    /// Add one batch.
    ///
    /// * `mean_loss` - batch-mean loss (weighted by batch size here)
    /// * `probs`     - row-major softmax output, `labels.len() × num_classes`
    /// * `labels`    - true class per row
    pub fn observe(&mut self, mean_loss: f64, probs: &[f32], labels: &[usize], num_classes: usize) {
        if num_classes == 0 {
            return;
        }
        for (row, &label) in probs.chunks(num_classes).zip(labels) {
            let truth = to_categorical(label, num_classes);
            let mut best = 0;
            for (class, (&p, &y)) in row.iter().zip(&truth).enumerate() {
                if p > row[best] {
                    best = class;
                }
                if p > 0.5 {
                    self.predicted += 1;
                    self.true_positives += y as usize;
                }
                self.abs_error_sum += (p - y).abs() as f64;
                self.cells += 1;
            }
            if best == label {
                self.correct += 1;
            }
        }
        self.loss_sum += mean_loss * labels.len() as f64;
        self.samples  += labels.len();
    }

    pub fn finish(&self) -> Score {
        let ratio = |num: f64, den: usize| if den > 0 { num / den as f64 } else { 0.0 };
        Score {
            loss:      if self.samples > 0 { self.loss_sum / self.samples as f64 } else { f64::NAN },
            accuracy:  ratio(self.correct as f64, self.samples),
            precision: ratio(self.true_positives as f64, self.predicted),
            recall:    ratio(self.true_positives as f64, self.samples),
            mae:       ratio(self.abs_error_sum, self.cells),
        }
    }
}

// ─── Phase / EpochMetrics / TrainingHistory ──────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Epochs fed by the augmentation generator
    Augmented,
    /// Final epochs on the untouched training set
    Plain,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Augmented => write!(f, "augmented"),
            Phase::Plain     => write!(f, "plain"),
        }
    }
}

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number within its phase (starts at 1)
    pub epoch: usize,
    pub train: Score,
    pub val:   Score,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train: Score, val: Score) -> Self {
        Self { epoch, train, val }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub augmented: Vec<EpochMetrics>,
    pub plain:     Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn phase(&self, phase: Phase) -> &[EpochMetrics] {
        match phase {
            Phase::Augmented => &self.augmented,
            Phase::Plain     => &self.plain,
        }
    }

    pub fn push(&mut self, phase: Phase, m: EpochMetrics) {
        match phase {
            Phase::Augmented => self.augmented.push(m),
            Phase::Plain     => self.plain.push(m),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.augmented.is_empty() && self.plain.is_empty()
    }
}

// ─── MetricsLogger ────────────────────────────────────────────────────────────
const CSV_HEADER: &str =
    "phase,epoch,loss,accuracy,precision,recall,mae,val_loss,val_accuracy,val_precision,val_recall,val_mae";

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet,
    /// so repeated runs append to the same log.
    pub fn new(dir: impl AsRef<Path>, model_name: &str) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join(format!("{model_name}_metrics.csv"));
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, phase: Phase, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let (t, v) = (&m.train, &m.val);
        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            phase, m.epoch,
            t.loss, t.accuracy, t.precision, t.recall, t.mae,
            v.loss, v.accuracy, v.precision, v.recall, v.mae,
        )?;

        tracing::debug!(
            "Logged {} epoch {}: loss={:.4}, val_acc={:.4}",
            phase, m.epoch, t.loss, v.accuracy,
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_known_values() {
        let mut acc = MetricAccumulator::new();
        // row 0: confident and right; row 1: unsure, argmax wrong
        let probs  = [0.9, 0.1, 0.4, 0.6];
        let labels = [0, 0];
        acc.observe(0.5, &probs, &labels, 2);
        let s = acc.finish();

        assert!((s.loss - 0.5).abs() < 1e-9);
        assert!((s.accuracy - 0.5).abs() < 1e-9);
        // predicted cells: 0.9 (tp) and 0.6 (fp)
        assert!((s.precision - 0.5).abs() < 1e-9);
        // positives: 2 rows, 1 found
        assert!((s.recall - 0.5).abs() < 1e-9);
        // |0.9-1|+|0.1|+|0.4-1|+|0.6| = 1.4 over 4 cells
        assert!((s.mae - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_loss_weighted_by_batch_size() {
        let mut acc = MetricAccumulator::new();
        acc.observe(1.0, &[1.0, 0.0], &[0], 2);
        acc.observe(4.0, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0], &[0, 0, 0], 2);
        // (1·1 + 4·3) / 4
        assert!((acc.finish().loss - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_accumulator() {
        let s = MetricAccumulator::new().finish();
        assert!(s.loss.is_nan());
        assert_eq!(s.accuracy, 0.0);
        assert_eq!(s.precision, 0.0);
    }

    #[test]
    fn test_error_percent() {
        let s = Score { accuracy: 0.97, ..Score::default() };
        assert!((s.error_percent() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_phases() {
        let mut h = TrainingHistory::default();
        assert!(h.is_empty());
        h.push(Phase::Plain, EpochMetrics::new(1, Score::default(), Score::default()));
        assert!(h.phase(Phase::Augmented).is_empty());
        assert_eq!(h.phase(Phase::Plain).len(), 1);
    }

    #[test]
    fn test_logger_appends_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path(), "digits").unwrap();
        let m = EpochMetrics::new(1, Score::default(), Score { accuracy: 0.5, ..Score::default() });
        logger.log(Phase::Augmented, &m).unwrap();
        logger.log(Phase::Plain, &m).unwrap();

        // re-opening must not rewrite the header
        let again = MetricsLogger::new(tmp.path(), "digits").unwrap();
        let text  = fs::read_to_string(&again.csv_path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("augmented,1,"));
        assert!(lines[2].starts_with("plain,1,"));
    }
}
