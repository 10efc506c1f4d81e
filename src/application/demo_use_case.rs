// ============================================================
// Layer 2 — Demo Use Case
// ============================================================
// End-to-end walk through the wrapper on MNIST:
//
//   10 classes, 2 epochs, model "test", window 1, keep any
//   existing checkpoint → fit → predict → evaluate → plot

use anyhow::Result;
use std::path::PathBuf;

use crate::application::datasets::{load_split, DatasetSource, MNIST_CLASSES};
use crate::infra::metrics::Score;
use crate::ml::{
    default_device,
    network::{FitOptions, NetworkConfig, OcrNetwork},
    TrainBackend,
};

pub struct DemoConfig {
    pub model_dir: String,
    pub plot_dir:  PathBuf,
    /// Images per MNIST split; `None` uses all of them
    pub limit:     Option<usize>,
}

/// What the demo produced, for the CLI to print.
/// `predictions` and `labels` cover the whole test split.
pub struct DemoReport {
    pub predictions: Vec<usize>,
    pub labels:      Vec<Option<usize>>,
    pub score:       Score,
    pub plots:       Vec<PathBuf>,
}

impl DemoReport {
    /// Predictions that match their label
    pub fn correct(&self) -> usize {
        self.predictions
            .iter()
            .zip(&self.labels)
            .filter(|(p, l)| **l == Some(**p))
            .count()
    }
}

pub struct DemoUseCase {
    config: DemoConfig,
}

impl DemoUseCase {
    pub fn new(config: DemoConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<DemoReport> {
        let split = load_split(&DatasetSource::Mnist, None, self.config.limit, 0.0, 1337)?;

        let network_cfg = NetworkConfig {
            epochs:     2,
            model_dir:  self.config.model_dir.clone(),
            model_name: "test".to_string(),
            ..NetworkConfig::new(MNIST_CLASSES)
        };
        let mut network = OcrNetwork::<TrainBackend>::new(network_cfg, default_device())?;
        network.save_config()?;

        let options = FitOptions {
            force_retrain: false,
            verbose:       true,
            window_size:   Some(1),
            ..FitOptions::default()
        };
        network.fit(&split.train, &split.test, &options)?;

        let images: Vec<_> = split.test.iter().map(|l| l.image.clone()).collect();
        let predictions    = network.predict(&images)?;
        let labels         = split.test.iter().map(|l| l.label).collect();

        let score = network.evaluate(&split.test)?;
        let plots = network.plot_history(&self.config.plot_dir)?;

        Ok(DemoReport { predictions, labels, score, plots })
    }
}
