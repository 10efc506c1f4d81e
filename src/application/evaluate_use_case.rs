// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Rebuilds a trained network from its saved config and scores
// it on a labelled test set.

use anyhow::Result;
use std::path::PathBuf;

use crate::application::datasets::{load_test_set, DatasetSource};
use crate::infra::metrics::Score;
use crate::ml::{default_device, network::OcrNetwork, TrainBackend};

pub struct EvaluateUseCase {
    network: OcrNetwork<TrainBackend>,
}

impl EvaluateUseCase {
    pub fn new(model_dir: &str, model_name: &str) -> Result<Self> {
        let network = OcrNetwork::from_checkpoint(model_dir, model_name, default_device())?;
        Ok(Self { network })
    }

    pub fn evaluate(
        &self,
        dataset:  &DatasetSource,
        test_dir: Option<&PathBuf>,
        limit:    Option<usize>,
        seed:     u64,
    ) -> Result<Score> {
        let images = load_test_set(dataset, test_dir, limit, seed)?;
        tracing::info!("Evaluating on {} images", images.len());
        self.network.evaluate(&images)
    }
}
