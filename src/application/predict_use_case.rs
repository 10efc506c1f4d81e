// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Classifies loose image files with a trained network.
// Class names are resolved from an image folder when one is
// given, otherwise the class index is reported.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::data::loader::{ImageFileLoader, ImageFolderLoader};
use crate::domain::traits::ImageSource;
use crate::ml::{default_device, network::OcrNetwork, TrainBackend};

/// One classified file.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub path:       PathBuf,
    pub class:      usize,
    pub class_name: Option<String>,
    pub confidence: f32,
}

pub struct PredictUseCase {
    network:     OcrNetwork<TrainBackend>,
    class_names: Vec<String>,
}

impl PredictUseCase {
    pub fn new(model_dir: &str, model_name: &str, classes_from: Option<&Path>) -> Result<Self> {
        let network     = OcrNetwork::from_checkpoint(model_dir, model_name, default_device())?;
        let class_names = match classes_from {
            Some(dir) => ImageFolderLoader::new(dir).class_names()?,
            None      => Vec::new(),
        };
        Ok(Self { network, class_names })
    }

    pub fn predict(&self, paths: &[PathBuf]) -> Result<Vec<Prediction>> {
        let images: Vec<_> = ImageFileLoader::new(paths)
            .load_all()?
            .into_iter()
            .map(|l| l.image)
            .collect();

        let probs = self.network.predict_proba(&images)?;
        Ok(paths
            .iter()
            .zip(probs)
            .map(|(path, row)| {
                let (class, confidence) = row
                    .iter()
                    .copied()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });
                Prediction {
                    path: path.clone(),
                    class,
                    class_name: self.class_names.get(class).cloned(),
                    confidence,
                }
            })
            .collect())
    }
}
