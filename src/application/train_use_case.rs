// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Load train / test images   (Layer 4 - data)
//   Step 2: Build the network          (Layer 5 - ml)
//   Step 3: Save config for inference  (Layer 6 - infra)
//   Step 4: Two-phase fit              (Layer 5 - ml)
//   Step 5: Plot the history           (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use std::path::PathBuf;

use crate::application::datasets::{load_split, DatasetSource};
use crate::infra::metrics::TrainingHistory;
use crate::ml::{
    default_device,
    network::{FitOptions, NetworkConfig, OcrNetwork},
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub dataset:      DatasetSource,
    pub test_dir:     Option<PathBuf>,
    /// Overrides the class count derived from the dataset
    pub classes:      Option<usize>,
    pub limit:        Option<usize>,
    pub val_fraction: f64,
    pub network:      NetworkConfig,
    pub fit:          FitOptions,
    pub plot_dir:     Option<PathBuf>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainingHistory> {
        let cfg = &self.config;

        // ── Step 1: Load images ───────────────────────────────────────────────
        let split = load_split(
            &cfg.dataset,
            cfg.test_dir.as_ref(),
            cfg.limit,
            cfg.val_fraction,
            cfg.fit.seed,
        )?;

        // ── Step 2: Build the network ─────────────────────────────────────────
        let network_cfg = NetworkConfig {
            num_classes: cfg.classes.unwrap_or(split.num_classes),
            ..cfg.network.clone()
        };
        let mut network = OcrNetwork::<TrainBackend>::new(network_cfg, default_device())?;

        // ── Step 3: Save config ───────────────────────────────────────────────
        network.save_config()?;

        // ── Step 4: Fit ───────────────────────────────────────────────────────
        let history = network.fit(&split.train, &split.test, &cfg.fit)?;
        tracing::info!("Best weights at '{}'", network.checkpoint_path().display());

        // ── Step 5: Plot ──────────────────────────────────────────────────────
        if let Some(dir) = &cfg.plot_dir {
            network.plot_history(dir)?;
        }

        Ok(history)
    }
}
