// ============================================================
// Layer 5 — OCR Network
// ============================================================
// The wrapper the rest of the application talks to:
//
//   new            → fresh model, then quietly try the checkpoint
//   fit            → augmented epochs, reload best, plain epochs,
//                    reload best
//   evaluate       → [loss, accuracy, precision, recall, mae]
//   predict        → class index per image
//   plot_history   → PNG learning curves of the last fit
//
// Best-weight selection: after every epoch the validation
// accuracy goes through one BestCheckpoint that lives for the
// whole fit call; the weights file is rewritten only when it
// improves. Reloading after each phase means the network always
// leaves fit() holding the best weights seen, not the last.

use anyhow::{bail, Result};
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, Optimizer},
    tensor::backend::AutodiffBackend,
};
use image::GrayImage;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use burn::data::dataloader::DataLoader;

use crate::data::{
    augmenter::{AugmentationConfig, Augmenter},
    batcher::{OcrBatch, OcrBatcher},
    dataset::OcrSample,
    preprocessor::{Preprocessor, IMG_COLS, IMG_ROWS},
};
use crate::domain::labeled_image::LabeledImage;
use crate::infra::{
    checkpoint::{BestCheckpoint, CheckpointManager},
    metrics::{EpochMetrics, Metric, MetricsLogger, Phase, Score, TrainingHistory},
    plot,
};
use crate::ml::model::{OcrCnn, OcrCnnConfig};
use crate::ml::trainer::{
    argmax_rows, build_loader, evaluate_model, probabilities, resolve_window, train_epoch, PhasePlan,
};

// ─── NetworkConfig ────────────────────────────────────────────────────────────
/// Constructor hyperparameters. Saved next to the weights so
/// `evaluate` / `predict` can rebuild the same architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub num_classes:   usize,
    pub epochs:        usize,
    pub batch_size:    usize,
    pub model_dir:     String,
    pub model_name:    String,
    pub learning_rate: f64,
}

impl NetworkConfig {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            epochs:        50,
            batch_size:    128,
            model_dir:     "checkpoints".to_string(),
            model_name:    "no_name".to_string(),
            learning_rate: 1e-3,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_classes < 2 {
            bail!("A classifier needs at least 2 classes, got {}", self.num_classes);
        }
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if !(self.learning_rate > 0.0) {
            bail!("learning_rate must be positive, got {}", self.learning_rate);
        }
        if self.model_name.is_empty()
            || self.model_name.contains(['/', '\\', '.'])
        {
            bail!("model_name '{}' must be a plain file stem", self.model_name);
        }
        Ok(())
    }

    pub fn model_config(&self) -> OcrCnnConfig {
        OcrCnnConfig::new(self.num_classes)
            .with_img_rows(IMG_ROWS)
            .with_img_cols(IMG_COLS)
    }
}

// ─── FitOptions ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Delete any existing checkpoint and start from random weights
    pub force_retrain: bool,
    /// Print one line per epoch
    pub verbose:       bool,
    /// Plain epochs at the end; `None` draws one at random
    pub window_size:   Option<usize>,
    /// Seeds the window draw, the augmenter and the shuffles
    pub seed:          u64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { force_retrain: true, verbose: false, window_size: None, seed: 1337 }
    }
}

// ─── OcrNetwork ───────────────────────────────────────────────────────────────
pub struct OcrNetwork<B: AutodiffBackend> {
    config:       NetworkConfig,
    model_config: OcrCnnConfig,
    model:        OcrCnn<B>,
    device:       B::Device,
    checkpoints:  CheckpointManager,
    preprocessor: Preprocessor,
    history:      Option<TrainingHistory>,
}

impl<B: AutodiffBackend> OcrNetwork<B> {
    /// Build the network and pick up an existing checkpoint if one is on disk.
    pub fn new(config: NetworkConfig, device: B::Device) -> Result<Self> {
        config.validate()?;
        let model_config = config.model_config();
        let model        = model_config.init(&device);
        let checkpoints  = CheckpointManager::new(&config.model_dir, config.model_name.clone());
        let preprocessor = Preprocessor::new(config.num_classes, model_config.img_rows, model_config.img_cols);

        let mut network = Self {
            config, model_config, model, device, checkpoints, preprocessor,
            history: None,
        };
        network.try_load_from_fs(false)?;
        Ok(network)
    }

    /// Rebuild a network from the config saved by a previous `train`.
    pub fn from_checkpoint(model_dir: &str, model_name: &str, device: B::Device) -> Result<Self> {
        let config = CheckpointManager::new(model_dir, model_name).load_config()?;
        let network = Self::new(config, device)?;
        if !network.checkpoints.exists() {
            tracing::warn!("No weights for '{}', predictions come from random weights", model_name);
        }
        Ok(network)
    }

    pub fn checkpoint_path(&self) -> PathBuf { self.checkpoints.weights_path() }

    pub fn save_config(&self) -> Result<()> {
        self.checkpoints.save_config(&self.config)
    }

    /// Load the checkpoint into the model if it exists.
    /// A missing file is not an error: the current weights are kept.
    pub fn try_load_from_fs(&mut self, verbose: bool) -> Result<bool> {
        if self.checkpoints.exists() {
            self.model = self.checkpoints.load_model(self.model.clone(), &self.device)?;
            tracing::debug!("Weights loaded from '{}'", self.checkpoint_path().display());
            Ok(true)
        } else {
            if verbose {
                tracing::info!("Previous model not found");
            }
            Ok(false)
        }
    }

    /// Fresh random weights; forgets the training history.
    pub fn reset(&mut self) {
        self.model   = self.model_config.init(&self.device);
        self.history = None;
    }

    /// Two-phase training. `test` drives best-checkpoint selection.
    pub fn fit(
        &mut self,
        train:   &[LabeledImage],
        test:    &[LabeledImage],
        options: &FitOptions,
    ) -> Result<TrainingHistory> {
        if train.is_empty() {
            bail!("Cannot fit on an empty training set");
        }
        if test.is_empty() {
            bail!("Cannot fit without validation images");
        }

        if options.force_retrain {
            if !self.checkpoints.remove()? {
                tracing::info!("Older network could not be found, creating a new net...");
            }
            self.reset();
        } else {
            self.try_load_from_fs(true)?;
        }

        let mut rng = StdRng::seed_from_u64(options.seed);
        let window  = resolve_window(options.window_size, self.config.epochs, &mut rng);
        let plan    = PhasePlan::new(self.config.epochs, window);
        tracing::info!("Not pre-processing {} epoch(s)", window);

        let train_samples = self.preprocessor.prepare(train)?;
        let test_samples  = self.preprocessor.prepare(test)?;

        let mut run = FitRun {
            optim:      AdamConfig::new().with_epsilon(1e-8).init::<B, OcrCnn<B>>(),
            best:       BestCheckpoint::new(),
            logger:     MetricsLogger::new(&self.config.model_dir, &self.config.model_name)?,
            val_loader: build_loader::<B::InnerBackend>(
                test_samples,
                self.config.batch_size,
                None,
                self.device.clone(),
                self.model_config.img_rows,
                self.model_config.img_cols,
            ),
            history:    TrainingHistory::default(),
            options:    options.clone(),
        };

        // ── Phase 1: augmented epochs ─────────────────────────────────────────
        let mut augmenter = Augmenter::new(AugmentationConfig::default(), options.seed);
        for epoch in 1..=plan.augmented_epochs {
            let augmented = augmenter.augment_samples(
                &train_samples, self.model_config.img_rows, self.model_config.img_cols,
            )?;
            self.run_epoch(&mut run, Phase::Augmented, epoch, plan.augmented_epochs, augmented)?;
        }
        self.try_load_from_fs(true)?;

        // ── Phase 2: plain epochs ─────────────────────────────────────────────
        for epoch in 1..=plan.plain_epochs {
            self.run_epoch(&mut run, Phase::Plain, epoch, plan.plain_epochs, train_samples.clone())?;
        }
        self.try_load_from_fs(true)?;

        tracing::info!(
            "Training complete, best val_accuracy={:.4}",
            run.best.best().unwrap_or(f64::NAN)
        );
        self.history = Some(run.history.clone());
        Ok(run.history)
    }

    fn run_epoch<O: Optimizer<OcrCnn<B>, B>>(
        &mut self,
        run:     &mut FitRun<B, O>,
        phase:   Phase,
        epoch:   usize,
        epochs:  usize,
        samples: Vec<OcrSample>,
    ) -> Result<()> {
        let shuffle_seed = run.options.seed.wrapping_add(epoch as u64);
        let loader = build_loader::<B>(
            samples,
            self.config.batch_size,
            Some(shuffle_seed),
            self.device.clone(),
            self.model_config.img_rows,
            self.model_config.img_cols,
        );

        let (model, train_score) = train_epoch(
            self.model.clone(), &mut run.optim, &loader,
            self.config.learning_rate, self.config.num_classes,
        )?;
        self.model = model;

        let val_score = evaluate_model(&self.model.valid(), &run.val_loader, self.config.num_classes)?;
        let metrics   = EpochMetrics::new(epoch, train_score, val_score);

        let improved = run.best.observe(val_score.accuracy);
        if improved {
            self.checkpoints.save_model(&self.model)?;
        }

        let line = format!(
            "[{phase}] Epoch {:>3}/{} | loss={:.4} | acc={:.1}% | val_loss={:.4} | val_acc={:.1}%{}",
            epoch, epochs,
            train_score.loss, train_score.accuracy * 100.0,
            val_score.loss, val_score.accuracy * 100.0,
            if improved { " | saved" } else { "" },
        );
        if run.options.verbose {
            println!("{line}");
        } else {
            tracing::debug!("{line}");
        }

        run.logger.log(phase, &metrics)?;
        run.history.push(phase, metrics);
        Ok(())
    }

    /// `[loss, accuracy, precision, recall, mae]` on labelled images.
    pub fn evaluate(&self, images: &[LabeledImage]) -> Result<Score> {
        let samples = self.preprocessor.prepare(images)?;
        if samples.is_empty() {
            bail!("Cannot evaluate on an empty set");
        }
        let loader = self.inference_loader(samples);
        let score  = evaluate_model(&self.model.valid(), &loader, self.config.num_classes)?;

        tracing::info!("Test score: {:.4}", score.loss);
        tracing::info!("Test accuracy: {:.4}", score.accuracy);
        tracing::info!("Test error: {:.2} %", score.error_percent());
        Ok(score)
    }

    /// Most likely class per image.
    pub fn predict(&self, images: &[GrayImage]) -> Result<Vec<usize>> {
        let probs = self.predict_proba(images)?;
        Ok(probs.iter().map(|row| argmax_rows(row, self.config.num_classes)[0]).collect())
    }

    /// Softmax probabilities per image, one row of `num_classes` values each.
    pub fn predict_proba(&self, images: &[GrayImage]) -> Result<Vec<Vec<f32>>> {
        let model   = self.model.valid();
        let batcher = OcrBatcher::<B::InnerBackend>::new(
            self.device.clone(), self.model_config.img_rows, self.model_config.img_cols,
        );

        let pixels = self.preprocessor.prepare_unlabeled(images);
        let mut rows = Vec::with_capacity(pixels.len());
        for chunk in pixels.chunks(self.config.batch_size) {
            let probs = probabilities(model.forward(batcher.images(chunk)))?;
            rows.extend(probs.chunks(self.config.num_classes).map(|r| r.to_vec()));
        }
        Ok(rows)
    }

    /// Render accuracy and precision curves of both phases into `out_dir`.
    pub fn plot_history(&self, out_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let history = match &self.history {
            Some(h) if !h.is_empty() => h,
            _ => {
                tracing::warn!("You need to train the model first!");
                return Ok(Vec::new());
            }
        };

        let mut written = Vec::new();
        for phase in [Phase::Augmented, Phase::Plain] {
            let series = history.phase(phase);
            if series.is_empty() {
                continue;
            }
            for metric in [Metric::Accuracy, Metric::Precision] {
                let path = out_dir.as_ref().join(format!(
                    "{}_{}_{}.png", self.config.model_name, phase, metric.name()
                ));
                plot::plot_history(series, metric, &path)?;
                written.push(path);
            }
        }
        tracing::info!("Wrote {} history plot(s)", written.len());
        Ok(written)
    }

    fn inference_loader(&self, samples: Vec<OcrSample>) -> Arc<dyn DataLoader<OcrBatch<B::InnerBackend>>> {
        build_loader::<B::InnerBackend>(
            samples,
            self.config.batch_size,
            None,
            self.device.clone(),
            self.model_config.img_rows,
            self.model_config.img_cols,
        )
    }
}

/// State shared by every epoch of one fit call.
struct FitRun<B: AutodiffBackend, O> {
    optim:      O,
    best:       BestCheckpoint,
    logger:     MetricsLogger,
    val_loader: Arc<dyn DataLoader<OcrBatch<B::InnerBackend>>>,
    history:    TrainingHistory,
    options:    FitOptions,
}
