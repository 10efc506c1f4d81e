// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Building blocks of one fit call:
//
//   resolve_window  — how many final epochs skip augmentation
//   PhasePlan       — epochs per phase
//   build_loader    — Burn DataLoader over a set of samples
//   train_epoch     — forward, loss, backward, optimiser step
//   evaluate_model  — loss + metrics without gradients
//
// Key Burn insight:
//   - Training runs on an AutodiffBackend for gradients
//   - model.valid() returns the model on the inner backend
//     (dropout disabled), so evaluation loaders are built
//     for B::InnerBackend
//
// Metrics are accumulated on the host from the softmax output
// of every batch (see infra::metrics).

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{activation::softmax, backend::AutodiffBackend},
};
use rand::Rng;
use std::sync::Arc;

use crate::data::{
    batcher::{OcrBatch, OcrBatcher},
    dataset::{OcrDataset, OcrSample},
};
use crate::infra::metrics::{MetricAccumulator, Score};
use crate::ml::model::OcrCnn;

/// Lower bound of a randomly drawn window
const RANDOM_WINDOW_MIN:  usize = 10;
/// Width of the random window range: [10, 50)
const RANDOM_WINDOW_SPAN: usize = 40;

/// Number of plain (non-augmented) epochs.
///
/// `None` draws `10 + U[0, 40)` from `rng`. The result is clamped to
/// `epochs - 1` so at least one augmented epoch always runs.
pub fn resolve_window<R: Rng>(window: Option<usize>, epochs: usize, rng: &mut R) -> usize {
    let window = window.unwrap_or_else(|| RANDOM_WINDOW_MIN + rng.gen_range(0..RANDOM_WINDOW_SPAN));
    window.min(epochs.saturating_sub(1))
}

/// Epoch counts of the two fit phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhasePlan {
    pub augmented_epochs: usize,
    pub plain_epochs:     usize,
}

impl PhasePlan {
    pub fn new(epochs: usize, window: usize) -> Self {
        let plain_epochs = window.min(epochs);
        Self { augmented_epochs: epochs - plain_epochs, plain_epochs }
    }
}

/// DataLoader over `samples`; `shuffle` seeds the per-epoch order.
pub fn build_loader<B: Backend>(
    samples:    Vec<OcrSample>,
    batch_size: usize,
    shuffle:    Option<u64>,
    device:     B::Device,
    img_rows:   usize,
    img_cols:   usize,
) -> Arc<dyn DataLoader<OcrBatch<B>>> {
    let batcher = OcrBatcher::<B>::new(device, img_rows, img_cols);
    let builder = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .num_workers(1);
    let builder = match shuffle {
        Some(seed) => builder.shuffle(seed),
        None       => builder,
    };
    builder.build(OcrDataset::new(samples))
}

/// One pass over `loader` with gradient updates.
/// Returns the updated model and the training Score of the pass.
pub fn train_epoch<B, O>(
    mut model:   OcrCnn<B>,
    optim:       &mut O,
    loader:      &Arc<dyn DataLoader<OcrBatch<B>>>,
    lr:          f64,
    num_classes: usize,
) -> Result<(OcrCnn<B>, Score)>
where
    B: AutodiffBackend,
    O: Optimizer<OcrCnn<B>, B>,
{
    let mut acc = MetricAccumulator::new();

    for batch in loader.iter() {
        let (loss, logits) = model.forward_loss(batch.images, batch.targets);

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        let probs = probabilities(logits.detach())?;
        acc.observe(loss_val, &probs, &batch.labels, num_classes);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(lr, model, grads);
    }

    Ok((model, acc.finish()))
}

/// Loss and metrics of `model` on every batch of `loader`.
/// Pass a model obtained from `.valid()` so dropout is off.
pub fn evaluate_model<B: Backend>(
    model:       &OcrCnn<B>,
    loader:      &Arc<dyn DataLoader<OcrBatch<B>>>,
    num_classes: usize,
) -> Result<Score> {
    let mut acc = MetricAccumulator::new();

    for batch in loader.iter() {
        let (loss, logits) = model.forward_loss(batch.images, batch.targets);
        let loss_val: f64 = loss.into_scalar().elem::<f64>();
        let probs = probabilities(logits)?;
        acc.observe(loss_val, &probs, &batch.labels, num_classes);
    }

    Ok(acc.finish())
}

/// Row-major softmax probabilities on the host.
pub fn probabilities<B: Backend>(logits: Tensor<B, 2>) -> Result<Vec<f32>> {
    softmax(logits, 1)
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))
}

/// Index of the largest value of each `num_classes`-wide row.
pub fn argmax_rows(probs: &[f32], num_classes: usize) -> Vec<usize> {
    probs
        .chunks(num_classes.max(1))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
                .0
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;
    use burn::optim::AdamConfig;
    use rand::{rngs::StdRng, SeedableRng};

    use crate::ml::model::OcrCnnConfig;

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn test_explicit_window_is_clamped() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(resolve_window(Some(1), 2, &mut rng), 1);
        assert_eq!(resolve_window(Some(5), 5, &mut rng), 4);
        assert_eq!(resolve_window(Some(9), 1, &mut rng), 0);
        assert_eq!(resolve_window(Some(0), 10, &mut rng), 0);
    }

    #[test]
    fn test_random_window_range() {
        let mut rng = StdRng::seed_from_u64(1337);
        for _ in 0..200 {
            let w = resolve_window(None, 100, &mut rng);
            assert!((10..50).contains(&w));
        }
        // few epochs → random draw always clamps
        assert_eq!(resolve_window(None, 3, &mut rng), 2);
    }

    #[test]
    fn test_random_window_is_seeded() {
        let a = resolve_window(None, 100, &mut StdRng::seed_from_u64(5));
        let b = resolve_window(None, 100, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_phase_plan() {
        assert_eq!(PhasePlan::new(50, 20), PhasePlan { augmented_epochs: 30, plain_epochs: 20 });
        assert_eq!(PhasePlan::new(2, 1),   PhasePlan { augmented_epochs: 1,  plain_epochs: 1 });
        assert_eq!(PhasePlan::new(1, 0),   PhasePlan { augmented_epochs: 1,  plain_epochs: 0 });
    }

    #[test]
    fn test_argmax_rows() {
        assert_eq!(argmax_rows(&[0.1, 0.7, 0.2, 0.6, 0.3, 0.1], 3), vec![1, 0]);
    }

    #[test]
    fn test_train_then_evaluate_one_epoch() {
        let device = Default::default();
        // 20×20 → conv 17 → pool 8 → conv 4 → pool 1
        let cfg    = OcrCnnConfig::new(2).with_img_rows(20).with_img_cols(20)
            .with_filters1(4).with_filters2(4).with_dense_units(8);
        let model: OcrCnn<TestBackend> = cfg.init(&device);

        let samples: Vec<OcrSample> = (0..6)
            .map(|i| OcrSample::new(vec![if i % 2 == 0 { 0 } else { 255 }; 400], i % 2))
            .collect();

        let train_loader = build_loader::<TestBackend>(samples.clone(), 4, Some(1), Default::default(), 20, 20);
        let mut optim = AdamConfig::new().init();
        let (model, train_score) = train_epoch(model, &mut optim, &train_loader, 1e-3, 2).unwrap();
        assert!(train_score.loss.is_finite());

        let val_loader = build_loader::<NdArray>(samples, 4, None, Default::default(), 20, 20);
        let score = evaluate_model(&model.valid(), &val_loader, 2).unwrap();
        assert!(score.loss.is_finite());
        assert!((0.0..=1.0).contains(&score.accuracy));
    }
}
