// ============================================================
// Layer 4 — OCR Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<OcrSample>
// into an image tensor plus class targets.
//
// How batching works here:
//   Input:  N samples, each rows*cols u8 pixels
//   Output: images [N, 1, rows, cols] in [0, 1]
//           targets [N] class indices
//
// All samples were resized by the Preprocessor, so every
// pixel buffer has the same length and a flat reshape is enough.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::OcrSample;
use crate::data::preprocessor::normalize;

// ─── OcrBatch ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct OcrBatch<B: Backend> {
    /// Normalised images, shape [batch_size, 1, rows, cols]
    pub images: Tensor<B, 4>,

    /// Class indices, shape [batch_size]
    pub targets: Tensor<B, 1, Int>,

    /// Same class indices kept on the host for metric bookkeeping
    pub labels: Vec<usize>,
}

// ─── OcrBatcher ───────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct OcrBatcher<B: Backend> {
    pub device: B::Device,
    img_rows:   usize,
    img_cols:   usize,
}

impl<B: Backend> OcrBatcher<B> {
    pub fn new(device: B::Device, img_rows: usize, img_cols: usize) -> Self {
        Self { device, img_rows, img_cols }
    }

    /// Stack raw pixel buffers into a normalised `[N, 1, rows, cols]` tensor.
    /// Also used directly by prediction, where there are no targets.
    pub fn images<P: AsRef<[u8]>>(&self, pixels: &[P]) -> Tensor<B, 4> {
        let batch_size = pixels.len();
        let flat: Vec<f32> = pixels
            .iter()
            .flat_map(|p| normalize(p.as_ref()))
            .collect();

        Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([batch_size, 1, self.img_rows, self.img_cols])
    }
}

impl<B: Backend> Batcher<OcrSample, OcrBatch<B>> for OcrBatcher<B> {
    fn batch(&self, items: Vec<OcrSample>) -> OcrBatch<B> {
        let pixels: Vec<&[u8]> = items.iter().map(|s| s.pixels.as_slice()).collect();
        let images = self.images(&pixels);

        let labels: Vec<usize> = items.iter().map(|s| s.label).collect();
        let targets_i32: Vec<i32> = labels.iter().map(|&l| l as i32).collect();
        let targets = Tensor::<B, 1, Int>::from_ints(targets_i32.as_slice(), &self.device);

        OcrBatch { images, targets, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_scaling() {
        let batcher = OcrBatcher::<TestBackend>::new(Default::default(), 2, 3);
        let items = vec![
            OcrSample::new(vec![255; 6], 1),
            OcrSample::new(vec![0; 6], 0),
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [2, 1, 2, 3]);
        assert_eq!(batch.targets.dims(), [2]);
        assert_eq!(batch.labels, vec![1, 0]);

        let total: f32 = batch.images.sum().into_scalar().elem::<f32>();
        assert!((total - 6.0).abs() < 1e-5);
    }
}
