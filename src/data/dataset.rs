use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One preprocessed sample at the network resolution.
/// Pixels are row-major 8-bit grayscale; `label` is the class index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSample {
    pub pixels: Vec<u8>,
    pub label:  usize,
}

impl OcrSample {
    pub fn new(pixels: Vec<u8>, label: usize) -> Self { Self { pixels, label } }
}

pub struct OcrDataset {
    samples: Vec<OcrSample>,
}

impl OcrDataset {
    pub fn new(samples: Vec<OcrSample>) -> Self { Self { samples } }
}

impl Dataset<OcrSample> for OcrDataset {
    fn get(&self, index: usize) -> Option<OcrSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
