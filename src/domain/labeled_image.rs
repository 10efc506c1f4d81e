// ============================================================
// Layer 3 — LabeledImage Domain Type
// ============================================================
// One raw input image as it came off disk (or out of a dataset),
// before it is resized to the network resolution.
//
// The label is optional: training and evaluation need it,
// prediction on new images does not.

use image::GrayImage;

/// A grayscale image and the index of the class it depicts.
#[derive(Debug, Clone)]
pub struct LabeledImage {
    /// Raw 8-bit grayscale pixels at the source resolution
    pub image: GrayImage,

    /// Class index in `0..num_classes`, or `None` when unknown
    pub label: Option<usize>,
}

impl LabeledImage {
    /// An image with a known class
    pub fn new(image: GrayImage, label: usize) -> Self {
        Self { image, label: Some(label) }
    }

    /// An image to be classified
    pub fn unlabeled(image: GrayImage) -> Self {
        Self { image, label: None }
    }
}
