// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Brings raw images of any size to the fixed network input.
//
// Cleaning steps (applied in order):
//   1. Resize to img_rows × img_cols (triangle filter)
//   2. Validate the label against num_classes
//   3. Keep pixels as u8; the batcher scales them to [0, 1]
//
// One-hot encoding (`to_categorical`) is only needed on the
// host side for precision / recall / MAE; the loss consumes
// class indices directly.

use anyhow::{bail, Result};
use image::{imageops::FilterType, GrayImage};

use crate::data::dataset::OcrSample;
use crate::domain::labeled_image::LabeledImage;

/// Default input height of the network
pub const IMG_ROWS: usize = 34;

/// Default input width of the network
pub const IMG_COLS: usize = 56;

pub struct Preprocessor {
    num_classes: usize,
    img_rows:    usize,
    img_cols:    usize,
}

impl Preprocessor {
    pub fn new(num_classes: usize, img_rows: usize, img_cols: usize) -> Self {
        Self { num_classes, img_rows, img_cols }
    }

    /// Resize a single image to the network resolution.
    /// Images that already match are returned untouched.
    pub fn resize(&self, image: &GrayImage) -> GrayImage {
        let (w, h) = (self.img_cols as u32, self.img_rows as u32);
        if image.dimensions() == (w, h) {
            return image.clone();
        }
        image::imageops::resize(image, w, h, FilterType::Triangle)
    }

    /// Turn labelled images into training / evaluation samples.
    /// Every image must carry a label in `0..num_classes`.
    pub fn prepare(&self, images: &[LabeledImage]) -> Result<Vec<OcrSample>> {
        images
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let label = match item.label {
                    Some(l) if l < self.num_classes => l,
                    Some(l) => bail!(
                        "Image {i} has label {l} but the network only has {} classes",
                        self.num_classes
                    ),
                    None => bail!("Image {i} has no label; only prediction accepts unlabelled images"),
                };
                Ok(OcrSample::new(self.resize(&item.image).into_raw(), label))
            })
            .collect()
    }

    /// Resize images for prediction; labels are ignored.
    pub fn prepare_unlabeled(&self, images: &[GrayImage]) -> Vec<Vec<u8>> {
        images.iter().map(|img| self.resize(img).into_raw()).collect()
    }
}

/// Scale 8-bit pixels to `[0, 1]` floats.
pub fn normalize(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(|&p| p as f32 / 255.0).collect()
}

/// One-hot encode a class index.
pub fn to_categorical(label: usize, num_classes: usize) -> Vec<f32> {
    let mut v = vec![0.0; num_classes];
    if label < num_classes {
        v[label] = 1.0;
    }
    v
}
