// ============================================================
// Layer 4 — Image Augmenter
// ============================================================
// Produces randomly perturbed copies of the training images so
// the augmented epochs never see exactly the same picture twice.
//
// Per image, one affine projection is sampled and applied with
// imageproc's `warp` (bilinear, background filled with 0):
//
//   rotation  θ  ~ U(-rotation_range, rotation_range)   degrees
//   shift     tx ~ U(-width_shift, width_shift) · width
//             ty ~ U(-height_shift, height_shift) · height
//   zoom      zx, zy ~ U(1 - zoom_range, 1 + zoom_range)
//
// The projection is built around the image centre:
//   T(c + shift) · R(θ) · S(zx, zy) · T(-c)
//
// The generator owns a seeded StdRng, so a given seed always
// yields the same sequence of augmented epochs.

use anyhow::{anyhow, Result};
use image::GrayImage;
use imageproc::geometric_transformations::{warp, Interpolation, Projection};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::dataset::OcrSample;

/// Ranges of the random perturbations.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentationConfig {
    /// Maximum absolute rotation in degrees
    pub rotation_range:  f32,
    /// Maximum horizontal shift as a fraction of the width
    pub width_shift:     f32,
    /// Maximum vertical shift as a fraction of the height
    pub height_shift:    f32,
    /// Zoom factor is drawn from [1 - zoom_range, 1 + zoom_range]
    pub zoom_range:      f32,
    /// Mirror half of the images left-to-right
    pub horizontal_flip: bool,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            rotation_range:  30.0,
            width_shift:     0.05,
            height_shift:    0.05,
            zoom_range:      0.1,
            horizontal_flip: false,
        }
    }
}

pub struct Augmenter {
    config: AugmentationConfig,
    rng:    StdRng,
}

impl Augmenter {
    pub fn new(config: AugmentationConfig, seed: u64) -> Self {
        Self { config, rng: StdRng::seed_from_u64(seed) }
    }

    /// Return a randomly transformed copy of `image` with the same dimensions.
    pub fn augment(&mut self, image: &GrayImage) -> GrayImage {
        let (w, h) = image.dimensions();
        let projection = self.sample_projection(w as f32, h as f32);
        let warped = warp(image, &projection, Interpolation::Bilinear, image::Luma([0u8]));

        if self.config.horizontal_flip && self.rng.gen_bool(0.5) {
            image::imageops::flip_horizontal(&warped)
        } else {
            warped
        }
    }

    /// Augment a whole epoch worth of preprocessed samples.
    /// Labels are carried over unchanged.
    pub fn augment_samples(
        &mut self,
        samples:  &[OcrSample],
        img_rows: usize,
        img_cols: usize,
    ) -> Result<Vec<OcrSample>> {
        samples
            .iter()
            .map(|s| {
                let image = GrayImage::from_raw(img_cols as u32, img_rows as u32, s.pixels.clone())
                    .ok_or_else(|| anyhow!(
                        "Sample has {} pixels, expected {}x{}",
                        s.pixels.len(), img_rows, img_cols
                    ))?;
                Ok(OcrSample::new(self.augment(&image).into_raw(), s.label))
            })
            .collect()
    }

    fn sample_projection(&mut self, width: f32, height: f32) -> Projection {
        let theta = symmetric(&mut self.rng, self.config.rotation_range).to_radians();
        let tx    = symmetric(&mut self.rng, self.config.width_shift) * width;
        let ty    = symmetric(&mut self.rng, self.config.height_shift) * height;
        let zx    = 1.0 + symmetric(&mut self.rng, self.config.zoom_range);
        let zy    = 1.0 + symmetric(&mut self.rng, self.config.zoom_range);

        let (cx, cy) = (width / 2.0, height / 2.0);
        Projection::translate(cx + tx, cy + ty)
            * Projection::rotate(theta)
            * Projection::scale(zx, zy)
            * Projection::translate(-cx, -cy)
    }
}

/// Uniform sample in (-range, range); zero when the range is disabled.
fn symmetric(rng: &mut StdRng, range: f32) -> f32 {
    if range > 0.0 {
        rng.gen_range(-range..range)
    } else {
        0.0
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn bar_image() -> GrayImage {
        GrayImage::from_fn(20, 12, |x, _| if (8..12).contains(&x) { Luma([255]) } else { Luma([0]) })
    }

    #[test]
    fn test_preserves_dimensions() {
        let mut aug = Augmenter::new(AugmentationConfig::default(), 1337);
        let out = aug.augment(&bar_image());
        assert_eq!(out.dimensions(), (20, 12));
    }

    #[test]
    fn test_same_seed_same_output() {
        let mut a = Augmenter::new(AugmentationConfig::default(), 7);
        let mut b = Augmenter::new(AugmentationConfig::default(), 7);
        let img = bar_image();
        assert_eq!(a.augment(&img), b.augment(&img));
        assert_eq!(a.augment(&img), b.augment(&img));
    }

    #[test]
    fn test_disabled_ranges_are_identity() {
        let cfg = AugmentationConfig {
            rotation_range:  0.0,
            width_shift:     0.0,
            height_shift:    0.0,
            zoom_range:      0.0,
            horizontal_flip: false,
        };
        let mut aug = Augmenter::new(cfg, 1);
        let img = bar_image();
        let out = aug.augment(&img);
        // bilinear sampling needs a right/bottom neighbour, so compare the interior
        for y in 0..11 {
            for x in 0..19 {
                assert_eq!(out.get_pixel(x, y), img.get_pixel(x, y), "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn test_augment_samples_keeps_labels() {
        let mut aug = Augmenter::new(AugmentationConfig::default(), 3);
        let samples = vec![
            OcrSample::new(bar_image().into_raw(), 4),
            OcrSample::new(vec![0; 240], 1),
        ];
        let out = aug.augment_samples(&samples, 12, 20).unwrap();
        assert_eq!(out.iter().map(|s| s.label).collect::<Vec<_>>(), vec![4, 1]);
        assert!(out.iter().all(|s| s.pixels.len() == 240));
    }

    #[test]
    fn test_rejects_wrong_pixel_count() {
        let mut aug = Augmenter::new(AugmentationConfig::default(), 3);
        let samples = vec![OcrSample::new(vec![0; 10], 0)];
        assert!(aug.augment_samples(&samples, 12, 20).is_err());
    }
}
