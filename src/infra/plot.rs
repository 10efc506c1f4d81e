// ============================================================
// Layer 6 — History Plots
// ============================================================
// Renders the learning curve of one metric to a PNG:
//
//   blue   — training value per epoch
//   orange — validation value per epoch
//
// The y axis spans the min..max of both curves (with a small
// margin); the x axis spans the epochs of the phase. There is
// no text rendering, so file names carry the phase and metric:
//   <out_dir>/<model_name>_<phase>_<metric>.png

use anyhow::{bail, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use std::path::Path;

use crate::infra::metrics::{EpochMetrics, Metric};

const WIDTH:  u32 = 640;
const HEIGHT: u32 = 400;
const MARGIN: f32 = 40.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS:       Rgb<u8> = Rgb([0, 0, 0]);
const TRAIN:      Rgb<u8> = Rgb([31, 119, 180]);
const VALIDATION: Rgb<u8> = Rgb([255, 127, 14]);

/// Draw `metric` for every epoch in `series` and save the PNG at `path`.
pub fn plot_history(series: &[EpochMetrics], metric: Metric, path: &Path) -> Result<()> {
    if series.is_empty() {
        bail!("Nothing to plot for '{}'", metric.name());
    }

    let train: Vec<f64> = series.iter().map(|m| m.train.get(metric)).collect();
    let val:   Vec<f64> = series.iter().map(|m| m.val.get(metric)).collect();

    let (lo, hi) = value_range(train.iter().chain(val.iter()).copied());
    let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    draw_axes(&mut canvas);

    let project = |i: usize, v: f64| -> (f32, f32) {
        let plot_w = WIDTH as f32 - 2.0 * MARGIN;
        let plot_h = HEIGHT as f32 - 2.0 * MARGIN;
        let x = if series.len() > 1 {
            MARGIN + plot_w * i as f32 / (series.len() - 1) as f32
        } else {
            MARGIN + plot_w / 2.0
        };
        let y = HEIGHT as f32 - MARGIN - plot_h * ((v - lo) / (hi - lo)) as f32;
        (x, y)
    };

    for (values, color) in [(&train, TRAIN), (&val, VALIDATION)] {
        let points: Vec<(f32, f32)> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| project(i, v))
            .collect();
        for pair in points.windows(2) {
            draw_line_segment_mut(&mut canvas, pair[0], pair[1], color);
        }
        for &(x, y) in &points {
            draw_filled_circle_mut(&mut canvas, (x as i32, y as i32), 3, color);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    canvas
        .save(path)
        .with_context(|| format!("Cannot write plot '{}'", path.display()))?;

    tracing::debug!("Plotted {} to '{}'", metric.name(), path.display());
    Ok(())
}

fn draw_axes(canvas: &mut RgbImage) {
    let (w, h) = (WIDTH as f32, HEIGHT as f32);
    draw_line_segment_mut(canvas, (MARGIN, h - MARGIN), (w - MARGIN, h - MARGIN), AXIS);
    draw_line_segment_mut(canvas, (MARGIN, MARGIN), (MARGIN, h - MARGIN), AXIS);
}

/// Padded (min, max) of the finite values; never a zero-width range.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < 1e-12 {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::metrics::Score;

    fn epoch(i: usize, acc: f64, val_acc: f64) -> EpochMetrics {
        EpochMetrics::new(
            i,
            Score { accuracy: acc, ..Score::default() },
            Score { accuracy: val_acc, ..Score::default() },
        )
    }

    #[test]
    fn test_writes_png_with_expected_size() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("plots/acc.png");
        let series = vec![epoch(1, 0.2, 0.3), epoch(2, 0.6, 0.5), epoch(3, 0.9, 0.7)];

        plot_history(&series, Metric::Accuracy, &path).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_single_epoch_plots() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("one.png");
        plot_history(&[epoch(1, 0.5, 0.5)], Metric::Accuracy, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_series_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(plot_history(&[], Metric::Precision, &tmp.path().join("x.png")).is_err());
    }

    #[test]
    fn test_value_range_never_flat() {
        assert_eq!(value_range([2.0, 2.0].into_iter()), (1.5, 2.5));
        assert_eq!(value_range([f64::NAN].into_iter()), (0.0, 1.0));
    }
}
