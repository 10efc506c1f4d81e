// ============================================================
// Layer 4 — Image Loaders
// ============================================================
// Three ways to get images into the pipeline, all behind the
// ImageSource trait from Layer 3:
//
//   MnistLoader        — the standard handwritten digit set,
//                        downloaded and cached by burn's vision
//                        dataset (train or test split)
//
//   ImageFolderLoader  — one sub-directory per class:
//                          root/
//                            a/  img1.png img2.png ...
//                            b/  ...
//                        Class indices follow the sorted
//                        directory names, so the same folder
//                        always maps to the same label.
//
//   ImageFileLoader    — loose files to classify (no labels)
//
// Unreadable files are skipped with a warning rather than
// aborting the whole load.

use anyhow::{Context, Result};
use burn::data::dataset::{vision::MnistDataset, Dataset};
use image::{GrayImage, Luma};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::labeled_image::LabeledImage;
use crate::domain::traits::ImageSource;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

// ─── MnistLoader ──────────────────────────────────────────────────────────────
pub struct MnistLoader {
    train: bool,
    limit: Option<usize>,
}

impl MnistLoader {
    pub fn train() -> Self { Self { train: true, limit: None } }

    pub fn test() -> Self { Self { train: false, limit: None } }

    /// Only keep the first `limit` images of the split
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

impl ImageSource for MnistLoader {
    fn load_all(&self) -> Result<Vec<LabeledImage>> {
        let dataset = if self.train { MnistDataset::train() } else { MnistDataset::test() };
        let take    = self.limit.unwrap_or(usize::MAX);

        let images: Vec<LabeledImage> = dataset
            .iter()
            .take(take)
            .map(|item| {
                let image = GrayImage::from_fn(28, 28, |x, y| {
                    Luma([item.image[y as usize][x as usize].clamp(0.0, 255.0) as u8])
                });
                LabeledImage::new(image, item.label as usize)
            })
            .collect();

        tracing::info!(
            "Loaded {} MNIST {} images",
            images.len(),
            if self.train { "train" } else { "test" }
        );
        Ok(images)
    }
}

// ─── ImageFolderLoader ────────────────────────────────────────────────────────
pub struct ImageFolderLoader {
    root: PathBuf,
}

impl ImageFolderLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Sorted class directory names; position = class index.
    pub fn class_names(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Cannot read directory '{}'", self.root.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl ImageSource for ImageFolderLoader {
    fn load_all(&self) -> Result<Vec<LabeledImage>> {
        if !self.root.exists() {
            tracing::warn!(
                "Image directory '{}' does not exist, returning empty set",
                self.root.display()
            );
            return Ok(Vec::new());
        }

        let mut images = Vec::new();
        for (label, class) in self.class_names()?.iter().enumerate() {
            let class_dir = self.root.join(class);
            for path in image_files_in(&class_dir)? {
                match load_gray(&path) {
                    Ok(image) => images.push(LabeledImage::new(image, label)),
                    Err(e)    => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
                }
            }
        }

        tracing::info!(
            "Loaded {} images from '{}'",
            images.len(),
            self.root.display()
        );
        Ok(images)
    }
}

// ─── ImageFileLoader ──────────────────────────────────────────────────────────
pub struct ImageFileLoader {
    paths: Vec<PathBuf>,
}

impl ImageFileLoader {
    pub fn new<P: AsRef<Path>>(paths: &[P]) -> Self {
        Self { paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect() }
    }
}

impl ImageSource for ImageFileLoader {
    /// Unlike the folder loader, an unreadable file is an error here:
    /// the caller asked for exactly these images.
    fn load_all(&self) -> Result<Vec<LabeledImage>> {
        self.paths
            .iter()
            .map(|p| load_gray(p).map(LabeledImage::unlabeled))
            .collect()
    }
}

/// Image files directly inside `dir`, sorted by name.
fn image_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = image::open(path)
        .with_context(|| format!("Cannot open image '{}'", path.display()))?;
    Ok(img.to_luma8())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, value: u8) {
        GrayImage::from_pixel(5, 4, Luma([value])).save(path).unwrap();
    }

    #[test]
    fn test_folder_labels_follow_sorted_class_names() {
        let tmp = tempfile::tempdir().unwrap();
        for class in ["zeta", "alpha"] {
            fs::create_dir(tmp.path().join(class)).unwrap();
        }
        write_png(&tmp.path().join("alpha/a.png"), 10);
        write_png(&tmp.path().join("zeta/z1.png"), 20);
        write_png(&tmp.path().join("zeta/z2.png"), 30);
        fs::write(tmp.path().join("zeta/notes.txt"), "ignored").unwrap();

        let loader = ImageFolderLoader::new(tmp.path());
        assert_eq!(loader.class_names().unwrap(), vec!["alpha", "zeta"]);

        let images = loader.load_all().unwrap();
        let labels: Vec<_> = images.iter().map(|i| i.label).collect();
        assert_eq!(labels, vec![Some(0), Some(1), Some(1)]);
        assert_eq!(images[2].image.get_pixel(0, 0), &Luma([30]));
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let loader = ImageFolderLoader::new("/definitely/not/here");
        assert!(loader.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_image_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        fs::write(tmp.path().join("a/broken.png"), b"not a png").unwrap();
        write_png(&tmp.path().join("a/ok.png"), 1);

        let images = ImageFolderLoader::new(tmp.path()).load_all().unwrap();
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_file_loader_is_unlabeled_and_strict() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("x.png");
        write_png(&path, 99);

        let images = ImageFileLoader::new(&[&path]).load_all().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].label, None);

        let missing = tmp.path().join("missing.png");
        assert!(ImageFileLoader::new(&[missing]).load_all().is_err());
    }
}
