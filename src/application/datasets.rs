// ============================================================
// Layer 2 — Dataset Selection
// ============================================================
// Turns the `--dataset` argument into train and test images:
//
//   mnist     → burn's MNIST train / test splits, 10 classes
//   <folder>  → ImageFolderLoader on the folder; the test set is
//               either --test-dir or a seeded split of the folder
//
// The class count of a folder dataset is the number of class
// sub-directories. Folder images arrive grouped by class, so
// --limit keeps a seeded random subset rather than a prefix.

use anyhow::{bail, Result};
use std::{convert::Infallible, path::PathBuf, str::FromStr};

use crate::data::{
    loader::{ImageFolderLoader, MnistLoader},
    splitter::split_train_val,
};
use crate::domain::{labeled_image::LabeledImage, traits::ImageSource};

/// Number of MNIST digit classes
pub const MNIST_CLASSES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Mnist,
    Folder(PathBuf),
}

impl FromStr for DatasetSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("mnist") {
            DatasetSource::Mnist
        } else {
            DatasetSource::Folder(PathBuf::from(s))
        })
    }
}

/// Train images, test images and the number of classes they span.
#[derive(Debug)]
pub struct LoadedSplit {
    pub train:       Vec<LabeledImage>,
    pub test:        Vec<LabeledImage>,
    pub num_classes: usize,
}

pub fn load_split(
    source:       &DatasetSource,
    test_dir:     Option<&PathBuf>,
    limit:        Option<usize>,
    val_fraction: f64,
    seed:         u64,
) -> Result<LoadedSplit> {
    let split = match source {
        DatasetSource::Mnist => LoadedSplit {
            train:       MnistLoader::train().with_limit(limit).load_all()?,
            test:        MnistLoader::test().with_limit(limit).load_all()?,
            num_classes: MNIST_CLASSES,
        },
        DatasetSource::Folder(root) => {
            let loader  = ImageFolderLoader::new(root);
            let classes = loader.class_names()?;
            let images  = random_subset(loader.load_all()?, limit, seed);

            let (train, test) = match test_dir {
                Some(dir) => {
                    let test_loader = ImageFolderLoader::new(dir);
                    if test_loader.class_names()? != classes {
                        bail!(
                            "Class folders of '{}' and '{}' differ",
                            root.display(), dir.display()
                        );
                    }
                    (images, random_subset(test_loader.load_all()?, limit, seed))
                }
                None => split_train_val(images, 1.0 - val_fraction, seed),
            };
            LoadedSplit { train, test, num_classes: classes.len() }
        }
    };

    if split.train.is_empty() {
        bail!("No training images found");
    }
    tracing::info!(
        "Dataset: {} train, {} test, {} classes",
        split.train.len(), split.test.len(), split.num_classes
    );
    Ok(split)
}

/// Test images only, for `evaluate`.
pub fn load_test_set(
    source:   &DatasetSource,
    test_dir: Option<&PathBuf>,
    limit:    Option<usize>,
    seed:     u64,
) -> Result<Vec<LabeledImage>> {
    let images = match (source, test_dir) {
        (DatasetSource::Mnist, _) => MnistLoader::test().with_limit(limit).load_all()?,
        (_, Some(dir)) => random_subset(ImageFolderLoader::new(dir).load_all()?, limit, seed),
        (DatasetSource::Folder(root), None) => {
            tracing::warn!(
                "No --test-dir given: scoring every image in '{}', training images included",
                root.display()
            );
            random_subset(ImageFolderLoader::new(root).load_all()?, limit, seed)
        }
    };
    if images.is_empty() {
        bail!("No test images found");
    }
    Ok(images)
}

/// Seeded random `limit` images; everything when `limit` is `None`.
fn random_subset(images: Vec<LabeledImage>, limit: Option<usize>, seed: u64) -> Vec<LabeledImage> {
    match limit {
        Some(limit) if limit < images.len() => {
            let (mut kept, _) = split_train_val(images, 1.0, seed);
            kept.truncate(limit);
            kept
        }
        _ => images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn write_class(root: &std::path::Path, class: &str, n: usize) {
        let dir = root.join(class);
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..n {
            GrayImage::new(8, 8).save(dir.join(format!("{i}.png"))).unwrap();
        }
    }

    #[test]
    fn test_parse_source() {
        assert_eq!("mnist".parse::<DatasetSource>().unwrap(), DatasetSource::Mnist);
        assert_eq!("MNIST".parse::<DatasetSource>().unwrap(), DatasetSource::Mnist);
        assert_eq!(
            "data/letters".parse::<DatasetSource>().unwrap(),
            DatasetSource::Folder(PathBuf::from("data/letters"))
        );
    }

    #[test]
    fn test_folder_split_without_test_dir() {
        let tmp = tempfile::tempdir().unwrap();
        write_class(tmp.path(), "a", 5);
        write_class(tmp.path(), "b", 5);

        let source = DatasetSource::Folder(tmp.path().to_path_buf());
        let split  = load_split(&source, None, None, 0.2, 7).unwrap();
        assert_eq!(split.num_classes, 2);
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn test_limit_samples_across_classes() {
        let tmp = tempfile::tempdir().unwrap();
        for class in ["a", "b", "c"] {
            write_class(tmp.path(), class, 10);
        }

        let source = DatasetSource::Folder(tmp.path().to_path_buf());
        let split  = load_split(&source, None, Some(10), 0.2, 7).unwrap();
        assert_eq!(split.num_classes, 3);
        assert_eq!(split.train.len() + split.test.len(), 10);

        let mut labels: Vec<usize> = split.train.iter().chain(&split.test).filter_map(|l| l.label).collect();
        labels.sort();
        labels.dedup();
        assert!(labels.len() > 1, "only classes {labels:?} survived the limit");

        let test = load_test_set(&source, None, Some(10), 7).unwrap();
        let mut labels: Vec<usize> = test.iter().filter_map(|l| l.label).collect();
        labels.sort();
        labels.dedup();
        assert!(labels.len() > 1);
    }

    #[test]
    fn test_mismatched_test_dir_is_error() {
        let train = tempfile::tempdir().unwrap();
        let test  = tempfile::tempdir().unwrap();
        write_class(train.path(), "a", 2);
        write_class(train.path(), "b", 2);
        write_class(test.path(), "a", 2);

        let source = DatasetSource::Folder(train.path().to_path_buf());
        let dir    = test.path().to_path_buf();
        assert!(load_split(&source, Some(&dir), None, 0.2, 7).is_err());
    }

    #[test]
    fn test_empty_folder_is_error() {
        let tmp    = tempfile::tempdir().unwrap();
        let source = DatasetSource::Folder(tmp.path().join("missing"));
        assert!(load_split(&source, None, None, 0.2, 7).is_err());
    }
}
