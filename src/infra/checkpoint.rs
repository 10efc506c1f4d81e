// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// One weights file per model name, plus the config needed to
// rebuild the architecture before loading those weights.
//
// File naming convention:
//   <model_dir>/
//     <model_name>.mpk.gz   ← best weights so far
//     <model_name>.json     ← NetworkConfig
//
// Weights use Burn's named MessagePack recorder (gzip, full
// precision). The recorder itself happily loads tensors of any
// shape, so load_model compares every layer shape against the
// model it loads into and rejects a file saved for a different
// class count (or resolution).
//
// BestCheckpoint decides *when* to write: only when the
// monitored validation value strictly beats the best seen so
// far. One instance spans both fit phases, so the plain phase
// can't overwrite a better augmented-phase checkpoint.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::ml::model::OcrCnn;
use crate::ml::network::NetworkConfig;

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Extension the weights recorder appends to the record path
pub const WEIGHTS_EXTENSION: &str = "mpk.gz";

pub struct CheckpointManager {
    dir:  PathBuf,
    name: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).ok();
        Self { dir, name: name.into() }
    }

    /// Path handed to the recorder (it appends the extension itself)
    fn record_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.record_path().with_extension(WEIGHTS_EXTENSION)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.name))
    }

    pub fn exists(&self) -> bool {
        self.weights_path().is_file()
    }

    /// Delete the weights file. Returns false if there was nothing to delete.
    pub fn remove(&self) -> Result<bool> {
        let path = self.weights_path();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Cannot delete checkpoint '{}'", path.display()))?;
        tracing::debug!("Removed checkpoint '{}'", path.display());
        Ok(true)
    }

    /// Overwrite the weights file with the current parameters.
    pub fn save_model<B: Backend>(&self, model: &OcrCnn<B>) -> Result<()> {
        let path = self.record_path();
        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", self.weights_path().display())
            })?;
        tracing::debug!("Saved checkpoint '{}'", self.weights_path().display());
        Ok(())
    }

    /// Load the stored weights into `model`.
    /// Callers check `exists()` first; a missing file is an error here,
    /// as is a file whose layer shapes differ from `model`'s.
    pub fn load_model<B: Backend>(
        &self,
        model:  OcrCnn<B>,
        device: &B::Device,
    ) -> Result<OcrCnn<B>> {
        let record = WeightsRecorder::new()
            .load(self.record_path(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'", self.weights_path().display())
            })?;

        let expected = layer_shapes(&model);
        let loaded   = model.load_record(record);
        let found    = layer_shapes(&loaded);
        if found != expected {
            bail!(
                "Checkpoint '{}' does not fit this network: layer shapes {:?}, expected {:?}. \
                 Delete it or train under another model name.",
                self.weights_path().display(), found, expected
            );
        }

        tracing::debug!("Loaded checkpoint '{}'", self.weights_path().display());
        Ok(loaded)
    }

    pub fn save_config(&self, cfg: &NetworkConfig) -> Result<()> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved network config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<NetworkConfig> {
        let path = self.config_path();
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' with this model name first.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }
}

/// Weight shapes of every parameterised layer, input to output.
fn layer_shapes<B: Backend>(model: &OcrCnn<B>) -> Vec<Vec<usize>> {
    vec![
        model.conv1.weight.val().dims().to_vec(),
        model.conv2.weight.val().dims().to_vec(),
        model.fc1.weight.val().dims().to_vec(),
        model.output.weight.val().dims().to_vec(),
    ]
}

// ─── BestCheckpoint ───────────────────────────────────────────────────────────
/// Save-best-only policy on a value to maximise (validation accuracy).
#[derive(Debug, Clone, Default)]
pub struct BestCheckpoint {
    best: Option<f64>,
}

impl BestCheckpoint {
    pub fn new() -> Self { Self::default() }

    pub fn best(&self) -> Option<f64> { self.best }

    /// Record `value`; true when it beats everything seen so far
    /// (the first finite value always does).
    pub fn observe(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self.best {
            Some(best) if value <= best => false,
            _ => {
                self.best = Some(value);
                true
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::ml::model::OcrCnnConfig;

    type TestBackend = NdArray;

    #[test]
    fn test_best_checkpoint_only_strict_improvements() {
        let mut best = BestCheckpoint::new();
        assert!(best.observe(0.5));
        assert!(!best.observe(0.5));
        assert!(!best.observe(0.4));
        assert!(best.observe(0.7));
        assert!(!best.observe(f64::NAN));
        assert_eq!(best.best(), Some(0.7));
    }

    #[test]
    fn test_paths() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path(), "digits");
        assert_eq!(ckpt.weights_path(), tmp.path().join("digits.mpk.gz"));
        assert_eq!(ckpt.config_path(), tmp.path().join("digits.json"));
        assert!(!ckpt.exists());
        assert!(!ckpt.remove().unwrap());
    }

    #[test]
    fn test_save_load_remove_weights() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path(), "w");
        let device = Default::default();
        let cfg    = OcrCnnConfig::new(3);

        let original: OcrCnn<TestBackend> = cfg.init(&device);
        ckpt.save_model(&original).unwrap();
        assert!(ckpt.exists());

        let fresh: OcrCnn<TestBackend> = cfg.init(&device);
        let loaded = ckpt.load_model(fresh, &device).unwrap();

        let a = original.output.weight.val().into_data();
        let b = loaded.output.weight.val().into_data();
        a.assert_approx_eq(&b, 6);

        assert!(ckpt.remove().unwrap());
        assert!(!ckpt.exists());
    }

    #[test]
    fn test_load_rejects_other_class_count() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path(), "letters");
        let device = Default::default();

        let letters: OcrCnn<TestBackend> = OcrCnnConfig::new(26).init(&device);
        ckpt.save_model(&letters).unwrap();

        let digits: OcrCnn<TestBackend> = OcrCnnConfig::new(10).init(&device);
        let err = ckpt.load_model(digits, &device).unwrap_err();
        assert!(format!("{err}").contains("does not fit"));
    }

    #[test]
    fn test_config_round_trip_and_missing() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path(), "cfg");
        assert!(ckpt.load_config().is_err());

        let cfg = NetworkConfig::new(26);
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap(), cfg);
    }
}
