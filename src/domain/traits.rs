// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads images through this trait so it
// never needs to know whether they come from the MNIST archive,
// a directory of class folders, or a list of loose files.
//
// Implementations:
//   - MnistLoader        → burn's MNIST vision dataset
//   - ImageFolderLoader  → <root>/<class>/*.png
//   - ImageFileLoader    → individual files, unlabelled

use anyhow::Result;
use crate::domain::labeled_image::LabeledImage;

// ─── ImageSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a set of images.
pub trait ImageSource {
    /// Load every image this source provides, in a stable order.
    fn load_all(&self) -> Result<Vec<LabeledImage>>;
}
