// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw images on disk to tensor batches.
//
//   MNIST archive / image folders / loose files
//       │
//       ▼
//   Loaders           → LabeledImage (source resolution)
//       │
//       ▼
//   Preprocessor      → OcrSample at 34×56, labels validated
//       │
//       ├──────────────► Augmenter (augmented epochs only)
//       ▼
//   OcrDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   OcrBatcher        → [N, 1, rows, cols] images + targets
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop

/// MNIST, image-folder and single-file loaders
pub mod loader;

/// Resize / normalise / one-hot helpers
pub mod preprocessor;

/// Random rotation, shift and zoom of training images
pub mod augmenter;

/// Implements Burn's Dataset trait for OCR samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded shuffle + train/validation split
pub mod splitter;
