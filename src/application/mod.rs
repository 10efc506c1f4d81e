// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per CLI command.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Dataset argument → train / test images
pub mod datasets;

// The training workflow
pub mod train_use_case;

// Scoring a trained network
pub mod evaluate_use_case;

// Classifying image files
pub mod predict_use_case;

// The MNIST walk-through
pub mod demo_use_case;
