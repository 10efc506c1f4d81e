// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that describe what the system
// works with: a grayscale image, optionally tagged with the
// class it belongs to.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// Everything upstream (loaders) produces these types and
// everything downstream (preprocessing, the network) consumes
// them, so swapping a data source never touches the model.

// A grayscale image with an optional class label
pub mod labeled_image;

// Core abstractions (traits) that other layers implement
pub mod traits;
