// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches model parameters lives here.
//
//   model.rs    — the CNN itself:
//                  conv(20, 4×4) → relu → maxpool 2
//                  conv(40, 5×5) → relu → maxpool 3
//                  dropout → flatten
//                  dense(150) → relu → dropout
//                  dense(num_classes)
//
//   trainer.rs  — one epoch of training, one pass of
//                 evaluation, the phase plan of a fit call
//
//   network.rs  — OcrNetwork, the wrapper the use cases talk
//                 to: fit / evaluate / predict / plot_history
//                 plus checkpoint handling
//
// Training needs an AutodiffBackend; inference goes through
// model.valid() on the inner backend.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

use burn::backend::{wgpu::WgpuDevice, Autodiff, Wgpu};

/// CNN architecture and its Config
pub mod model;

/// Epoch-level training and evaluation
pub mod trainer;

/// High-level network wrapper with checkpointing
pub mod network;

/// Backend the CLI trains on
pub type TrainBackend = Autodiff<Wgpu>;

/// Default GPU device (falls back to whatever wgpu picks)
pub fn default_device() -> WgpuDevice {
    WgpuDevice::default()
}
