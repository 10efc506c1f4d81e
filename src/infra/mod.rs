// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the network wrapper and the
// use cases:
//
//   checkpoint.rs — weights (.mpk.gz) and NetworkConfig (.json)
//                   per model name, plus the save-best-only
//                   policy driven by validation accuracy
//
//   metrics.rs    — Score computation and the per-epoch CSV
//
//   plot.rs       — PNG learning curves of a training history
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Scores, training history and the CSV logger
pub mod metrics;

/// Training history plots
pub mod plot;
