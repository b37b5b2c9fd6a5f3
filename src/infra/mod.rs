// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   store.rs     — the two corpus partitions, atomic JSON
//                  writes, left-biased merge
//
//   run_state.rs — style counters committed after each batch
//                  so a resumed run keeps its rotation
//
//   inbox.rs     — DirectoryGenerator, a FormGenerator that
//                  drains JSON files from an inbox directory
//
//   metrics.rs   — one CSV row per attempted batch

/// Corpus partitions and atomic persistence
pub mod store;

/// Persisted style counters
pub mod run_state;

/// File-backed form generator
pub mod inbox;

/// Batch metrics CSV logger
pub mod metrics;
