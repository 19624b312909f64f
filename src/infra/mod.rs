// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence that doesn't belong to any one business layer:
//
//   weight_store.rs — per-stage weight files in a weights
//                     directory, bincode-encoded ParameterSets.
//                     Used by the GenerativeModel to load and
//                     save, and by the `inspect` command.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Per-stage weight file persistence
pub mod weight_store;
