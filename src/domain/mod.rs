// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that describe the cartoon
// pipeline without touching the tensor framework.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, errors and traits
//
// What lives here:
//   lifecycle.rs  — Mode (training / evaluation), ModelState,
//                   and the stable StageId of every stage
//   parameters.rs — ParameterSet: the named tensors of one stage
//                   in a framework-free form, ready to persist
//   face.rs       — a decoded face photo and where it came from
//   error.rs      — LoadError, ShapeError, PipelineError
//   traits.rs     — FaceExtractor, CartoonGenerator,
//                   WeightLifecycle, ImageSource
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Stage identities, inference mode and model lifecycle state
pub mod lifecycle;

/// Framework-free named parameter collections
pub mod parameters;

/// A face photo loaded from disk
pub mod face;

/// Typed errors shared by every lower layer
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
