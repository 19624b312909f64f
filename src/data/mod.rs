// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a photo on disk and the tensor the first
// stage consumes, and back again:
//
//   image files
//       │
//       ▼
//   ImageLoader          → decodes a file or a whole directory
//       │
//       ▼
//   FaceExtractor        → isolates the face (passthrough for now)
//       │
//       ▼
//   ImagePreprocessor    → RGB, 64×64, CHW, [0, 1]
//       │
//       ▼
//   [ ml::GenerativeModel ]
//       │
//       ▼
//   ImagePreprocessor    → tensor back to 8-bit RGB
//
// Reference: image crate documentation
//            Rust Book §13 (Iterators and Closures)

/// Reads photos from a file or directory
pub mod loader;

/// Default face extraction collaborator
pub mod face;

/// Pixel ↔ tensor conversion
pub mod preprocessor;
