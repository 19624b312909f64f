// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams of the pipeline:
//
//   ImageSource      — where face photos come from
//                      (ImageLoader: a file or a directory)
//   FaceExtractor    — crops / isolates the face. External
//                      collaborator; the shipped implementation
//                      is a passthrough until a segmentation
//                      model is integrated
//   CartoonGenerator — photo in, cartoon out
//   WeightLifecycle  — restore / persist learned parameters
//
// The application layer only talks to these traits, so a real
// face segmenter or a remote generator can be dropped in
// without touching the use cases.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::Path;

use anyhow::Result;
use image::{DynamicImage, RgbImage};

use crate::domain::error::PipelineError;
use crate::domain::face::FaceImage;

// ─── ImageSource ─────────────────────────────────────────────────────────────
/// Any component that can supply face photos.
pub trait ImageSource {
    /// Load every available image from this source.
    fn load_all(&self) -> Result<Vec<FaceImage>>;
}

// ─── FaceExtractor ───────────────────────────────────────────────────────────
/// Crops the face out of a photo and removes the background.
///
/// Implementations must be shareable across threads because the
/// generative model may serve several `generate` calls at once.
pub trait FaceExtractor: Send + Sync {
    fn extract(&self, image: DynamicImage) -> std::result::Result<DynamicImage, PipelineError>;
}

// ─── CartoonGenerator ────────────────────────────────────────────────────────
/// Turns a face photo into a cartoon.
pub trait CartoonGenerator {
    /// Generate the cartoon for `face`. When `output` is given the
    /// cartoon is also written there, format inferred from the extension.
    fn generate(
        &self,
        face:   &DynamicImage,
        output: Option<&Path>,
    ) -> std::result::Result<RgbImage, PipelineError>;
}

// ─── WeightLifecycle ─────────────────────────────────────────────────────────
/// Any component whose learned parameters live in a weights directory.
pub trait WeightLifecycle {
    /// Replace every parameter set from `dir`. All or nothing.
    fn load_weights(&self, dir: &Path) -> std::result::Result<(), PipelineError>;

    /// Write every parameter set into `dir`.
    fn save_weights(&self, dir: &Path) -> std::result::Result<(), PipelineError>;
}
