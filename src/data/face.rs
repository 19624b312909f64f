// ============================================================
// Layer 4 — Face Extraction
// ============================================================
// The generator expects a tightly cropped face with the
// background removed. Doing that needs a segmentation model,
// which is an external collaborator. Until one is wired in,
// PassthroughExtractor hands the photo on untouched, so inputs
// should already be face crops.

use image::DynamicImage;

use crate::domain::error::PipelineError;
use crate::domain::traits::FaceExtractor;

#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughExtractor;

impl FaceExtractor for PassthroughExtractor {
    fn extract(&self, image: DynamicImage) -> Result<DynamicImage, PipelineError> {
        tracing::debug!("Face extraction: passthrough ({}×{})", image.width(), image.height());
        Ok(image)
    }
}
