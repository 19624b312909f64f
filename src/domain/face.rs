// ============================================================
// Layer 3 — Face Image Domain Type
// ============================================================
// A decoded photo together with the file it came from.
// The source path is kept for traceability and to derive the
// name of the cartoon written next to it.

use std::path::{Path, PathBuf};

use image::DynamicImage;

/// A face photo loaded from disk, still at its source resolution.
#[derive(Debug, Clone)]
pub struct FaceImage {
    /// Where the image was read from
    pub source: PathBuf,

    /// The decoded pixels, any colour type
    pub image: DynamicImage,
}

impl FaceImage {
    pub fn new(source: impl Into<PathBuf>, image: DynamicImage) -> Self {
        Self { source: source.into(), image }
    }

    /// File stem of the source, used to name derived outputs
    pub fn stem(&self) -> &str {
        self.source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("face")
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_comes_from_source_path() {
        let face = FaceImage::new("photos/alice.jpg", DynamicImage::new_rgb8(2, 2));
        assert_eq!(face.stem(), "alice");
    }

    #[test]
    fn stem_falls_back_when_missing() {
        let face = FaceImage::new("", DynamicImage::new_rgb8(2, 2));
        assert_eq!(face.stem(), "face");
    }
}
