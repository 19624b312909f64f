// ============================================================
// Layer 4 — Image Loader
// ============================================================
// Reads face photos from disk using the image crate.
//
// The input path may be:
//   - a single file  → exactly that image; failing to decode
//                      it is an error
//   - a directory    → every file with a known raster
//                      extension, sorted by path so output
//                      order is reproducible. Files that fail
//                      to decode are logged and skipped.
//
// Sub-directories are not descended into.
//
// Reference: image crate docs (image::open, ImageFormat)
//            Rust Book §9 (Error Handling)

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};

use crate::domain::face::FaceImage;
use crate::domain::traits::ImageSource;

/// Extensions picked up when scanning a directory (lower case)
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"];

pub struct ImageLoader {
    path: PathBuf,
}

impl ImageLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for ImageLoader {
    fn load_all(&self) -> Result<Vec<FaceImage>> {
        if self.path.is_file() {
            return Ok(vec![load_single(&self.path)?]);
        }
        if !self.path.is_dir() {
            bail!("Input '{}' is neither a file nor a directory", self.path.display());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.path)
            .with_context(|| format!("Cannot read directory '{}'", self.path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        paths.sort();

        let mut faces = Vec::with_capacity(paths.len());
        for path in paths {
            match load_single(&path) {
                Ok(face) => faces.push(face),
                Err(e)   => tracing::warn!("Skipping '{}': {e:#}", path.display()),
            }
        }

        tracing::info!("Loaded {} image(s) from '{}'", faces.len(), self.path.display());
        Ok(faces)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_single(path: &Path) -> Result<FaceImage> {
    let image = image::open(path)
        .with_context(|| format!("Cannot decode image '{}'", path.display()))?;
    tracing::debug!("Loaded: {} ({}×{})", path.display(), image.width(), image.height());
    Ok(FaceImage::new(path, image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::tempdir;

    #[test]
    fn loads_a_single_file() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("bob.png");
        RgbImage::new(6, 4).save(&path).unwrap();

        let faces = ImageLoader::new(&path).load_all().unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].stem(), "bob");
        assert_eq!(faces[0].image.width(), 6);
    }

    #[test]
    fn scans_directory_sorted_and_skips_bad_files() {
        let dir = tempdir().unwrap();
        RgbImage::new(2, 2).save(dir.path().join("b.png")).unwrap();
        RgbImage::new(2, 2).save(dir.path().join("a.PNG")).unwrap();
        fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let faces = ImageLoader::new(dir.path()).load_all().unwrap();
        let stems: Vec<&str> = faces.iter().map(|f| f.stem()).collect();
        assert_eq!(stems, ["a", "b"]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(ImageLoader::new(dir.path().join("nope")).load_all().is_err());
    }

    #[test]
    fn undecodable_single_file_is_an_error() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("face.png");
        fs::write(&path, b"garbage").unwrap();
        assert!(ImageLoader::new(&path).load_all().is_err());
    }
}
