// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// Orchestrates a cartoon run:
//
//   Step 1: Build the GenerativeModel          (Layer 5 - ml)
//   Step 2: Load weights if the directory
//           exists, otherwise warn             (Layer 6 - infra)
//   Step 3: Load the input photos              (Layer 4 - data)
//   Step 4: Generate one cartoon per photo and
//           write it to its output path        (Layer 5 - ml)
//
// Output naming:
//   no --output           → <input dir>/<stem>_cartoon.png
//   --output is a dir, or
//   several inputs        → <output>/<stem>_cartoon.png
//   --output is a file    → exactly that path
//
// A failure on any image stops the run; nothing is retried.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::application::config::PipelineConfig;
use crate::data::loader::ImageLoader;
use crate::domain::{
    face::FaceImage,
    traits::{CartoonGenerator, ImageSource, WeightLifecycle},
};
use crate::ml::{generator::GenerativeModel, InferBackend};

/// Suffix added to the input's file stem
const OUTPUT_SUFFIX: &str = "_cartoon.png";

/// One finished cartoon
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCartoon {
    pub source: PathBuf,
    pub output: PathBuf,
}

pub struct GenerateUseCase {
    config: PipelineConfig,
    model:  GenerativeModel<InferBackend>,
}

impl GenerateUseCase {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let device = Default::default();
        let model  = config.generator().init::<InferBackend>(&device);

        if config.weights_dir.is_dir() {
            model.load_weights(&config.weights_dir).with_context(|| {
                format!("Cannot load weights from '{}'", config.weights_dir.display())
            })?;
        } else {
            tracing::warn!(
                "Weights directory '{}' does not exist — stages keep their random initialisation",
                config.weights_dir.display()
            );
        }

        Ok(Self { config, model })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn execute(&self, input: &Path, output: Option<&Path>) -> Result<Vec<GeneratedCartoon>> {
        let faces = ImageLoader::new(input).load_all()?;
        if faces.is_empty() {
            tracing::warn!("No images found in '{}'", input.display());
            return Ok(Vec::new());
        }

        let into_dir = output.map(|o| faces.len() > 1 || o.is_dir() || o.extension().is_none());
        if let (Some(dir), Some(true)) = (output, into_dir) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        }

        let mut done = Vec::with_capacity(faces.len());
        for face in &faces {
            let target = resolve_output(face, output, into_dir.unwrap_or(false));
            self.model
                .generate(&face.image, Some(&target))
                .with_context(|| format!("Cannot cartoonify '{}'", face.source().display()))?;

            tracing::info!("{} → {}", face.source().display(), target.display());
            done.push(GeneratedCartoon { source: face.source.clone(), output: target });
        }
        Ok(done)
    }
}

fn resolve_output(face: &FaceImage, output: Option<&Path>, into_dir: bool) -> PathBuf {
    let file_name = format!("{}{OUTPUT_SUFFIX}", face.stem());
    match output {
        Some(dir) if into_dir => dir.join(file_name),
        Some(file)            => file.to_path_buf(),
        None => face
            .source()
            .parent()
            .map(|parent| parent.join(&file_name))
            .unwrap_or_else(|| PathBuf::from(&file_name)),
    }
}
