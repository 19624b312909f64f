// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// Everything a run needs to know, in one serialisable struct.
// It comes from the command line (see cli::commands) or from a
// JSON file, and `init-weights` writes one next to the weights
// so a later run can pick the same settings back up:
//
//   weights/
//     pipeline.json   ← this struct
//     e1.bin ...
//
// Missing keys fall back to the defaults, so hand-written
// files only need the settings that differ.
//
// Reference: serde docs (#[serde(default)])
//            Rust Book §9 (Error Handling)

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ml::generator::GeneratorConfig;

/// File name of the config written beside the weight files
pub const CONFIG_FILE: &str = "pipeline.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub weights_dir:    PathBuf,
    pub shared_dropout: f64,
    pub require_loaded: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights_dir:    PathBuf::from("weights"),
            shared_dropout: 0.5,
            require_loaded: false,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved pipeline config to '{}'", path.display());
        Ok(())
    }

    /// Settings for building the GenerativeModel
    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig::new()
            .with_shared_dropout(self.shared_dropout)
            .with_require_loaded(self.require_loaded)
    }
}
