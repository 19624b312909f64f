// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `generate`, `init-weights`
// and `inspect`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → PathBuf, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::config::PipelineConfig;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn face photos into cartoons
    Generate(GenerateArgs),

    /// Write freshly initialised weight files and pipeline.json
    InitWeights(InitWeightsArgs),

    /// Summarise the weight files in a directory
    Inspect(InspectArgs),
}

/// All arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// A photo, or a directory of photos
    #[arg(long)]
    pub input: PathBuf,

    /// Output file (single input) or directory.
    /// Defaults to `<stem>_cartoon.png` next to each input.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory holding e1.bin, e_shared.bin, d_shared.bin, d2.bin, denoiser.bin
    #[arg(long, default_value = "weights")]
    pub weights_dir: PathBuf,

    /// JSON pipeline config; command line flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fail instead of generating with random weights when none are loaded
    #[arg(long)]
    pub require_weights: bool,
}

impl GenerateArgs {
    /// Config file (or defaults) with the command line flags applied on top.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None       => PipelineConfig::default(),
        };
        config.weights_dir    = self.weights_dir.clone();
        config.require_loaded = config.require_loaded || self.require_weights;
        Ok(config)
    }
}

/// All arguments for the `init-weights` command
#[derive(Args, Debug)]
pub struct InitWeightsArgs {
    /// Directory to write the weight files into
    #[arg(long, default_value = "weights")]
    pub weights_dir: PathBuf,

    /// Also write the discriminator and domain classifier
    #[arg(long)]
    pub training_stages: bool,
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory holding the weight files
    #[arg(long, default_value = "weights")]
    pub weights_dir: PathBuf,
}

/// Boundary between Layer 1 and Layer 2: the application layer never sees clap types.
impl From<&InitWeightsArgs> for PipelineConfig {
    fn from(a: &InitWeightsArgs) -> Self {
        PipelineConfig { weights_dir: a.weights_dir.clone(), ..Default::default() }
    }
}

impl From<&InspectArgs> for PipelineConfig {
    fn from(a: &InspectArgs) -> Self {
        PipelineConfig { weights_dir: a.weights_dir.clone(), ..Default::default() }
    }
}
