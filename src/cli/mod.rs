// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `generate`     — photos in, cartoons out
//   2. `init-weights` — write a fresh weights directory
//   3. `inspect`      — summarise a weights directory
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GenerateArgs, InitWeightsArgs, InspectArgs};

use crate::application::{
    generate_use_case::GenerateUseCase,
    weights_use_case::WeightsUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "cartoonify",
    version = "0.1.0",
    about = "Turn face photos into cartoon avatars with an XGAN-style encoder/decoder."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match &self.command {
            Commands::Generate(args)    => run_generate(args),
            Commands::InitWeights(args) => run_init_weights(args),
            Commands::Inspect(args)     => run_inspect(args),
        }
    }
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let config = args.pipeline_config()?;
    tracing::info!("Generating cartoons for: {}", args.input.display());

    let use_case = GenerateUseCase::new(config)?;
    let done     = use_case.execute(&args.input, args.output.as_deref())?;

    for cartoon in &done {
        println!("{} → {}", cartoon.source.display(), cartoon.output.display());
    }
    println!("Generated {} cartoon(s).", done.len());
    Ok(())
}

fn run_init_weights(args: &InitWeightsArgs) -> Result<()> {
    let written = WeightsUseCase::new(args.into()).init(args.training_stages)?;
    for path in &written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let summaries = WeightsUseCase::new(args.into()).inspect()?;
    if summaries.is_empty() {
        println!("No weight files in '{}'.", args.weights_dir.display());
        return Ok(());
    }

    for s in &summaries {
        let status = s.problem.as_deref().unwrap_or("ok");
        println!(
            "{:<10} {:>3} tensors {:>10} values  [{status}]  {}",
            s.stage.to_string(), s.tensors, s.values, s.path.display()
        );
        for (name, shape) in &s.shapes {
            println!("    {name:<24} {shape:?}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn parses_generate_with_defaults() {
        let cli = Cli::try_parse_from(["cartoonify", "generate", "--input", "me.jpg"]).unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.input, PathBuf::from("me.jpg"));
                assert_eq!(args.weights_dir, PathBuf::from("weights"));
                assert!(args.output.is_none());
                assert!(!args.require_weights);

                let config = args.pipeline_config().unwrap();
                assert!(!config.require_loaded);
                assert_eq!(config.weights_dir, Path::new("weights"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "cartoonify", "generate", "--input", "faces", "--output", "out",
            "--weights-dir", "trained", "--require-weights",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };

        let config = args.pipeline_config().unwrap();
        assert!(config.require_loaded);
        assert_eq!(config.weights_dir, PathBuf::from("trained"));
        assert_eq!(args.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn parses_weight_commands() {
        let cli = Cli::try_parse_from(["cartoonify", "init-weights", "--training-stages"]).unwrap();
        assert!(matches!(cli.command, Commands::InitWeights(InitWeightsArgs { training_stages: true, .. })));

        let cli = Cli::try_parse_from(["cartoonify", "inspect", "--weights-dir", "w"]).unwrap();
        assert!(matches!(cli.command, Commands::Inspect(_)));
    }

    #[test]
    fn generate_requires_input() {
        assert!(Cli::try_parse_from(["cartoonify", "generate"]).is_err());
    }
}
