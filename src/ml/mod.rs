// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn specific code lives here. The rest of the crate only
// sees the GenerativeModel and plain domain types.
//
// What's in this layer:
//
//   layers.rs            — BatchNorm with an explicit Mode,
//                          dropout, and parameter import/export
//                          for Burn's conv / linear modules
//   stage.rs             — the Stage trait every component
//                          implements, plus shape constants
//   encoder.rs           — Encoder        3×64×64  → 64×16×16
//   shared_encoder.rs    — SharedEncoder  64×16×16 → 1024
//   shared_decoder.rs    — SharedDecoder  1024     → 256×8×8
//   decoder.rs           — Decoder        256×8×8  → 3×64×64 (tanh)
//   denoiser.rs          — Denoiser       3×H×W    → 3×H×W
//   discriminator.rs     — DomainDiscriminator (training only)
//   domain_classifier.rs — GradientReversal + DomainClassifier
//                          (training only)
//   generator.rs         — GenerativeModel: owns the five
//                          inference stages, load / save / generate;
//                          per-stage init and fit checks by StageId
//
// Backends:
//   InferBackend — NdArray on the CPU (Wgpu with `--features wgpu`)
//   TrainBackend — Autodiff<InferBackend>, needed for gradients
//
// Reference: Burn Book §3 (Building Blocks)
//            Royer et al. (2017) XGAN
//            Ganin & Lempitsky (2015) Unsupervised Domain
//            Adaptation by Backpropagation

/// Normalisation, dropout and parameter import/export helpers
pub mod layers;

/// The Stage trait and the tensor shapes at stage boundaries
pub mod stage;

/// Photo-domain feature extractor
pub mod encoder;

/// Features → shared latent vector
pub mod shared_encoder;

/// Shared latent vector → features
pub mod shared_decoder;

/// Cartoon-domain image reconstructor
pub mod decoder;

/// Post-process refiner
pub mod denoiser;

/// Real-vs-generated image critic (training only)
pub mod discriminator;

/// Domain classifier behind a gradient reversal (training only)
pub mod domain_classifier;

/// The orchestrator used at inference time
pub mod generator;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;
