// ============================================================
// Layer 3 — Mode, Stage Identity and Model State
// ============================================================
// Normalisation and dropout behave differently while training
// and while generating. Instead of a hidden global switch, the
// mode is a value that every stage forward receives explicitly.
//
// Every stage also has a stable identity. The identity doubles
// as the stem of the stage's weight file:
//
//   e1        → Encoder (photo domain)
//   e_shared  → SharedEncoder
//   d_shared  → SharedDecoder
//   d2        → Decoder (cartoon domain)
//   denoiser  → Denoiser
//   disc      → DomainDiscriminator  (training only)
//   c_dann    → DomainClassifier     (training only)
//
// Reference: Royer et al. (2017) XGAN

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How normalisation and dropout layers behave during a forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Batch statistics for normalisation, stochastic dropout
    Training,

    /// Stored running statistics, dropout disabled
    #[default]
    Evaluation,
}

impl Mode {
    pub fn is_training(self) -> bool {
        matches!(self, Mode::Training)
    }
}

/// Stable identity of each stage in the architecture family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageId {
    Encoder,
    SharedEncoder,
    SharedDecoder,
    Decoder,
    Denoiser,
    Discriminator,
    DomainClassifier,
}

impl StageId {
    /// The five stages that make up the inference path, in execution order.
    pub const INFERENCE: [StageId; 5] = [
        StageId::Encoder,
        StageId::SharedEncoder,
        StageId::SharedDecoder,
        StageId::Decoder,
        StageId::Denoiser,
    ];

    /// Every stage, inference path first.
    pub const ALL: [StageId; 7] = [
        StageId::Encoder,
        StageId::SharedEncoder,
        StageId::SharedDecoder,
        StageId::Decoder,
        StageId::Denoiser,
        StageId::Discriminator,
        StageId::DomainClassifier,
    ];

    /// File stem of the stage's weight file inside a weights directory.
    pub fn file_stem(self) -> &'static str {
        match self {
            StageId::Encoder          => "e1",
            StageId::SharedEncoder    => "e_shared",
            StageId::SharedDecoder    => "d_shared",
            StageId::Decoder          => "d2",
            StageId::Denoiser         => "denoiser",
            StageId::Discriminator    => "disc",
            StageId::DomainClassifier => "c_dann",
        }
    }

    /// Inverse of [`StageId::file_stem`].
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.file_stem() == stem)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Whether the inference stages still hold their random initialisation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelState {
    #[default]
    Unloaded,

    /// All five inference stages were replaced from this directory
    Loaded { source: PathBuf },
}

impl ModelState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_is_the_default_mode() {
        assert_eq!(Mode::default(), Mode::Evaluation);
        assert!(!Mode::Evaluation.is_training());
        assert!(Mode::Training.is_training());
    }

    #[test]
    fn inference_stages_use_reference_file_names() {
        let stems: Vec<&str> = StageId::INFERENCE.iter().map(|id| id.file_stem()).collect();
        assert_eq!(stems, ["e1", "e_shared", "d_shared", "d2", "denoiser"]);
    }

    #[test]
    fn file_stem_round_trips() {
        assert_eq!(StageId::from_file_stem("c_dann"), Some(StageId::DomainClassifier));
        assert_eq!(StageId::from_file_stem("d2"), Some(StageId::Decoder));
        assert_eq!(StageId::from_file_stem("d1"), None);
    }
}
