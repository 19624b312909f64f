// ============================================================
// Layer 5 — GenerativeModel
// ============================================================
// Owns the five inference stages and runs face → cartoon:
//
//   photo ─► FaceExtractor ─► ImagePreprocessor ─► [1, 3, 64, 64]
//     ─► Encoder ─► SharedEncoder ─► SharedDecoder ─► Decoder
//     ─► Denoiser ─► ImagePreprocessor ─► 64×64 RGB (+ optional file)
//
// Lifecycle:
//
//   Unloaded ──load_weights(dir)──► Loaded { source: dir }
//      ▲                               │
//      └─────── (never goes back) ─────┘   load again = replace
//
// load_weights is all or nothing. All five files are read and
// imported into a copy of the stages first; the live stages are
// swapped only once every stage succeeded.
//
// Concurrency: the stages sit behind a Mutex. generate holds
// the lock just long enough to clone the stages (the tensors
// inside are reference counted) and runs the forward pass on
// that copy. A call therefore sees the old parameters or the
// new ones, never a mix.
//
// Reference: Burn Book §3 (Module, no_grad)
//            Rust Book §16 (Shared-State Concurrency)

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use burn::prelude::*;
use image::{DynamicImage, RgbImage};

use crate::data::{face::PassthroughExtractor, preprocessor::ImagePreprocessor};
use crate::domain::{
    error::{LoadError, PipelineError, ShapeError},
    lifecycle::{Mode, ModelState, StageId},
    parameters::ParameterSet,
    traits::{CartoonGenerator, FaceExtractor, WeightLifecycle},
};
use crate::infra::weight_store::WeightStore;
use crate::ml::{
    decoder::Decoder,
    denoiser::Denoiser,
    discriminator::Discriminator,
    domain_classifier::DomainClassifierConfig,
    encoder::Encoder,
    shared_decoder::SharedDecoder,
    shared_encoder::{SharedEncoder, SharedEncoderConfig},
    stage::Stage,
};

// ─── InferenceStages ─────────────────────────────────────────────────────────
/// The inference path, in execution order.
#[derive(Module, Debug)]
pub struct InferenceStages<B: Backend> {
    e1:       Encoder<B>,
    e_shared: SharedEncoder<B>,
    d_shared: SharedDecoder<B>,
    d2:       Decoder<B>,
    denoiser: Denoiser<B>,
}

impl<B: Backend> InferenceStages<B> {
    pub fn new(shared: &SharedEncoderConfig, device: &B::Device) -> Self {
        Self {
            e1:       Encoder::new(device),
            e_shared: shared.init(device),
            d_shared: SharedDecoder::new(device),
            d2:       Decoder::new(device),
            denoiser: Denoiser::new(device),
        }
    }

    /// `[N, 3, 64, 64]` photo batch → `[N, 3, 64, 64]` cartoon batch.
    pub fn forward(&self, x: Tensor<B, 4>, mode: Mode) -> Result<Tensor<B, 4>, ShapeError> {
        let x = self.e1.forward(x, mode)?;
        let z = self.e_shared.forward(x, mode)?;
        let x = self.d_shared.forward(z, mode)?;
        let x = self.d2.forward(x, mode)?;
        self.denoiser.forward(x, mode)
    }

    /// One labelled parameter set per stage, in `StageId::INFERENCE` order.
    pub fn parameters(&self) -> [(StageId, ParameterSet); 5] {
        let label = |id: StageId| id.file_stem();
        [
            (StageId::Encoder,       self.e1.parameters(label(StageId::Encoder))),
            (StageId::SharedEncoder, self.e_shared.parameters(label(StageId::SharedEncoder))),
            (StageId::SharedDecoder, self.d_shared.parameters(label(StageId::SharedDecoder))),
            (StageId::Decoder,       self.d2.parameters(label(StageId::Decoder))),
            (StageId::Denoiser,      self.denoiser.parameters(label(StageId::Denoiser))),
        ]
    }

    /// Replace every stage from `sets` (`StageId::INFERENCE` order).
    pub fn load_parameters(self, sets: &[ParameterSet; 5]) -> Result<Self, LoadError> {
        let [e1, e_shared, d_shared, d2, denoiser] = sets;
        Ok(Self {
            e1:       self.e1.load_parameters(e1)?,
            e_shared: self.e_shared.load_parameters(e_shared)?,
            d_shared: self.d_shared.load_parameters(d_shared)?,
            d2:       self.d2.load_parameters(d2)?,
            denoiser: self.denoiser.load_parameters(denoiser)?,
        })
    }
}

// ─── Configuration ───────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct GeneratorConfig {
    /// Dropout inside the shared encoder (only active while training)
    #[config(default = 0.5)]
    pub shared_dropout: f64,

    /// Refuse to generate until weights have been loaded
    #[config(default = false)]
    pub require_loaded: bool,
}

impl GeneratorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GenerativeModel<B> {
        let shared = SharedEncoderConfig::new().with_dropout(self.shared_dropout);
        GenerativeModel {
            device:         device.clone(),
            slot:           Mutex::new(Slot {
                stages: InferenceStages::new(&shared, device),
                state:  ModelState::Unloaded,
            }),
            extractor:      Box::new(PassthroughExtractor),
            preprocessor:   ImagePreprocessor::default(),
            require_loaded: self.require_loaded,
        }
    }
}

// ─── GenerativeModel ─────────────────────────────────────────────────────────
struct Slot<B: Backend> {
    stages: InferenceStages<B>,
    state:  ModelState,
}

pub struct GenerativeModel<B: Backend> {
    device:         B::Device,
    slot:           Mutex<Slot<B>>,
    extractor:      Box<dyn FaceExtractor>,
    preprocessor:   ImagePreprocessor,
    require_loaded: bool,
}

impl<B: Backend> GenerativeModel<B> {
    /// Swap in a different face extraction collaborator.
    pub fn with_extractor(mut self, extractor: Box<dyn FaceExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn state(&self) -> Result<ModelState, PipelineError> {
        Ok(self.lock()?.state.clone())
    }

    /// Run the raw tensor pipeline on a `[N, 3, 64, 64]` batch.
    pub fn translate(&self, x: Tensor<B, 4>, mode: Mode) -> Result<Tensor<B, 4>, PipelineError> {
        let stages = self.snapshot()?;
        Ok(stages.forward(x, mode)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Slot<B>>, PipelineError> {
        self.slot.lock().map_err(|_| PipelineError::Poisoned)
    }

    /// Copy of the current stages, gradient tracking off.
    fn snapshot(&self) -> Result<InferenceStages<B>, PipelineError> {
        let slot = self.lock()?;
        if !slot.state.is_loaded() {
            if self.require_loaded {
                return Err(PipelineError::NotLoaded);
            }
            tracing::warn!("No weights loaded, generating with randomly initialised parameters");
        }
        Ok(slot.stages.clone().no_grad())
    }
}

impl<B: Backend> CartoonGenerator for GenerativeModel<B> {
    fn generate(&self, face: &DynamicImage, output: Option<&Path>) -> Result<RgbImage, PipelineError> {
        let stages = self.snapshot()?;

        let face   = self.extractor.extract(face.clone())?;
        let input  = self.preprocessor.to_tensor::<B>(&face, &self.device);
        let result = stages.forward(input, Mode::Evaluation)?;
        let image  = self.preprocessor.to_image(result)?;

        if let Some(path) = output {
            image.save(path).map_err(|source| PipelineError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::debug!("Saved cartoon to '{}'", path.display());
        }
        Ok(image)
    }
}

impl<B: Backend> WeightLifecycle for GenerativeModel<B> {
    fn load_weights(&self, dir: &Path) -> Result<(), PipelineError> {
        let store = WeightStore::new(dir);
        let sets  = [
            store.read(StageId::Encoder)?,
            store.read(StageId::SharedEncoder)?,
            store.read(StageId::SharedDecoder)?,
            store.read(StageId::Decoder)?,
            store.read(StageId::Denoiser)?,
        ];

        // Import into a copy; the live stages stay untouched until every stage fits.
        let staged = self.lock()?.stages.clone();
        let loaded = staged.load_parameters(&sets)?;

        let mut slot = self.lock()?;
        slot.stages  = loaded;
        slot.state   = ModelState::Loaded { source: dir.to_path_buf() };

        tracing::info!("Loaded weights for {} stages from '{}'", sets.len(), dir.display());
        Ok(())
    }

    fn save_weights(&self, dir: &Path) -> Result<(), PipelineError> {
        let stages = self.lock()?.stages.clone();
        let store  = WeightStore::new(dir);
        for (stage, set) in stages.parameters() {
            store.write(stage, &set)?;
        }
        tracing::info!("Saved weights for {} stages to '{}'", StageId::INFERENCE.len(), dir.display());
        Ok(())
    }
}

// ─── Any stage, by identity ──────────────────────────────────────────────────
/// Freshly initialised parameters for `stage`, labelled with its file stem.
pub fn initial_parameters<B: Backend>(stage: StageId, device: &B::Device) -> ParameterSet {
    let label = stage.file_stem();
    match stage {
        StageId::Encoder          => Encoder::<B>::new(device).parameters(label),
        StageId::SharedEncoder    => SharedEncoderConfig::new().init::<B>(device).parameters(label),
        StageId::SharedDecoder    => SharedDecoder::<B>::new(device).parameters(label),
        StageId::Decoder          => Decoder::<B>::new(device).parameters(label),
        StageId::Denoiser         => Denoiser::<B>::new(device).parameters(label),
        StageId::Discriminator    => Discriminator::<B>::new(device).parameters(label),
        StageId::DomainClassifier => DomainClassifierConfig::new().init::<B>(device).parameters(label),
    }
}

/// Check that `set` fits the architecture of `stage` by importing it
/// into a fresh instance.
pub fn verify_parameters<B: Backend>(
    stage:  StageId,
    set:    &ParameterSet,
    device: &B::Device,
) -> Result<(), LoadError> {
    match stage {
        StageId::Encoder          => Encoder::<B>::new(device).load_parameters(set).map(drop),
        StageId::SharedEncoder    => SharedEncoderConfig::new().init::<B>(device).load_parameters(set).map(drop),
        StageId::SharedDecoder    => SharedDecoder::<B>::new(device).load_parameters(set).map(drop),
        StageId::Decoder          => Decoder::<B>::new(device).load_parameters(set).map(drop),
        StageId::Denoiser         => Denoiser::<B>::new(device).load_parameters(set).map(drop),
        StageId::Discriminator    => Discriminator::<B>::new(device).load_parameters(set).map(drop),
        StageId::DomainClassifier => DomainClassifierConfig::new().init::<B>(device).load_parameters(set).map(drop),
    }
}
