// ============================================================
// Layer 2 — WeightsUseCase
// ============================================================
// Housekeeping for a weights directory:
//
//   init    — write freshly initialised weight files for the
//             five inference stages (optionally the two
//             training-only stages too) plus pipeline.json.
//             Gives `generate` something to load before real
//             trained weights are dropped in.
//
//   inspect — summarise every weight file present: tensor
//             count, parameter count, shapes, and whether the
//             file fits the stage's current architecture.
//
// Reference: Rust Book §8 (Collections)

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result};

use crate::application::config::{PipelineConfig, CONFIG_FILE};
use crate::domain::{lifecycle::StageId, traits::WeightLifecycle};
use crate::infra::weight_store::WeightStore;
use crate::ml::{
    generator::{initial_parameters, verify_parameters},
    InferBackend,
};

/// What `inspect` reports for one weight file
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage:   StageId,
    pub path:    PathBuf,
    pub tensors: usize,
    pub values:  usize,
    pub shapes:  BTreeMap<String, Vec<usize>>,
    /// `None` when the file fits the architecture, otherwise why not
    pub problem: Option<String>,
}

pub struct WeightsUseCase {
    config: PipelineConfig,
}

impl WeightsUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Returns the paths of every file written.
    pub fn init(&self, training_stages: bool) -> Result<Vec<PathBuf>> {
        let dir    = &self.config.weights_dir;
        let device = Default::default();

        let model = self.config.generator().init::<InferBackend>(&device);
        model.save_weights(dir)
            .with_context(|| format!("Cannot initialise weights in '{}'", dir.display()))?;

        let store = WeightStore::new(dir);
        let mut written: Vec<PathBuf> = StageId::INFERENCE.iter().map(|id| store.path_for(*id)).collect();

        if training_stages {
            for stage in [StageId::Discriminator, StageId::DomainClassifier] {
                let set = initial_parameters::<InferBackend>(stage, &device);
                written.push(store.write(stage, &set)?);
            }
        }

        let config_path = dir.join(CONFIG_FILE);
        self.config.save(&config_path)?;
        written.push(config_path);

        tracing::info!("Initialised {} files in '{}'", written.len(), dir.display());
        Ok(written)
    }

    pub fn inspect(&self) -> Result<Vec<StageSummary>> {
        let store  = WeightStore::new(&self.config.weights_dir);
        let device = Default::default();

        let available = store.available();
        if available.is_empty() {
            tracing::warn!("No weight files in '{}'", store.dir().display());
        }

        available
            .into_iter()
            .map(|stage| -> Result<StageSummary> {
                let path = store.path_for(stage);
                let set  = store.read(stage)
                    .with_context(|| format!("Cannot read '{}'", path.display()))?;
                let problem = verify_parameters::<InferBackend>(stage, &set, &device)
                    .err()
                    .map(|e| e.to_string());

                Ok(StageSummary {
                    stage,
                    path,
                    tensors: set.len(),
                    values:  set.num_values(),
                    shapes:  set.shapes(),
                    problem,
                })
            })
            .collect()
    }
}
