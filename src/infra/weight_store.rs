// ============================================================
// Layer 6 — Weight Store
// ============================================================
// One file per stage inside a weights directory:
//
//   weights/
//     e1.bin        ← Encoder
//     e_shared.bin  ← SharedEncoder
//     d_shared.bin  ← SharedDecoder
//     d2.bin        ← Decoder (cartoon domain)
//     denoiser.bin  ← Denoiser
//     disc.bin      ← Discriminator (training only, optional)
//     c_dann.bin    ← DomainClassifier (training only, optional)
//
// Each file is a bincode-encoded ParameterSet: the stage label
// plus every tensor by state-dict name, shape and f32 values.
// Round trips are exact.
//
// Writes go to a temporary sibling first and are renamed into
// place, so a crash mid-write never leaves a truncated file
// under the real name.
//
// Reference: Rust Book §9 (Error Handling)
//            bincode docs (serialize_into / deserialize_from)

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::domain::{
    error::{LoadError, PipelineError},
    lifecycle::StageId,
    parameters::ParameterSet,
};

/// Extension of every weight file
pub const WEIGHT_EXTENSION: &str = "bin";

/// Reads and writes per-stage parameter sets in one directory.
#[derive(Debug, Clone)]
pub struct WeightStore {
    dir: PathBuf,
}

impl WeightStore {
    /// Does not touch the filesystem; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{stem}.bin`
    pub fn path_for(&self, stage: StageId) -> PathBuf {
        self.dir.join(format!("{}.{WEIGHT_EXTENSION}", stage.file_stem()))
    }

    pub fn exists(&self, stage: StageId) -> bool {
        self.path_for(stage).is_file()
    }

    /// Stages that have a weight file in the directory, in `StageId::ALL` order.
    pub fn available(&self) -> Vec<StageId> {
        StageId::ALL.into_iter().filter(|stage| self.exists(*stage)).collect()
    }

    /// Persist `set` as the weight file of `stage`.
    pub fn write(&self, stage: StageId, set: &ParameterSet) -> Result<PathBuf, PipelineError> {
        let path = self.path_for(stage);
        let tmp  = path.with_extension(format!("{WEIGHT_EXTENSION}.tmp"));
        let io_err = |source: io::Error| PipelineError::Io { path: path.clone(), source };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        let mut writer = BufWriter::new(File::create(&tmp).map_err(io_err)?);
        bincode::serialize_into(&mut writer, set)
            .map_err(|e| io_err(io::Error::other(e.to_string())))?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp, &path).map_err(io_err)?;

        tracing::debug!(
            "Wrote {} tensors ({} values) to '{}'",
            set.len(), set.num_values(), path.display()
        );
        Ok(path)
    }

    /// Read the weight file of `stage`. The file must carry the stage's label.
    pub fn read(&self, stage: StageId) -> Result<ParameterSet, LoadError> {
        let path  = self.path_for(stage);
        let label = stage.file_stem().to_string();

        let file = File::open(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::Missing {
                stage: label.clone(),
                path:  path.clone(),
            },
            _ => LoadError::Unreadable {
                stage: label.clone(),
                path:  path.clone(),
                source,
            },
        })?;

        let set: ParameterSet = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| LoadError::Corrupt {
                stage:  label.clone(),
                path:   path.clone(),
                reason: e.to_string(),
            })?;

        if set.stage() != label {
            return Err(LoadError::StageMismatch {
                stage: label,
                path,
                found: set.stage().to_string(),
            });
        }

        tracing::debug!("Read {} tensors from '{}'", set.len(), path.display());
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parameters::StoredTensor;
    use tempfile::tempdir;

    fn sample(stage: &str) -> ParameterSet {
        let mut set = ParameterSet::new(stage);
        set.insert("conv1.weight", StoredTensor::new(vec![2, 1, 1, 1], vec![0.25, -1.5]));
        set.insert("b1.running_var", StoredTensor::new(vec![2], vec![1.0, f32::MIN_POSITIVE]));
        set
    }

    #[test]
    fn names_files_after_the_stage() {
        let store = WeightStore::new("weights");
        assert_eq!(store.path_for(StageId::SharedEncoder), PathBuf::from("weights/e_shared.bin"));
        assert_eq!(store.path_for(StageId::DomainClassifier), PathBuf::from("weights/c_dann.bin"));
    }

    #[test]
    fn round_trip_is_exact() {
        let dir   = tempdir().unwrap();
        let store = WeightStore::new(dir.path().join("nested"));

        let written = store.write(StageId::Encoder, &sample("e1")).unwrap();
        assert!(written.ends_with("e1.bin"));
        assert_eq!(store.read(StageId::Encoder).unwrap(), sample("e1"));
        assert!(!dir.path().join("nested/e1.bin.tmp").exists());
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir   = tempdir().unwrap();
        let store = WeightStore::new(dir.path());
        assert!(matches!(
            store.read(StageId::Decoder),
            Err(LoadError::Missing { stage, .. }) if stage == "d2"
        ));
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let dir   = tempdir().unwrap();
        let store = WeightStore::new(dir.path());
        fs::write(store.path_for(StageId::Denoiser), b"\x01\x02").unwrap();
        assert!(matches!(store.read(StageId::Denoiser), Err(LoadError::Corrupt { .. })));
    }

    #[test]
    fn file_for_another_stage_is_rejected() {
        let dir   = tempdir().unwrap();
        let store = WeightStore::new(dir.path());
        store.write(StageId::Decoder, &sample("e1")).unwrap();
        assert!(matches!(
            store.read(StageId::Decoder),
            Err(LoadError::StageMismatch { found, .. }) if found == "e1"
        ));
    }

    #[test]
    fn lists_available_stages_in_order() {
        let dir   = tempdir().unwrap();
        let store = WeightStore::new(dir.path());
        store.write(StageId::Denoiser, &sample("denoiser")).unwrap();
        store.write(StageId::Encoder, &sample("e1")).unwrap();
        assert_eq!(store.available(), vec![StageId::Encoder, StageId::Denoiser]);
    }
}
