// ============================================================
// Layer 3 — Error Types
// ============================================================
// Every failure in this pipeline points at a configuration or
// integration defect (wrong weights, wrong shapes, bad output
// path), never at a transient condition. So nothing here is
// retried: errors are typed, carry enough context to fix the
// setup, and propagate straight to the caller.
//
//   LoadError     — a weight file is missing, unreadable, or
//                   does not fit the stage's architecture
//   ShapeError    — a tensor entering a stage has the wrong shape
//   PipelineError — everything `generate` / `load_weights` /
//                   `save_weights` can report
//
// The application and CLI layers wrap these in anyhow::Error.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while restoring a stage's parameters.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("weight file for stage '{stage}' not found at '{}'", .path.display())]
    Missing { stage: String, path: PathBuf },

    #[error("cannot read weight file '{}': {source}", .path.display())]
    Unreadable {
        stage:  String,
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("weight file '{}' is not a valid parameter set: {reason}", .path.display())]
    Corrupt { stage: String, path: PathBuf, reason: String },

    #[error("weight file '{}' holds parameters of stage '{found}', expected '{stage}'", .path.display())]
    StageMismatch { stage: String, path: PathBuf, found: String },

    #[error("stage '{stage}': parameter '{name}' is missing from the weights")]
    MissingParameter { stage: String, name: String },

    #[error("stage '{stage}': unexpected parameter '{name}' in the weights")]
    UnexpectedParameter { stage: String, name: String },

    #[error("stage '{stage}': parameter '{name}' has shape {actual:?}, architecture expects {expected:?}")]
    ShapeMismatch {
        stage:    String,
        name:     String,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    #[error("stage '{stage}': parameter '{name}' declares {expected} values but stores {actual}")]
    MalformedTensor {
        stage:    String,
        name:     String,
        expected: usize,
        actual:   usize,
    },
}

/// A tensor entering a stage does not have the shape the stage was built for.
///
/// `expected` lists the trailing dimensions (everything after the batch
/// dimension); `actual` is the full shape that was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stage '{stage}' expects input [N, {}], got {actual:?}", join_dims(.expected))]
pub struct ShapeError {
    pub stage:    &'static str,
    pub expected: Vec<usize>,
    pub actual:   Vec<usize>,
}

fn join_dims(dims: &[usize]) -> String {
    dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
}

/// Everything the generative model can report to its caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("cannot persist weights to '{}': {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write output image '{}': {source}", .path.display())]
    Write {
        path:   PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot convert tensor to image: {0}")]
    Image(String),

    #[error("weights have not been loaded; call load_weights before generate")]
    NotLoaded,

    #[error("face extraction failed: {0}")]
    FaceExtraction(String),

    #[error("model state lock is poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_error_names_stage_and_dims() {
        let err = ShapeError {
            stage:    "encoder",
            expected: vec![3, 64, 64],
            actual:   vec![1, 3, 32, 32],
        };
        assert_eq!(
            err.to_string(),
            "stage 'encoder' expects input [N, 3, 64, 64], got [1, 3, 32, 32]"
        );
    }

    #[test]
    fn load_error_converts_into_pipeline_error() {
        let err: PipelineError = LoadError::Missing {
            stage: "e1".into(),
            path:  PathBuf::from("weights/e1.bin"),
        }
        .into();
        assert!(matches!(err, PipelineError::Load(LoadError::Missing { .. })));
        assert!(err.to_string().contains("weights/e1.bin"));
    }
}
