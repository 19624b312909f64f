// ============================================================
// Layer 5 — The Stage Contract
// ============================================================
// Every component of the architecture family is a Stage:
//
//   forward(input, mode)  → output         (pure, Result on bad shape)
//   parameters()          → ParameterSet   (named copy of the weights)
//   load_parameters(set)  → new Self       (wholesale replacement)
//
// Parameter storage stays inside the Burn module; the forward
// pass never mutates it. Loading consumes the old stage and
// returns a new one, so a failed load can't leave a stage half
// updated.

use burn::prelude::*;

use crate::domain::{
    error::{LoadError, ShapeError},
    lifecycle::Mode,
    parameters::ParameterSet,
};
use crate::ml::layers::ParamReader;

/// Channels of every image tensor
pub const IMAGE_CHANNELS: usize = 3;

/// Height and width the encoder is built for
pub const IMAGE_SIZE: usize = 64;

/// Length of the shared latent vector
pub const LATENT_DIM: usize = 1024;

pub trait Stage<B: Backend>: Module<B> + Sized {
    /// Human readable kind, used in shape errors
    const KIND: &'static str;

    type Input;
    type Output;

    fn forward(&self, input: Self::Input, mode: Mode) -> Result<Self::Output, ShapeError>;

    /// Write every learned tensor into `set` under its state-dict name.
    fn export_parameters(&self, set: &mut ParameterSet);

    /// Rebuild the stage from `reader`, checking every shape.
    fn import_parameters(self, reader: &mut ParamReader<'_>) -> Result<Self, LoadError>;

    /// Snapshot of the stage's parameters, labelled `stage`.
    fn parameters(&self, stage: &str) -> ParameterSet {
        let mut set = ParameterSet::new(stage);
        self.export_parameters(&mut set);
        set
    }

    /// Replace the whole parameter set. Missing, extra or mis-shaped
    /// tensors are errors; on error the original stage is dropped and
    /// the caller keeps whatever it held before.
    fn load_parameters(self, set: &ParameterSet) -> Result<Self, LoadError> {
        let mut reader = ParamReader::new(set.stage(), set);
        let stage = self.import_parameters(&mut reader)?;
        reader.finish()?;
        Ok(stage)
    }
}

/// Check every dimension after the batch dimension.
pub fn expect_trailing<const D: usize>(
    stage:    &'static str,
    dims:     [usize; D],
    expected: &[usize],
) -> Result<(), ShapeError> {
    if &dims[1..] == expected {
        Ok(())
    } else {
        Err(ShapeError {
            stage,
            expected: expected.to_vec(),
            actual:   dims.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_dims_ignore_the_batch() {
        assert!(expect_trailing("probe", [7, 3, 64, 64], &[3, 64, 64]).is_ok());
        let err = expect_trailing("probe", [1, 3, 32, 32], &[3, 64, 64]).unwrap_err();
        assert_eq!(err.actual, vec![1, 3, 32, 32]);
        assert_eq!(err.stage, "probe");
    }
}
