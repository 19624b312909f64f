// ============================================================
// Layer 5 — Building Blocks
// ============================================================
// Burn already provides convolutions, linear layers, pooling
// and interpolation; we use those directly. Two things are
// crate-local:
//
//   BatchNorm — Burn switches between batch and running
//               statistics based on the backend type. Here the
//               switch is the Mode argument, so evaluation is
//               explicit at every call site and also works on
//               an autodiff backend.
//   dropout() — same reason: only drops when Mode::Training.
//
// The second half of the file moves parameters between Burn
// modules and framework-free ParameterSets:
//
//   export: module → ParameterSet   (names + shapes + values)
//   import: ParameterSet → module   (shape-checked, by name)
//
// Import never mutates a live module: it consumes a module and
// returns a new one, so a failed import leaves nothing behind.

use std::collections::BTreeSet;

use burn::{
    module::{Param, RunningState},
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::Distribution,
};

use crate::domain::{
    error::LoadError,
    lifecycle::Mode,
    parameters::{ParameterSet, StoredTensor},
};

/// Numerical floor added to the variance before normalising
pub const BATCH_NORM_EPSILON: f64 = 1e-5;

// ─── BatchNorm ───────────────────────────────────────────────────────────────
/// Per-channel normalisation over dimension 1, for `[N, C]` and `[N, C, H, W]`.
///
/// In `Mode::Training` the batch statistics are used; the running
/// statistics are never updated by a forward pass.
#[derive(Module, Debug)]
pub struct BatchNorm<B: Backend> {
    pub gamma:        Param<Tensor<B, 1>>,
    pub beta:         Param<Tensor<B, 1>>,
    pub running_mean: RunningState<Tensor<B, 1>>,
    pub running_var:  RunningState<Tensor<B, 1>>,
}

impl<B: Backend> BatchNorm<B> {
    /// Identity-initialised normalisation: gamma 1, beta 0, mean 0, var 1.
    pub fn new(channels: usize, device: &B::Device) -> Self {
        Self {
            gamma:        Param::from_tensor(Tensor::ones([channels], device)),
            beta:         Param::from_tensor(Tensor::zeros([channels], device)),
            running_mean: RunningState::new(Tensor::zeros([channels], device)),
            running_var:  RunningState::new(Tensor::ones([channels], device)),
        }
    }

    pub fn channels(&self) -> usize {
        self.gamma.val().dims()[0]
    }

    pub fn forward<const D: usize>(&self, x: Tensor<B, D>, mode: Mode) -> Tensor<B, D> {
        let channels = x.dims()[1];
        let (mean, var) = match mode {
            Mode::Evaluation => (self.running_mean.value(), self.running_var.value()),
            Mode::Training   => batch_statistics(x.clone()),
        };

        let shape = channel_shape::<D>(channels);
        let std   = var.add_scalar(BATCH_NORM_EPSILON).sqrt().reshape(shape);
        let x     = (x - mean.reshape(shape)) / std;

        x * self.gamma.val().reshape(shape) + self.beta.val().reshape(shape)
    }
}

/// `[1, C, 1, ...]` so per-channel vectors broadcast over a rank-D tensor.
fn channel_shape<const D: usize>(channels: usize) -> [usize; D] {
    let mut shape = [1; D];
    shape[1] = channels;
    shape
}

/// Biased mean and variance per channel (dimension 1).
fn batch_statistics<B: Backend, const D: usize>(x: Tensor<B, D>) -> (Tensor<B, 1>, Tensor<B, 1>) {
    let channels = x.dims()[1];
    let per_channel: Tensor<B, 2> = x.swap_dims(0, 1).reshape([channels as i32, -1]);

    let mean = per_channel.clone().mean_dim(1);
    let var  = (per_channel - mean.clone()).powf_scalar(2.0).mean_dim(1);

    (mean.reshape([channels]), var.reshape([channels]))
}

// ─── Dropout ─────────────────────────────────────────────────────────────────
/// Inverted dropout: zero each element with probability `prob` and
/// rescale the survivors. Identity outside `Mode::Training`.
pub fn dropout<B: Backend, const D: usize>(x: Tensor<B, D>, prob: f64, mode: Mode) -> Tensor<B, D> {
    if !mode.is_training() || prob <= 0.0 {
        return x;
    }
    let keep = 1.0 - prob;
    let mask = x.random_like(Distribution::Bernoulli(keep));
    (x * mask).div_scalar(keep)
}

// ─── Layer constructors ──────────────────────────────────────────────────────
/// 3×3, stride 2, padding 1: halves the spatial resolution.
pub fn strided_conv<B: Backend>(
    channels: [usize; 2],
    bias:     bool,
    device:   &B::Device,
) -> Conv2d<B> {
    Conv2dConfig::new(channels, [3, 3])
        .with_stride([2, 2])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(bias)
        .init(device)
}

/// 3×3, stride 1, padding 1: keeps the spatial resolution.
pub fn same_conv<B: Backend>(channels: [usize; 2], device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new(channels, [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

/// Transposed convolution with stride 2 and no padding.
pub fn upsample_deconv<B: Backend>(
    channels: [usize; 2],
    kernel:   usize,
    bias:     bool,
    device:   &B::Device,
) -> ConvTranspose2d<B> {
    ConvTranspose2dConfig::new(channels, [kernel, kernel])
        .with_stride([2, 2])
        .with_bias(bias)
        .init(device)
}

pub fn linear<B: Backend>(d_input: usize, d_output: usize, bias: bool, device: &B::Device) -> Linear<B> {
    LinearConfig::new(d_input, d_output).with_bias(bias).init(device)
}

// ─── Parameter export ────────────────────────────────────────────────────────
/// Copy a tensor into the set under `name`.
pub fn export_tensor<B: Backend, const D: usize>(
    set:    &mut ParameterSet,
    name:   impl Into<String>,
    tensor: Tensor<B, D>,
) {
    let shape  = tensor.dims().to_vec();
    let values = tensor.into_data().iter::<f32>().collect();
    set.insert(name, StoredTensor::new(shape, values));
}

// ─── Parameter import ────────────────────────────────────────────────────────
/// Reads tensors out of a ParameterSet by name and remembers which
/// names were used, so leftovers can be reported as unexpected.
pub struct ParamReader<'a> {
    stage:   &'a str,
    set:     &'a ParameterSet,
    visited: BTreeSet<String>,
}

impl<'a> ParamReader<'a> {
    pub fn new(stage: &'a str, set: &'a ParameterSet) -> Self {
        Self { stage, set, visited: BTreeSet::new() }
    }

    /// Fetch `name` as a rank-D tensor. The stored shape must equal `expected`.
    pub fn tensor<B: Backend, const D: usize>(
        &mut self,
        name:     &str,
        expected: [usize; D],
        device:   &B::Device,
    ) -> Result<Tensor<B, D>, LoadError> {
        let stored = self.set.get(name).ok_or_else(|| LoadError::MissingParameter {
            stage: self.stage.to_string(),
            name:  name.to_string(),
        })?;
        self.visited.insert(name.to_string());

        if stored.shape.as_slice() != expected.as_slice() {
            return Err(LoadError::ShapeMismatch {
                stage:    self.stage.to_string(),
                name:     name.to_string(),
                expected: expected.to_vec(),
                actual:   stored.shape.clone(),
            });
        }
        if !stored.is_consistent() {
            return Err(LoadError::MalformedTensor {
                stage:    self.stage.to_string(),
                name:     name.to_string(),
                expected: stored.numel(),
                actual:   stored.values.len(),
            });
        }

        let data = TensorData::new(stored.values.clone(), expected);
        Ok(Tensor::from_data(data, device))
    }

    /// Fail on the first tensor in the set that no layer asked for.
    pub fn finish(self) -> Result<(), LoadError> {
        match self.set.names().find(|name| !self.visited.contains(*name)) {
            Some(name) => Err(LoadError::UnexpectedParameter {
                stage: self.stage.to_string(),
                name:  name.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// A layer whose learned tensors can be exported and re-imported by name.
pub trait NamedParameters: Sized {
    fn export(&self, prefix: &str, set: &mut ParameterSet);

    fn import(self, prefix: &str, reader: &mut ParamReader<'_>) -> Result<Self, LoadError>;
}

impl<B: Backend> NamedParameters for Conv2d<B> {
    fn export(&self, prefix: &str, set: &mut ParameterSet) {
        export_tensor(set, format!("{prefix}.weight"), self.weight.val());
        if let Some(bias) = &self.bias {
            export_tensor(set, format!("{prefix}.bias"), bias.val());
        }
    }

    fn import(mut self, prefix: &str, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        let weight = self.weight.val();
        let device = weight.device();
        let bias_dims = self.bias.as_ref().map(|bias| bias.val().dims());

        self.weight = Param::from_tensor(reader.tensor(&format!("{prefix}.weight"), weight.dims(), &device)?);
        if let Some(dims) = bias_dims {
            self.bias = Some(Param::from_tensor(reader.tensor(&format!("{prefix}.bias"), dims, &device)?));
        }
        Ok(self)
    }
}

impl<B: Backend> NamedParameters for ConvTranspose2d<B> {
    fn export(&self, prefix: &str, set: &mut ParameterSet) {
        export_tensor(set, format!("{prefix}.weight"), self.weight.val());
        if let Some(bias) = &self.bias {
            export_tensor(set, format!("{prefix}.bias"), bias.val());
        }
    }

    fn import(mut self, prefix: &str, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        let weight = self.weight.val();
        let device = weight.device();
        let bias_dims = self.bias.as_ref().map(|bias| bias.val().dims());

        self.weight = Param::from_tensor(reader.tensor(&format!("{prefix}.weight"), weight.dims(), &device)?);
        if let Some(dims) = bias_dims {
            self.bias = Some(Param::from_tensor(reader.tensor(&format!("{prefix}.bias"), dims, &device)?));
        }
        Ok(self)
    }
}

/// Burn stores linear weights `[in, out]`; the files use `[out, in]`.
impl<B: Backend> NamedParameters for Linear<B> {
    fn export(&self, prefix: &str, set: &mut ParameterSet) {
        export_tensor(set, format!("{prefix}.weight"), self.weight.val().transpose());
        if let Some(bias) = &self.bias {
            export_tensor(set, format!("{prefix}.bias"), bias.val());
        }
    }

    fn import(mut self, prefix: &str, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        let weight = self.weight.val();
        let device = weight.device();
        let [d_input, d_output] = weight.dims();
        let bias_dims = self.bias.as_ref().map(|bias| bias.val().dims());

        let stored: Tensor<B, 2> = reader.tensor(&format!("{prefix}.weight"), [d_output, d_input], &device)?;
        self.weight = Param::from_tensor(stored.transpose());
        if let Some(dims) = bias_dims {
            self.bias = Some(Param::from_tensor(reader.tensor(&format!("{prefix}.bias"), dims, &device)?));
        }
        Ok(self)
    }
}

impl<B: Backend> NamedParameters for BatchNorm<B> {
    fn export(&self, prefix: &str, set: &mut ParameterSet) {
        export_tensor(set, format!("{prefix}.weight"), self.gamma.val());
        export_tensor(set, format!("{prefix}.bias"), self.beta.val());
        export_tensor(set, format!("{prefix}.running_mean"), self.running_mean.value());
        export_tensor(set, format!("{prefix}.running_var"), self.running_var.value());
    }

    fn import(self, prefix: &str, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        let gamma  = self.gamma.val();
        let device = gamma.device();
        let dims   = gamma.dims();

        Ok(Self {
            gamma:        Param::from_tensor(reader.tensor(&format!("{prefix}.weight"), dims, &device)?),
            beta:         Param::from_tensor(reader.tensor(&format!("{prefix}.bias"), dims, &device)?),
            running_mean: RunningState::new(reader.tensor(&format!("{prefix}.running_mean"), dims, &device)?),
            running_var:  RunningState::new(reader.tensor(&format!("{prefix}.running_var"), dims, &device)?),
        })
    }
}
