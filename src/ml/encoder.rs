// ============================================================
// Layer 5 — Encoder (photo domain)
// ============================================================
//   [N, 3, 64, 64]
//     conv1 3→32  k3 s2 p1 → ReLU → b1   [N, 32, 32, 32]
//     conv2 32→64 k3 s2 p1 → ReLU → b2   [N, 64, 16, 16]
//
// Convolutions carry no bias, the normalisation absorbs it.
// The rectifier runs before the normalisation, which is the
// order the published weights were trained with.

use burn::{
    nn::conv::Conv2d,
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::{
    error::{LoadError, ShapeError},
    lifecycle::Mode,
    parameters::ParameterSet,
};
use crate::ml::layers::{strided_conv, BatchNorm, NamedParameters, ParamReader};
use crate::ml::stage::{expect_trailing, Stage, IMAGE_CHANNELS, IMAGE_SIZE};

/// Channels of the feature map handed to the shared encoder
pub const FEATURE_CHANNELS: usize = 64;

/// Spatial size of that feature map
pub const FEATURE_SIZE: usize = IMAGE_SIZE / 4;

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    conv1: Conv2d<B>,
    b1:    BatchNorm<B>,
    conv2: Conv2d<B>,
    b2:    BatchNorm<B>,
}

impl<B: Backend> Encoder<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            conv1: strided_conv([IMAGE_CHANNELS, 32], false, device),
            b1:    BatchNorm::new(32, device),
            conv2: strided_conv([32, FEATURE_CHANNELS], false, device),
            b2:    BatchNorm::new(FEATURE_CHANNELS, device),
        }
    }
}

impl<B: Backend> Stage<B> for Encoder<B> {
    const KIND: &'static str = "encoder";

    type Input  = Tensor<B, 4>;
    type Output = Tensor<B, 4>;

    fn forward(&self, x: Tensor<B, 4>, mode: Mode) -> Result<Tensor<B, 4>, ShapeError> {
        expect_trailing(Self::KIND, x.dims(), &[IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE])?;

        let x = self.b1.forward(relu(self.conv1.forward(x)), mode);
        let x = self.b2.forward(relu(self.conv2.forward(x)), mode);
        Ok(x)
    }

    fn export_parameters(&self, set: &mut ParameterSet) {
        self.conv1.export("conv1", set);
        self.b1.export("b1", set);
        self.conv2.export("conv2", set);
        self.b2.export("b2", set);
    }

    fn import_parameters(self, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        Ok(Self {
            conv1: self.conv1.import("conv1", reader)?,
            b1:    self.b1.import("b1", reader)?,
            conv2: self.conv2.import("conv2", reader)?,
            b2:    self.b2.import("b2", reader)?,
        })
    }
}
