// ============================================================
// Layer 5 — SharedEncoder
// ============================================================
// Maps domain features into the latent space both domains
// share:
//
//   [N, 64, 16, 16]
//     conv3 64→128  k3 s2 p1 → ReLU → b3     [N, 128, 8, 8]
//     conv4 128→256 k3 s2 p1 → ReLU → b4     [N, 256, 4, 4]
//     flatten                                [N, 4096]
//     fc1 4096→1024 → ReLU → bfc1 → dropout  [N, 1024]
//     fc2 1024→1024 → ReLU → bfc2            [N, 1024]  ← shared latent
//
// Dropout only fires in Mode::Training.

use burn::{
    nn::{conv::Conv2d, Dropout, DropoutConfig, Linear},
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::{
    error::{LoadError, ShapeError},
    lifecycle::Mode,
    parameters::ParameterSet,
};
use crate::ml::encoder::{FEATURE_CHANNELS, FEATURE_SIZE};
use crate::ml::layers::{dropout, linear, strided_conv, BatchNorm, NamedParameters, ParamReader};
use crate::ml::stage::{expect_trailing, Stage, LATENT_DIM};

/// Channels and size of the last convolutional map before flattening
const BOTTLENECK_CHANNELS: usize = 256;
const BOTTLENECK_SIZE: usize = FEATURE_SIZE / 4;

#[derive(Config, Debug)]
pub struct SharedEncoderConfig {
    /// Probability of zeroing a latent unit while training
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl SharedEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SharedEncoder<B> {
        let flat = BOTTLENECK_CHANNELS * BOTTLENECK_SIZE * BOTTLENECK_SIZE;
        SharedEncoder {
            conv3:   strided_conv([FEATURE_CHANNELS, 128], false, device),
            b3:      BatchNorm::new(128, device),
            conv4:   strided_conv([128, BOTTLENECK_CHANNELS], false, device),
            b4:      BatchNorm::new(BOTTLENECK_CHANNELS, device),
            fc1:     linear(flat, LATENT_DIM, false, device),
            bfc1:    BatchNorm::new(LATENT_DIM, device),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc2:     linear(LATENT_DIM, LATENT_DIM, false, device),
            bfc2:    BatchNorm::new(LATENT_DIM, device),
        }
    }
}

#[derive(Module, Debug)]
pub struct SharedEncoder<B: Backend> {
    conv3:   Conv2d<B>,
    b3:      BatchNorm<B>,
    conv4:   Conv2d<B>,
    b4:      BatchNorm<B>,
    fc1:     Linear<B>,
    bfc1:    BatchNorm<B>,
    dropout: Dropout,
    fc2:     Linear<B>,
    bfc2:    BatchNorm<B>,
}

impl<B: Backend> Stage<B> for SharedEncoder<B> {
    const KIND: &'static str = "shared_encoder";

    type Input  = Tensor<B, 4>;
    type Output = Tensor<B, 2>;

    fn forward(&self, x: Tensor<B, 4>, mode: Mode) -> Result<Tensor<B, 2>, ShapeError> {
        expect_trailing(Self::KIND, x.dims(), &[FEATURE_CHANNELS, FEATURE_SIZE, FEATURE_SIZE])?;

        let x = self.b3.forward(relu(self.conv3.forward(x)), mode);
        let x = self.b4.forward(relu(self.conv4.forward(x)), mode);

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.bfc1.forward(relu(self.fc1.forward(x)), mode);
        let x = dropout(x, self.dropout.prob, mode);
        let x = self.bfc2.forward(relu(self.fc2.forward(x)), mode);
        Ok(x)
    }

    fn export_parameters(&self, set: &mut ParameterSet) {
        self.conv3.export("conv3", set);
        self.b3.export("b3", set);
        self.conv4.export("conv4", set);
        self.b4.export("b4", set);
        self.fc1.export("fc1", set);
        self.bfc1.export("bfc1", set);
        self.fc2.export("fc2", set);
        self.bfc2.export("bfc2", set);
    }

    fn import_parameters(self, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        Ok(Self {
            conv3:   self.conv3.import("conv3", reader)?,
            b3:      self.b3.import("b3", reader)?,
            conv4:   self.conv4.import("conv4", reader)?,
            b4:      self.b4.import("b4", reader)?,
            fc1:     self.fc1.import("fc1", reader)?,
            bfc1:    self.bfc1.import("bfc1", reader)?,
            dropout: self.dropout,
            fc2:     self.fc2.import("fc2", reader)?,
            bfc2:    self.bfc2.import("bfc2", reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    fn features(batch: usize) -> Tensor<TestBackend, 4> {
        Tensor::random([batch, 64, 16, 16], Distribution::Default, &Default::default())
    }

    #[test]
    fn emits_latent_vector() {
        let stage = SharedEncoderConfig::new().init::<TestBackend>(&Default::default());
        let out = stage.forward(features(3), Mode::Evaluation).unwrap();
        assert_eq!(out.dims(), [3, LATENT_DIM]);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let stage = SharedEncoderConfig::new().init::<TestBackend>(&Default::default());
        let x = features(1);
        let a: Vec<f32> = stage.forward(x.clone(), Mode::Evaluation).unwrap().into_data().iter().collect();
        let b: Vec<f32> = stage.forward(x, Mode::Evaluation).unwrap().into_data().iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn training_dropout_varies_between_calls() {
        let stage = SharedEncoderConfig::new().init::<TestBackend>(&Default::default());
        let x = features(4);
        let a: Vec<f32> = stage.forward(x.clone(), Mode::Training).unwrap().into_data().iter().collect();
        let b: Vec<f32> = stage.forward(x, Mode::Training).unwrap().into_data().iter().collect();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_image_sized_input() {
        let stage = SharedEncoderConfig::new().init::<TestBackend>(&Default::default());
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 64, 64], &Default::default());
        assert!(stage.forward(x, Mode::Evaluation).is_err());
    }

    #[test]
    fn fully_connected_weights_use_state_dict_layout() {
        let stage = SharedEncoderConfig::new().init::<TestBackend>(&Default::default());
        let set = stage.parameters("e_shared");
        assert_eq!(set.get("fc1.weight").unwrap().shape, vec![LATENT_DIM, 4096]);
        assert_eq!(set.get("bfc2.running_var").unwrap().shape, vec![LATENT_DIM]);
        assert!(set.get("fc1.bias").is_none());
    }
}
