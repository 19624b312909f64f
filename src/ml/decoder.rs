// ============================================================
// Layer 5 — Decoder (domain specific)
// ============================================================
//   [N, 256, 8, 8]
//     deconv3 256→128 k2 s2 → ReLU → bd3   [N, 128, 16, 16]
//     deconv4 128→64  k2 s2 → ReLU → bd4   [N, 64, 32, 32]
//     deconv5 64→3    k2 s2 → tanh         [N, 3, 64, 64]  in [-1, 1]
//
// The same type serves both domains. Only the cartoon-domain
// instance (weight file `d2`) is part of the inference path.

use burn::{
    nn::conv::ConvTranspose2d,
    prelude::*,
    tensor::activation::{relu, tanh},
};

use crate::domain::{
    error::{LoadError, ShapeError},
    lifecycle::Mode,
    parameters::ParameterSet,
};
use crate::ml::layers::{upsample_deconv, BatchNorm, NamedParameters, ParamReader};
use crate::ml::shared_decoder::{SEED_CHANNELS, SEED_SIZE};
use crate::ml::stage::{expect_trailing, Stage, IMAGE_CHANNELS};

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    deconv3: ConvTranspose2d<B>,
    bd3:     BatchNorm<B>,
    deconv4: ConvTranspose2d<B>,
    bd4:     BatchNorm<B>,
    deconv5: ConvTranspose2d<B>,
}

impl<B: Backend> Decoder<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            deconv3: upsample_deconv([SEED_CHANNELS, 128], 2, false, device),
            bd3:     BatchNorm::new(128, device),
            deconv4: upsample_deconv([128, 64], 2, false, device),
            bd4:     BatchNorm::new(64, device),
            deconv5: upsample_deconv([64, IMAGE_CHANNELS], 2, true, device),
        }
    }
}

impl<B: Backend> Stage<B> for Decoder<B> {
    const KIND: &'static str = "decoder";

    type Input  = Tensor<B, 4>;
    type Output = Tensor<B, 4>;

    fn forward(&self, x: Tensor<B, 4>, mode: Mode) -> Result<Tensor<B, 4>, ShapeError> {
        expect_trailing(Self::KIND, x.dims(), &[SEED_CHANNELS, SEED_SIZE, SEED_SIZE])?;

        let x = self.bd3.forward(relu(self.deconv3.forward(x)), mode);
        let x = self.bd4.forward(relu(self.deconv4.forward(x)), mode);
        Ok(tanh(self.deconv5.forward(x)))
    }

    fn export_parameters(&self, set: &mut ParameterSet) {
        self.deconv3.export("deconv3", set);
        self.bd3.export("bd3", set);
        self.deconv4.export("deconv4", set);
        self.bd4.export("bd4", set);
        self.deconv5.export("deconv5", set);
    }

    fn import_parameters(self, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        Ok(Self {
            deconv3: self.deconv3.import("deconv3", reader)?,
            bd3:     self.bd3.import("bd3", reader)?,
            deconv4: self.deconv4.import("deconv4", reader)?,
            bd4:     self.bd4.import("bd4", reader)?,
            deconv5: self.deconv5.import("deconv5", reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn reconstructs_bounded_image() {
        let device  = Default::default();
        let decoder = Decoder::<TestBackend>::new(&device);
        let x = Tensor::<TestBackend, 4>::random([2, 256, 8, 8], Distribution::Normal(0.0, 4.0), &device);

        let out = decoder.forward(x, Mode::Evaluation).unwrap();
        assert_eq!(out.dims(), [2, 3, 64, 64]);

        let values: Vec<f32> = out.into_data().iter().collect();
        assert!(values.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn only_the_output_layer_has_a_bias() {
        let device = Default::default();
        let set = Decoder::<TestBackend>::new(&device).parameters("d2");
        assert!(set.get("deconv5.bias").is_some());
        assert!(set.get("deconv3.bias").is_none());
        assert!(set.get("deconv4.bias").is_none());
    }
}
