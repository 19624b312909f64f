// ============================================================
// Layer 5 — SharedDecoder
// ============================================================
// Inverse-shaped counterpart of the SharedEncoder. The latent
// vector is treated as a 1024-channel 1×1 seed and grown back
// into a feature map:
//
//   [N, 1024] → reshape                    [N, 1024, 1, 1]
//     deconv1 1024→512 k4 s2 → ReLU → bd1  [N, 512, 4, 4]
//     deconv2 512→256  k2 s2 → ReLU → bd2  [N, 256, 8, 8]

use burn::{
    nn::conv::ConvTranspose2d,
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::{
    error::{LoadError, ShapeError},
    lifecycle::Mode,
    parameters::ParameterSet,
};
use crate::ml::layers::{upsample_deconv, BatchNorm, NamedParameters, ParamReader};
use crate::ml::stage::{expect_trailing, Stage, LATENT_DIM};

/// Channels of the map handed to the domain decoder
pub const SEED_CHANNELS: usize = 256;

/// Spatial size of that map
pub const SEED_SIZE: usize = 8;

#[derive(Module, Debug)]
pub struct SharedDecoder<B: Backend> {
    deconv1: ConvTranspose2d<B>,
    bd1:     BatchNorm<B>,
    deconv2: ConvTranspose2d<B>,
    bd2:     BatchNorm<B>,
}

impl<B: Backend> SharedDecoder<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            deconv1: upsample_deconv([LATENT_DIM, 512], 4, false, device),
            bd1:     BatchNorm::new(512, device),
            deconv2: upsample_deconv([512, SEED_CHANNELS], 2, false, device),
            bd2:     BatchNorm::new(SEED_CHANNELS, device),
        }
    }
}

impl<B: Backend> Stage<B> for SharedDecoder<B> {
    const KIND: &'static str = "shared_decoder";

    type Input  = Tensor<B, 2>;
    type Output = Tensor<B, 4>;

    fn forward(&self, latent: Tensor<B, 2>, mode: Mode) -> Result<Tensor<B, 4>, ShapeError> {
        expect_trailing(Self::KIND, latent.dims(), &[LATENT_DIM])?;

        let [batch, _] = latent.dims();
        let x = latent.reshape([batch, LATENT_DIM, 1, 1]);
        let x = self.bd1.forward(relu(self.deconv1.forward(x)), mode);
        let x = self.bd2.forward(relu(self.deconv2.forward(x)), mode);
        Ok(x)
    }

    fn export_parameters(&self, set: &mut ParameterSet) {
        self.deconv1.export("deconv1", set);
        self.bd1.export("bd1", set);
        self.deconv2.export("deconv2", set);
        self.bd2.export("bd2", set);
    }

    fn import_parameters(self, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        Ok(Self {
            deconv1: self.deconv1.import("deconv1", reader)?,
            bd1:     self.bd1.import("bd1", reader)?,
            deconv2: self.deconv2.import("deconv2", reader)?,
            bd2:     self.bd2.import("bd2", reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn grows_latent_into_feature_map() {
        let device = Default::default();
        let stage  = SharedDecoder::<TestBackend>::new(&device);
        let latent = Tensor::<TestBackend, 2>::random([2, LATENT_DIM], Distribution::Default, &device);

        let out = stage.forward(latent, Mode::Evaluation).unwrap();
        assert_eq!(out.dims(), [2, SEED_CHANNELS, SEED_SIZE, SEED_SIZE]);
    }

    #[test]
    fn rejects_short_latent() {
        let device = Default::default();
        let stage  = SharedDecoder::<TestBackend>::new(&device);
        let latent = Tensor::<TestBackend, 2>::zeros([1, 512], &device);

        let err = stage.forward(latent, Mode::Evaluation).unwrap_err();
        assert_eq!(err.expected, vec![LATENT_DIM]);
        assert_eq!(err.actual, vec![1, 512]);
    }

    #[test]
    fn transposed_kernels_keep_in_out_layout() {
        let device = Default::default();
        let set = SharedDecoder::<TestBackend>::new(&device).parameters("d_shared");
        assert_eq!(set.get("deconv1.weight").unwrap().shape, vec![LATENT_DIM, 512, 4, 4]);
        assert_eq!(set.get("deconv2.weight").unwrap().shape, vec![512, SEED_CHANNELS, 2, 2]);
    }
}
