// ============================================================
// Layer 5 — Denoiser
// ============================================================
// Small image-to-image refiner applied after the decoder.
//
//   [N, 3, H, W]
//     encoder.0  conv 3→64  k3 p1 → ReLU → maxpool 2×2   [N, 64, H/2, W/2]
//     decoder.0  conv 64→64 k3 p1 → ReLU → nearest ×2    [N, 64, H, W]
//     decoder.3  conv 64→3  k3 p1                        [N, 3, H, W]
//
// No normalisation, so the mode has no effect here. H and W
// must be even for the pooling to be undone exactly.

use burn::{
    nn::{
        conv::Conv2d,
        interpolate::{Interpolate2d, Interpolate2dConfig, InterpolateMode},
        pool::{MaxPool2d, MaxPool2dConfig},
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::{
    error::{LoadError, ShapeError},
    lifecycle::Mode,
    parameters::ParameterSet,
};
use crate::ml::layers::{same_conv, NamedParameters, ParamReader};
use crate::ml::stage::{Stage, IMAGE_CHANNELS};

const HIDDEN_CHANNELS: usize = 64;

#[derive(Module, Debug)]
pub struct Denoiser<B: Backend> {
    encode:   Conv2d<B>,
    pool:     MaxPool2d,
    decode:   Conv2d<B>,
    upsample: Interpolate2d,
    project:  Conv2d<B>,
}

impl<B: Backend> Denoiser<B> {
    pub fn new(device: &B::Device) -> Self {
        Self {
            encode:   same_conv([IMAGE_CHANNELS, HIDDEN_CHANNELS], device),
            pool:     MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            decode:   same_conv([HIDDEN_CHANNELS, HIDDEN_CHANNELS], device),
            upsample: Interpolate2dConfig::new()
                .with_scale_factor(Some([2.0, 2.0]))
                .with_mode(InterpolateMode::Nearest)
                .init(),
            project:  same_conv([HIDDEN_CHANNELS, IMAGE_CHANNELS], device),
        }
    }
}

impl<B: Backend> Stage<B> for Denoiser<B> {
    const KIND: &'static str = "denoiser";

    type Input  = Tensor<B, 4>;
    type Output = Tensor<B, 4>;

    fn forward(&self, x: Tensor<B, 4>, _mode: Mode) -> Result<Tensor<B, 4>, ShapeError> {
        let dims @ [_, channels, height, width] = x.dims();
        if channels != IMAGE_CHANNELS || height % 2 != 0 || width % 2 != 0 {
            return Err(ShapeError {
                stage:    Self::KIND,
                expected: vec![IMAGE_CHANNELS, height + height % 2, width + width % 2],
                actual:   dims.to_vec(),
            });
        }

        let x = self.pool.forward(relu(self.encode.forward(x)));
        let x = self.upsample.forward(relu(self.decode.forward(x)));
        Ok(self.project.forward(x))
    }

    fn export_parameters(&self, set: &mut ParameterSet) {
        self.encode.export("encoder.0", set);
        self.decode.export("decoder.0", set);
        self.project.export("decoder.3", set);
    }

    fn import_parameters(self, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        Ok(Self {
            encode:   self.encode.import("encoder.0", reader)?,
            pool:     self.pool,
            decode:   self.decode.import("decoder.0", reader)?,
            upsample: self.upsample,
            project:  self.project.import("decoder.3", reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn preserves_image_shape() {
        let device   = Default::default();
        let denoiser = Denoiser::<TestBackend>::new(&device);
        let x = Tensor::<TestBackend, 4>::random([2, 3, 64, 64], Distribution::Uniform(-1.0, 1.0), &device);

        let out = denoiser.forward(x, Mode::Evaluation).unwrap();
        assert_eq!(out.dims(), [2, 3, 64, 64]);
    }

    #[test]
    fn works_at_other_even_resolutions() {
        let device   = Default::default();
        let denoiser = Denoiser::<TestBackend>::new(&device);
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 20, 12], &device);
        assert_eq!(denoiser.forward(x, Mode::Evaluation).unwrap().dims(), [1, 3, 20, 12]);
    }

    #[test]
    fn rejects_odd_resolution() {
        let device   = Default::default();
        let denoiser = Denoiser::<TestBackend>::new(&device);
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 63, 64], &device);

        let err = denoiser.forward(x, Mode::Evaluation).unwrap_err();
        assert_eq!(err.expected, vec![3, 64, 64]);
    }

    #[test]
    fn mode_has_no_effect() {
        let device   = Default::default();
        let denoiser = Denoiser::<TestBackend>::new(&device);
        let x = Tensor::<TestBackend, 4>::random([1, 3, 16, 16], Distribution::Default, &device);

        let a: Vec<f32> = denoiser.forward(x.clone(), Mode::Training).unwrap().into_data().iter().collect();
        let b: Vec<f32> = denoiser.forward(x, Mode::Evaluation).unwrap().into_data().iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn uses_sequential_parameter_names() {
        let device = Default::default();
        let set = Denoiser::<TestBackend>::new(&device).parameters("denoiser");
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, [
            "decoder.0.bias", "decoder.0.weight",
            "decoder.3.bias", "decoder.3.weight",
            "encoder.0.bias", "encoder.0.weight",
        ]);
    }
}
