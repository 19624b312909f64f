// ============================================================
// Layer 5 — Discriminator (training only)
// ============================================================
// Scores how photo-like an image is. Not on the generate path,
// but the decoder and shared encoder are trained against it,
// so it ships with the rest of the family (weight file `disc`).
//
//   [N, 3, 64, 64]
//     conv1 3→16  k3 s2 p1 → leaky             [N, 16, 32, 32]
//     conv2 16→32 k3 s2 p1 → leaky → b2        [N, 32, 16, 16]
//     conv3 32→32 k3 s2 p1 → leaky → b3        [N, 32, 8, 8]
//     conv4 32→32 k3 s2 p1 → leaky             [N, 32, 4, 4]
//     flatten → fc1 512→1 → sigmoid            [N, 1]

use burn::{
    nn::{conv::Conv2d, Linear},
    prelude::*,
    tensor::activation::{leaky_relu, sigmoid},
};

use crate::domain::{
    error::{LoadError, ShapeError},
    lifecycle::Mode,
    parameters::ParameterSet,
};
use crate::ml::layers::{linear, strided_conv, BatchNorm, NamedParameters, ParamReader};
use crate::ml::stage::{expect_trailing, Stage, IMAGE_CHANNELS, IMAGE_SIZE};

const LEAKY_SLOPE: f64 = 0.2;

#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    b2:    BatchNorm<B>,
    conv3: Conv2d<B>,
    b3:    BatchNorm<B>,
    conv4: Conv2d<B>,
    fc1:   Linear<B>,
}

impl<B: Backend> Discriminator<B> {
    pub fn new(device: &B::Device) -> Self {
        let flat = 32 * (IMAGE_SIZE / 16) * (IMAGE_SIZE / 16);
        Self {
            conv1: strided_conv([IMAGE_CHANNELS, 16], true, device),
            conv2: strided_conv([16, 32], false, device),
            b2:    BatchNorm::new(32, device),
            conv3: strided_conv([32, 32], false, device),
            b3:    BatchNorm::new(32, device),
            conv4: strided_conv([32, 32], true, device),
            fc1:   linear(flat, 1, true, device),
        }
    }
}

impl<B: Backend> Stage<B> for Discriminator<B> {
    const KIND: &'static str = "discriminator";

    type Input  = Tensor<B, 4>;
    type Output = Tensor<B, 2>;

    fn forward(&self, x: Tensor<B, 4>, mode: Mode) -> Result<Tensor<B, 2>, ShapeError> {
        expect_trailing(Self::KIND, x.dims(), &[IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE])?;

        let x = leaky_relu(self.conv1.forward(x), LEAKY_SLOPE);
        let x = self.b2.forward(leaky_relu(self.conv2.forward(x), LEAKY_SLOPE), mode);
        let x = self.b3.forward(leaky_relu(self.conv3.forward(x), LEAKY_SLOPE), mode);
        let x = leaky_relu(self.conv4.forward(x), LEAKY_SLOPE);

        let x: Tensor<B, 2> = x.flatten(1, 3);
        Ok(sigmoid(self.fc1.forward(x)))
    }

    fn export_parameters(&self, set: &mut ParameterSet) {
        self.conv1.export("conv1", set);
        self.conv2.export("conv2", set);
        self.b2.export("b2", set);
        self.conv3.export("conv3", set);
        self.b3.export("b3", set);
        self.conv4.export("conv4", set);
        self.fc1.export("fc1", set);
    }

    fn import_parameters(self, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        Ok(Self {
            conv1: self.conv1.import("conv1", reader)?,
            conv2: self.conv2.import("conv2", reader)?,
            b2:    self.b2.import("b2", reader)?,
            conv3: self.conv3.import("conv3", reader)?,
            b3:    self.b3.import("b3", reader)?,
            conv4: self.conv4.import("conv4", reader)?,
            fc1:   self.fc1.import("fc1", reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn scores_each_image_as_a_probability() {
        let device = Default::default();
        let disc   = Discriminator::<TestBackend>::new(&device);
        let x = Tensor::<TestBackend, 4>::random([3, 3, 64, 64], Distribution::Uniform(-1.0, 1.0), &device);

        let out = disc.forward(x, Mode::Training).unwrap();
        assert_eq!(out.dims(), [3, 1]);

        let scores: Vec<f32> = out.into_data().iter().collect();
        assert!(scores.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn head_reads_the_flattened_map() {
        let device = Default::default();
        let set = Discriminator::<TestBackend>::new(&device).parameters("disc");
        assert_eq!(set.get("fc1.weight").unwrap().shape, vec![1, 512]);
        assert!(set.get("conv1.bias").is_some());
        assert!(set.get("conv2.bias").is_none());
    }
}
