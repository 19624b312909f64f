// ============================================================
// Layer 5 — Domain Classifier with Gradient Reversal (training only)
// ============================================================
// Guesses which domain a shared latent vector came from. Its
// input first passes through a GradientReversal node:
//
//   forward:  y = x                      (bit-for-bit)
//   backward: dL/dx = -coefficient · dL/dy
//
// so while the classifier learns to tell domains apart, the
// shared encoder upstream is pushed the other way, towards a
// latent space where the domains look alike.
//
//   [N, 1024]
//     reverse
//     fc1 1024→512 → ReLU
//     fc2 512→256  → ReLU → dropout
//     fc3 256→128  → ReLU
//     fc4 128→64   → ReLU → dropout
//     fc5 64→32    → ReLU
//     fc6 32→16    → ReLU → dropout
//     fc7 16→1     → sigmoid           [N, 1]

use burn::{
    nn::{Dropout, DropoutConfig, Linear},
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::domain::{
    error::{LoadError, ShapeError},
    lifecycle::Mode,
    parameters::ParameterSet,
};
use crate::ml::layers::{dropout, linear, NamedParameters, ParamReader};
use crate::ml::stage::{expect_trailing, Stage, LATENT_DIM};

// ─── GradientReversal ────────────────────────────────────────────────────────
/// Identity on the way forward, scaled negation on the way back.
///
/// Built from a detached copy: `x̂ + (x − x̂)·(−c)` where `x̂` carries no
/// gradient. The second term is exactly zero in value, and its only
/// gradient path is through `x` with factor `−c`.
#[derive(Module, Debug, Clone)]
pub struct GradientReversal {
    pub coefficient: f64,
}

impl GradientReversal {
    pub fn new(coefficient: f64) -> Self {
        Self { coefficient }
    }

    pub fn forward<B: Backend, const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        let carried = x.clone().detach();
        carried.clone() + (x - carried).mul_scalar(-self.coefficient)
    }
}

// ─── Classifier ──────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct DomainClassifierConfig {
    /// Dropout after fc2, fc4 and fc6
    #[config(default = 0.5)]
    pub dropout: f64,
    /// Gradient scale applied (negated) by the reversal node
    #[config(default = 0.5)]
    pub reversal: f64,
}

impl DomainClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DomainClassifier<B> {
        DomainClassifier {
            reverse: GradientReversal::new(self.reversal),
            fc1:     linear(LATENT_DIM, 512, true, device),
            fc2:     linear(512, 256, true, device),
            fc3:     linear(256, 128, true, device),
            fc4:     linear(128, 64, true, device),
            fc5:     linear(64, 32, true, device),
            fc6:     linear(32, 16, true, device),
            fc7:     linear(16, 1, true, device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct DomainClassifier<B: Backend> {
    reverse: GradientReversal,
    fc1:     Linear<B>,
    fc2:     Linear<B>,
    fc3:     Linear<B>,
    fc4:     Linear<B>,
    fc5:     Linear<B>,
    fc6:     Linear<B>,
    fc7:     Linear<B>,
    dropout: Dropout,
}

impl<B: Backend> Stage<B> for DomainClassifier<B> {
    const KIND: &'static str = "domain_classifier";

    type Input  = Tensor<B, 2>;
    type Output = Tensor<B, 2>;

    fn forward(&self, latent: Tensor<B, 2>, mode: Mode) -> Result<Tensor<B, 2>, ShapeError> {
        expect_trailing(Self::KIND, latent.dims(), &[LATENT_DIM])?;
        let p = self.dropout.prob;

        let x = self.reverse.forward(latent);
        let x = relu(self.fc1.forward(x));
        let x = dropout(relu(self.fc2.forward(x)), p, mode);
        let x = relu(self.fc3.forward(x));
        let x = dropout(relu(self.fc4.forward(x)), p, mode);
        let x = relu(self.fc5.forward(x));
        let x = dropout(relu(self.fc6.forward(x)), p, mode);
        Ok(sigmoid(self.fc7.forward(x)))
    }

    fn export_parameters(&self, set: &mut ParameterSet) {
        for (name, layer) in self.layers() {
            layer.export(name, set);
        }
    }

    fn import_parameters(self, reader: &mut ParamReader<'_>) -> Result<Self, LoadError> {
        Ok(Self {
            reverse: self.reverse,
            fc1:     self.fc1.import("fc1", reader)?,
            fc2:     self.fc2.import("fc2", reader)?,
            fc3:     self.fc3.import("fc3", reader)?,
            fc4:     self.fc4.import("fc4", reader)?,
            fc5:     self.fc5.import("fc5", reader)?,
            fc6:     self.fc6.import("fc6", reader)?,
            fc7:     self.fc7.import("fc7", reader)?,
            dropout: self.dropout,
        })
    }
}

impl<B: Backend> DomainClassifier<B> {
    fn layers(&self) -> [(&'static str, &Linear<B>); 7] {
        [
            ("fc1", &self.fc1),
            ("fc2", &self.fc2),
            ("fc3", &self.fc3),
            ("fc4", &self.fc4),
            ("fc5", &self.fc5),
            ("fc6", &self.fc6),
            ("fc7", &self.fc7),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{InferBackend, TrainBackend};
    use burn::tensor::Distribution;

    type TestBackend  = InferBackend;
    type TestAutodiff = TrainBackend;

    fn values<B: Backend, const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().iter::<f32>().collect()
    }

    #[test]
    fn reversal_is_exact_identity_forward() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::random([4, 16], Distribution::Normal(0.0, 3.0), &device);
        let y = GradientReversal::new(0.5).forward(x.clone());
        assert_eq!(values(y), values(x));
    }

    #[test]
    fn reversal_negates_and_halves_the_gradient() {
        let device = Default::default();
        let x = Tensor::<TestAutodiff, 2>::from_floats([[1.0, -2.0, 3.0], [0.5, 4.0, -1.5]], &device)
            .require_grad();
        let upstream = Tensor::<TestAutodiff, 2>::from_floats([[1.0, 2.0, -3.0], [4.0, 0.0, 10.0]], &device);

        let y = GradientReversal::new(0.5).forward(x.clone());
        let grads = (y * upstream).sum().backward();
        let grad  = x.grad(&grads).unwrap();

        assert_eq!(values(grad), vec![-0.5, -1.0, 1.5, -2.0, 0.0, -5.0]);
    }

    #[test]
    fn classifies_latents_as_probabilities() {
        let device = Default::default();
        let model  = DomainClassifierConfig::new().init::<TestBackend>(&device);
        let latent = Tensor::<TestBackend, 2>::random([5, LATENT_DIM], Distribution::Default, &device);

        let out = model.forward(latent, Mode::Evaluation).unwrap();
        assert_eq!(out.dims(), [5, 1]);
        assert!(values(out).iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn gradients_flow_back_to_the_latent() {
        let device = Default::default();
        let model  = DomainClassifierConfig::new().init::<TestAutodiff>(&device);
        let latent = Tensor::<TestAutodiff, 2>::random([2, LATENT_DIM], Distribution::Default, &device)
            .require_grad();

        let out   = model.forward(latent.clone(), Mode::Evaluation).unwrap();
        let grads = out.sum().backward();
        assert!(latent.grad(&grads).is_some());
    }

    #[test]
    fn exports_seven_biased_layers() {
        let device = Default::default();
        let set = DomainClassifierConfig::new().init::<TestBackend>(&device).parameters("c_dann");
        assert_eq!(set.len(), 14);
        assert_eq!(set.get("fc1.weight").unwrap().shape, vec![512, LATENT_DIM]);
        assert_eq!(set.get("fc7.bias").unwrap().shape, vec![1]);
    }

    #[test]
    fn reload_keeps_the_reversal_coefficient() {
        let device = Default::default();
        let model  = DomainClassifierConfig::new().with_reversal(0.25).init::<TestBackend>(&device);
        let set    = model.parameters("c_dann");
        let fresh  = DomainClassifierConfig::new().with_reversal(0.25).init::<TestBackend>(&device);
        let loaded = fresh.load_parameters(&set).unwrap();
        assert_eq!(loaded.reverse.coefficient, 0.25);
    }
}
