// ============================================================
// Layer 3 — Parameter Sets
// ============================================================
// A ParameterSet is the learned state of ONE stage, detached
// from the tensor framework:
//
//   stage   : "e1"
//   tensors : "conv1.weight"     → shape [32, 3, 3, 3], values [...]
//             "b1.running_mean"  → shape [32],          values [...]
//             ...
//
// Names follow the state-dict keys of the reference model so a
// converted checkpoint maps one-to-one onto our stages. Linear
// weights are therefore stored [out_features, in_features].
//
// A BTreeMap keeps the tensor order stable, which makes files
// and `inspect` output reproducible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One named tensor: row-major values plus their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTensor {
    pub shape:  Vec<usize>,
    pub values: Vec<f32>,
}

impl StoredTensor {
    pub fn new(shape: Vec<usize>, values: Vec<f32>) -> Self {
        Self { shape, values }
    }

    /// Number of elements the shape describes
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when the value buffer matches the declared shape
    pub fn is_consistent(&self) -> bool {
        self.numel() == self.values.len()
    }
}

/// The complete set of learned tensors owned by a single stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSet {
    stage:   String,
    tensors: BTreeMap<String, StoredTensor>,
}

impl ParameterSet {
    pub fn new(stage: impl Into<String>) -> Self {
        Self { stage: stage.into(), tensors: BTreeMap::new() }
    }

    /// The stage this set belongs to (the weight file stem)
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Insert or replace a tensor, returning the previous one if any
    pub fn insert(&mut self, name: impl Into<String>, tensor: StoredTensor) -> Option<StoredTensor> {
        self.tensors.insert(name.into(), tensor)
    }

    pub fn get(&self, name: &str) -> Option<&StoredTensor> {
        self.tensors.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut StoredTensor> {
        self.tensors.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<StoredTensor> {
        self.tensors.remove(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredTensor)> {
        self.tensors.iter().map(|(name, tensor)| (name.as_str(), tensor))
    }

    /// Total number of scalar parameters across all tensors
    pub fn num_values(&self) -> usize {
        self.tensors.values().map(|t| t.values.len()).sum()
    }

    /// Name → shape, without the values
    pub fn shapes(&self) -> BTreeMap<String, Vec<usize>> {
        self.tensors
            .iter()
            .map(|(name, tensor)| (name.clone(), tensor.shape.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterSet {
        let mut set = ParameterSet::new("e1");
        set.insert("conv1.weight", StoredTensor::new(vec![2, 1, 1, 1], vec![0.5, -0.5]));
        set.insert("b1.running_var", StoredTensor::new(vec![2], vec![1.0, 1.0]));
        set
    }

    #[test]
    fn counts_tensors_and_values() {
        let set = sample();
        assert_eq!(set.stage(), "e1");
        assert_eq!(set.len(), 2);
        assert_eq!(set.num_values(), 4);
    }

    #[test]
    fn names_are_sorted() {
        let set = sample();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, ["b1.running_var", "conv1.weight"]);
    }

    #[test]
    fn detects_inconsistent_buffers() {
        let good = StoredTensor::new(vec![2, 3], vec![0.0; 6]);
        let bad  = StoredTensor::new(vec![2, 3], vec![0.0; 5]);
        assert!(good.is_consistent());
        assert!(!bad.is_consistent());
    }

    #[test]
    fn shapes_drop_values() {
        let shapes = sample().shapes();
        assert_eq!(shapes["conv1.weight"], vec![2, 1, 1, 1]);
    }
}
