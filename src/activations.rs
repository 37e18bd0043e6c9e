use std::collections::HashMap;
use std::collections::hash_map;

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Activations captured by one [forward](crate::FeatureExtractor::forward) call, keyed by
/// layer name.
///
/// Owned by the caller; nothing links it back to the extractor.
#[derive(Debug, Clone)]
pub struct ActivationMap<B: Backend> {
    activations: HashMap<String, Tensor<B, 4>>,
    layers_evaluated: usize,
}

impl<B: Backend> ActivationMap<B> {
    pub(crate) fn new(activations: HashMap<String, Tensor<B, 4>>, layers_evaluated: usize) -> Self {
        Self {
            activations,
            layers_evaluated,
        }
    }

    /// The activation captured at `name`.
    pub fn get(&self, name: &str) -> Option<&Tensor<B, 4>> {
        self.activations.get(name)
    }

    /// Takes the activation captured at `name` out of the map.
    pub fn remove(&mut self, name: &str) -> Option<Tensor<B, 4>> {
        self.activations.remove(name)
    }

    /// Whether an activation was captured at `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.activations.contains_key(name)
    }

    /// Number of captured activations.
    pub fn len(&self) -> usize {
        self.activations.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    /// Names of the captured layers, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.activations.keys().map(String::as_str)
    }

    /// How many layers the traversal evaluated before stopping.
    pub fn layers_evaluated(&self) -> usize {
        self.layers_evaluated
    }

    /// The underlying map.
    pub fn into_inner(self) -> HashMap<String, Tensor<B, 4>> {
        self.activations
    }
}

impl<B: Backend> IntoIterator for ActivationMap<B> {
    type Item = (String, Tensor<B, 4>);
    type IntoIter = hash_map::IntoIter<String, Tensor<B, 4>>;

    fn into_iter(self) -> Self::IntoIter {
        self.activations.into_iter()
    }
}
