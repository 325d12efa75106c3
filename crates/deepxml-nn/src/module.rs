// Module trait - the interface every transform layer implements
//
// The key method is forward(): it takes a dense `[batch, dim]` tensor and
// returns the transformed tensor. parameters() exposes the learned tensors so
// callers can count them, save them, or rebind them to another device.
//
// OPTIONAL CAPABILITIES:
//
// Some stages carry state a caller may want to reach into: an embedding
// table that can be warm-started from pretrained vectors, or that produces
// sparse gradients. Those hooks are default methods here. A layer that has
// no such state inherits the default (no-op / false / None), so callers ask
// every stage the same question and never have to special-case a type.

use deepxml_core::{Device, Result, Tensor};

/// The fundamental trait for all transform layers.
pub trait Module {
    /// Compute the output tensor from the input tensor.
    fn forward(&self, x: &Tensor) -> Result<Tensor>;

    /// All learned parameters of this module.
    fn parameters(&self) -> Vec<&Tensor>;

    /// Mutable access to the learned parameters.
    fn parameters_mut(&mut self) -> Vec<&mut Tensor>;

    /// Set training or evaluation mode.
    ///
    /// Override in modules that behave differently in train vs eval
    /// (Dropout, BatchNorm1d). Uses interior mutability so `&self` suffices.
    fn set_training(&self, _training: bool) {}

    /// Whether the module is in training mode (default: true).
    fn is_training(&self) -> bool {
        true
    }

    fn train(&self) {
        self.set_training(true);
    }

    fn eval(&self) {
        self.set_training(false);
    }

    /// Total number of scalar parameters in this module.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.elem_count()).sum()
    }

    /// Parameters with human-readable names.
    ///
    /// The default uses positional indices (`param_0`, `param_1`, ...).
    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        self.parameters()
            .into_iter()
            .enumerate()
            .map(|(i, p)| (format!("param_{i}"), p))
            .collect()
    }

    /// Rebind every parameter to `device`.
    fn to_device(&mut self, device: Device) {
        for p in self.parameters_mut() {
            p.set_device(device);
        }
    }

    /// Warm-start learned state from an existing tensor (e.g. word embeddings).
    fn initialize(&mut self, _init: &Tensor) -> Result<()> {
        Ok(())
    }

    /// Whether the module's representation is sparse.
    fn is_sparse(&self) -> bool {
        false
    }

    /// The token embedding table, for modules that own one.
    fn token_embeddings(&self) -> Option<&Tensor> {
        None
    }
}
