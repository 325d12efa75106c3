// Sequential - a chain of stages applied one after another
//
// The output of each stage becomes the input to the next. Stages exchange
// `Repr` values, so a sparse-consuming stage (astec) can feed dense ones.

use deepxml_core::{Device, Repr, Result, Tensor};

use crate::layer::Layer;

#[derive(Debug, Default)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    pub fn new(layers: Vec<Layer>) -> Self {
        Sequential { layers }
    }

    /// Add a layer to the end of the sequence. Returns self for chaining.
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn first(&self) -> Option<&Layer> {
        self.layers.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut Layer> {
        self.layers.first_mut()
    }

    pub fn forward(&self, x: Repr) -> Result<Repr> {
        self.layers.iter().try_fold(x, |out, layer| layer.forward(out))
    }

    pub fn parameters(&self) -> Vec<&Tensor> {
        self.layers
            .iter()
            .flat_map(|l| l.module().parameters())
            .collect()
    }

    pub fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut named = Vec::new();
        for (i, layer) in self.layers.iter().enumerate() {
            for (k, v) in layer.module().named_parameters() {
                named.push((format!("{i}.{k}"), v));
            }
        }
        named
    }

    /// Propagate training mode to all child layers.
    pub fn set_training(&self, training: bool) {
        for layer in &self.layers {
            layer.set_training(training);
        }
    }

    pub fn to_device(&mut self, device: Device) {
        for layer in &mut self.layers {
            layer.to_device(device);
        }
    }
}
