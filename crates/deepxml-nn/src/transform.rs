// Transform - the document-encoder stack
//
// A Transform owns the stages built from a TransformConfig and the device
// the stack is bound to. A single stage is held directly; two or more go
// through Sequential. Both paths produce the same output.
//
// initialize(), token_embeddings() and sparse() all ask the first stage:
// that is where a warm-startable embedding table sits when there is one.

use deepxml_core::{Device, Error, Repr, Result, Tensor};
use tracing::debug;

use crate::config::{build_layers, TransformConfig};
use crate::layer::Layer;
use crate::sequential::Sequential;

#[derive(Debug)]
enum Stack {
    Single(Box<Layer>),
    Sequential(Sequential),
}

#[derive(Debug)]
pub struct Transform {
    stack: Stack,
    device: Device,
}

impl Transform {
    pub fn new(mut layers: Vec<Layer>, device: Device) -> Result<Self> {
        let stack = match layers.len() {
            0 => return Err(Error::InvalidConfig("transform needs at least one layer".into())),
            1 => Stack::Single(Box::new(layers.remove(0))),
            _ => Stack::Sequential(Sequential::new(layers)),
        };
        let transform = Transform { stack, device };
        debug!(stages = ?transform.stage_names(), %device, "built transform");
        Ok(transform)
    }

    pub fn from_config(config: &TransformConfig, device: Device) -> Result<Self> {
        Self::new(build_layers(config)?, device)
    }

    /// Apply every stage in order.
    pub fn forward(&self, x: Repr) -> Result<Repr> {
        match &self.stack {
            Stack::Single(layer) => layer.forward(x),
            Stack::Sequential(seq) => seq.forward(x),
        }
    }

    /// Warm-start the first stage from `x`; a no-op for stages without
    /// learned initial state.
    pub fn initialize(&mut self, x: &Tensor) -> Result<()> {
        match self.first_mut() {
            Some(layer) => layer.initialize(x),
            None => Ok(()),
        }
    }

    /// Whether the first stage produces a sparse representation.
    pub fn sparse(&self) -> bool {
        self.first().is_some_and(Layer::is_sparse)
    }

    pub fn token_embeddings(&self) -> Option<&Tensor> {
        self.first()?.token_embeddings()
    }

    /// Rebind every parameter to the transform's device.
    pub fn to(&mut self) {
        let device = self.device;
        match &mut self.stack {
            Stack::Single(layer) => layer.to_device(device),
            Stack::Sequential(seq) => seq.to_device(device),
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn set_training(&self, training: bool) {
        match &self.stack {
            Stack::Single(layer) => layer.set_training(training),
            Stack::Sequential(seq) => seq.set_training(training),
        }
    }

    pub fn train(&self) {
        self.set_training(true);
    }

    pub fn eval(&self) {
        self.set_training(false);
    }

    pub fn len(&self) -> usize {
        match &self.stack {
            Stack::Single(_) => 1,
            Stack::Sequential(seq) => seq.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the single-stage path (no Sequential wrapper) is in use.
    pub fn is_single(&self) -> bool {
        matches!(self.stack, Stack::Single(_))
    }

    pub fn layers(&self) -> &[Layer] {
        match &self.stack {
            Stack::Single(layer) => std::slice::from_ref(layer.as_ref()),
            Stack::Sequential(seq) => seq.layers(),
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.layers().iter().map(Layer::name).collect()
    }

    pub fn parameters(&self) -> Vec<&Tensor> {
        self.layers()
            .iter()
            .flat_map(|l| l.module().parameters())
            .collect()
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.elem_count()).sum()
    }

    fn first(&self) -> Option<&Layer> {
        self.layers().first()
    }

    fn first_mut(&mut self) -> Option<&mut Layer> {
        match &mut self.stack {
            Stack::Single(layer) => Some(layer.as_mut()),
            Stack::Sequential(seq) => seq.first_mut(),
        }
    }
}
