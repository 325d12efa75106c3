// Residual - a dense block with a zero-padded skip connection
//
//   hidden = Dropout(ReLU(BatchNorm1d(Linear(x))))
//   y      = hidden + pad(x)
//
// `pad` appends `output_size - input_size` zero columns so the skip path
// matches the block's width; the block can widen but never narrow.
//
// The linear weight starts as the identity (`eye`) by default, so a freshly
// built block passes its input through almost unchanged; `random` uses
// Xavier-uniform instead. The bias starts at zero either way.

use deepxml_core::{Device, Error, Result, Tensor};
use serde::Deserialize;
use tracing::debug;

use crate::activation::ReLU;
use crate::batchnorm::BatchNorm1d;
use crate::dropout::Dropout;
use crate::init;
use crate::linear::Linear;
use crate::module::Module;

/// How to initialize the block's linear weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidualInit {
    #[default]
    Eye,
    Random,
}

pub struct Residual {
    linear: Linear,
    norm: BatchNorm1d,
    relu: ReLU,
    dropout: Dropout,
    padding_size: usize,
}

// Xavier gain for a layer followed by ReLU.
const RELU_GAIN: f32 = std::f32::consts::SQRT_2;

impl Residual {
    pub fn new(input_size: usize, output_size: usize, dropout: f64, init: ResidualInit) -> Result<Self> {
        if output_size < input_size {
            return Err(Error::InvalidConfig(format!(
                "residual output_size ({output_size}) must be >= input_size ({input_size})"
            )));
        }
        let mut block = Residual {
            linear: Linear::new(input_size, output_size, true),
            norm: BatchNorm1d::new(output_size, 1e-5, 0.1),
            relu: ReLU,
            dropout: Dropout::new(dropout)?,
            padding_size: output_size - input_size,
        };
        block.reset(init);
        Ok(block)
    }

    fn reset(&mut self, init: ResidualInit) {
        let shape = (self.linear.out_features(), self.linear.in_features());
        let weight = match init {
            ResidualInit::Eye => init::eye(shape),
            ResidualInit::Random => init::xavier_uniform(shape, RELU_GAIN),
        };
        debug!(?init, ?shape, "initializing residual block");
        self.linear.set_weight(weight);
        self.linear.zero_bias();
    }

    pub fn input_size(&self) -> usize {
        self.linear.in_features()
    }

    pub fn output_size(&self) -> usize {
        self.linear.out_features()
    }

    pub fn linear(&self) -> &Linear {
        &self.linear
    }
}

impl Module for Residual {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let hidden = self.linear.forward(x)?;
        let hidden = self.norm.forward(&hidden)?;
        let hidden = self.relu.forward(&hidden)?;
        let hidden = self.dropout.forward(&hidden)?;
        hidden.add(&x.pad_cols(self.padding_size))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        let mut params = self.linear.parameters();
        params.extend(self.norm.parameters());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = self.linear.parameters_mut();
        params.extend(self.norm.parameters_mut());
        params
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut named = Vec::new();
        for (k, v) in self.linear.named_parameters() {
            named.push((format!("hidden_layer.0.{k}"), v));
        }
        for (k, v) in self.norm.named_parameters() {
            named.push((format!("hidden_layer.1.{k}"), v));
        }
        named
    }

    fn set_training(&self, training: bool) {
        self.norm.set_training(training);
        self.dropout.set_training(training);
    }

    fn is_training(&self) -> bool {
        self.norm.is_training()
    }

    fn to_device(&mut self, device: Device) {
        self.linear.to_device(device);
        self.norm.to_device(device);
    }
}
