// Linear - fully-connected layer: y = xW^T + b
//
// PARAMETER SHAPES:
//
//   weight: [out_features, in_features]
//   bias:   [1, out_features]            broadcast across the batch
//
// Kaiming uniform initialization, U(-k, k) with k = sqrt(1/in_features),
// for both weight and bias.

use deepxml_core::{Error, Result, Tensor};

use crate::init;
use crate::module::Module;

/// A fully-connected (dense) layer.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Tensor,
    bias: Option<Tensor>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    pub fn new(in_features: usize, out_features: usize, use_bias: bool) -> Self {
        let weight = init::kaiming_uniform((out_features, in_features));
        let bias = use_bias.then(|| {
            let k = (1.0 / in_features.max(1) as f32).sqrt();
            init::uniform((1, out_features), -k, k)
        });
        Linear {
            weight,
            bias,
            in_features,
            out_features,
        }
    }

    /// Create a Linear layer from existing weight and bias tensors.
    pub fn from_tensors(weight: Tensor, bias: Option<Tensor>) -> Result<Self> {
        let (out_features, in_features) = weight.dims();
        if let Some(b) = &bias {
            if b.dims() != (1, out_features) {
                return Err(Error::ShapeMismatch {
                    expected: (1, out_features),
                    got: b.dims(),
                });
            }
        }
        Ok(Linear {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.bias.as_ref()
    }

    /// Replace the weight, keeping its device binding.
    pub(crate) fn set_weight(&mut self, weight: Tensor) {
        let device = self.weight.device();
        self.weight = weight.to_device(device);
    }

    /// Zero the bias, if there is one.
    pub(crate) fn zero_bias(&mut self) {
        if let Some(b) = &mut self.bias {
            b.as_array_mut().fill(0.0);
        }
    }
}

impl Module for Linear {
    /// Input `[batch, in_features]`, output `[batch, out_features]`.
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let output = x.matmul_t(&self.weight)?;
        match &self.bias {
            Some(bias) => output.add(bias),
            None => Ok(output),
        }
    }

    fn parameters(&self) -> Vec<&Tensor> {
        let mut params = vec![&self.weight];
        params.extend(self.bias.as_ref());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = vec![&mut self.weight];
        params.extend(self.bias.as_mut());
        params
    }

    fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut named = vec![("weight".to_string(), &self.weight)];
        if let Some(b) = &self.bias {
            named.push(("bias".to_string(), b));
        }
        named
    }
}
