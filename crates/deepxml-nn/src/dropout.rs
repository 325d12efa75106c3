// Dropout - regularization via random zeroing
//
// During training each element is zeroed with probability p and the
// survivors are scaled by 1/(1-p) to preserve the expected value. In eval
// mode Dropout is the identity.

use std::cell::Cell;

use deepxml_core::{Error, Result, Tensor};
use rand::Rng;

use crate::module::Module;

/// Applies dropout regularization.
#[derive(Debug, Clone)]
pub struct Dropout {
    /// Probability of an element being zeroed.
    p: f64,
    training: Cell<bool>,
}

impl Dropout {
    /// `p` must lie in `[0, 1)`.
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(Error::InvalidConfig(format!(
                "dropout probability must be in [0, 1), got {p}"
            )));
        }
        Ok(Dropout {
            p,
            training: Cell::new(true),
        })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Module for Dropout {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        if !self.training.get() || self.p == 0.0 {
            return Ok(x.clone());
        }
        let scale = (1.0 / (1.0 - self.p)) as f32;
        let mut rng = rand::thread_rng();
        let p = self.p;
        let data = x
            .as_array()
            .mapv(|v| if rng.gen::<f64>() < p { 0.0 } else { v * scale });
        Ok(x.with_data(data))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![]
    }

    fn set_training(&self, training: bool) {
        self.training.set(training);
    }

    fn is_training(&self) -> bool {
        self.training.get()
    }
}
