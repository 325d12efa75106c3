// Identity stages
//
// `Identity` passes its input through untouched. `StripIdentity` expects a
// `Repr::Pair` and keeps only its first half; it is the stage to put first
// when upstream hands over `(representation, auxiliary)` but the rest of the
// stack only wants the representation.

use deepxml_core::{Error, Repr, Result, Tensor};

use crate::module::Module;

#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Module for Identity {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        Ok(x.clone())
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![]
    }
}

/// Drops the auxiliary half of a paired input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripIdentity;

impl StripIdentity {
    pub fn strip(&self, x: Repr) -> Result<Repr> {
        match x {
            Repr::Pair(first, _) => Ok(*first),
            other => Err(Self::not_a_pair(other.kind())),
        }
    }

    fn not_a_pair(kind: &str) -> Error {
        Error::msg(format!("_identity expects a paired input, got {kind}"))
    }
}

impl Module for StripIdentity {
    /// A lone tensor carries no pair to strip.
    fn forward(&self, _x: &Tensor) -> Result<Tensor> {
        Err(Self::not_a_pair("dense"))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        vec![]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![]
    }
}
