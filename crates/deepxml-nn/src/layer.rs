// Layer - the closed set of stages a transform can be built from
//
// Each config token maps to one variant and one parameter struct:
//
//   dropout      DropoutParams      { p }
//   batchnorm1d  BatchNormParams    { num_features, eps, momentum }
//   linear       LinearParams       { in_features, out_features, bias }
//   relu         -
//   residual     ResidualParams     { input_size, output_size, dropout, init }
//   identity     -
//   _identity    -
//   astec        AstecParams        { vocabulary_dims, embedding_dims, dropout,
//                                     reduction, sparse, padding_idx }
//
// Parameter structs reject unknown fields, so a misspelled key fails the
// build instead of being silently ignored.

use deepxml_core::{Device, Error, Repr, Result, Tensor};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::activation::ReLU;
use crate::astec::Astec;
use crate::batchnorm::BatchNorm1d;
use crate::dropout::Dropout;
use crate::embedding::Reduction;
use crate::identity::{Identity, StripIdentity};
use crate::linear::Linear;
use crate::module::Module;
use crate::residual::{Residual, ResidualInit};

fn default_dropout() -> f64 {
    0.5
}

fn default_eps() -> f32 {
    1e-5
}

fn default_momentum() -> f32 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_embedding_dims() -> usize {
    300
}

fn default_padding_idx() -> Option<usize> {
    Some(0)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropoutParams {
    #[serde(default = "default_dropout")]
    pub p: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchNormParams {
    pub num_features: usize,
    #[serde(default = "default_eps")]
    pub eps: f32,
    #[serde(default = "default_momentum")]
    pub momentum: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearParams {
    pub in_features: usize,
    pub out_features: usize,
    #[serde(default = "default_true")]
    pub bias: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResidualParams {
    pub input_size: usize,
    pub output_size: usize,
    #[serde(default = "default_dropout")]
    pub dropout: f64,
    #[serde(default)]
    pub init: ResidualInit,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AstecParams {
    pub vocabulary_dims: usize,
    #[serde(default = "default_embedding_dims")]
    pub embedding_dims: usize,
    #[serde(default = "default_dropout")]
    pub dropout: f64,
    #[serde(default)]
    pub reduction: Reduction,
    #[serde(default = "default_true")]
    pub sparse: bool,
    #[serde(default = "default_padding_idx")]
    pub padding_idx: Option<usize>,
}

/// Stages that take no parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

/// One stage of a transform.
pub enum Layer {
    Dropout(Dropout),
    BatchNorm1d(BatchNorm1d),
    Linear(Linear),
    ReLU(ReLU),
    Residual(Residual),
    Identity(Identity),
    StripIdentity(StripIdentity),
    Astec(Astec),
}

fn parse<P: DeserializeOwned>(token: &str, params: &Value) -> Result<P> {
    P::deserialize(params).map_err(|e| Error::InvalidConfig(format!("{token}: {e}")))
}

impl Layer {
    /// Every token [`Layer::from_config`] accepts.
    pub const TOKENS: [&'static str; 8] = [
        "dropout",
        "batchnorm1d",
        "linear",
        "relu",
        "residual",
        "identity",
        "_identity",
        "astec",
    ];

    /// Construct the stage named by `token` from its JSON parameters.
    pub fn from_config(token: &str, params: &Value) -> Result<Layer> {
        let layer = match token {
            "dropout" => {
                let p: DropoutParams = parse(token, params)?;
                Layer::Dropout(Dropout::new(p.p)?)
            }
            "batchnorm1d" => {
                let p: BatchNormParams = parse(token, params)?;
                Layer::BatchNorm1d(BatchNorm1d::new(p.num_features, p.eps, p.momentum))
            }
            "linear" => {
                let p: LinearParams = parse(token, params)?;
                Layer::Linear(Linear::new(p.in_features, p.out_features, p.bias))
            }
            "relu" => {
                parse::<NoParams>(token, params)?;
                Layer::ReLU(ReLU)
            }
            "residual" => {
                let p: ResidualParams = parse(token, params)?;
                Layer::Residual(Residual::new(p.input_size, p.output_size, p.dropout, p.init)?)
            }
            "identity" => {
                parse::<NoParams>(token, params)?;
                Layer::Identity(Identity)
            }
            "_identity" => {
                parse::<NoParams>(token, params)?;
                Layer::StripIdentity(StripIdentity)
            }
            "astec" => {
                let p: AstecParams = parse(token, params)?;
                Layer::Astec(Astec::new(
                    p.vocabulary_dims,
                    p.embedding_dims,
                    p.dropout,
                    p.reduction,
                    p.sparse,
                    p.padding_idx,
                )?)
            }
            other => return Err(Error::UnknownLayer(other.to_string())),
        };
        Ok(layer)
    }

    /// The config token this stage was built from.
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Dropout(_) => "dropout",
            Layer::BatchNorm1d(_) => "batchnorm1d",
            Layer::Linear(_) => "linear",
            Layer::ReLU(_) => "relu",
            Layer::Residual(_) => "residual",
            Layer::Identity(_) => "identity",
            Layer::StripIdentity(_) => "_identity",
            Layer::Astec(_) => "astec",
        }
    }

    pub fn module(&self) -> &dyn Module {
        match self {
            Layer::Dropout(m) => m,
            Layer::BatchNorm1d(m) => m,
            Layer::Linear(m) => m,
            Layer::ReLU(m) => m,
            Layer::Residual(m) => m,
            Layer::Identity(m) => m,
            Layer::StripIdentity(m) => m,
            Layer::Astec(m) => m,
        }
    }

    pub fn module_mut(&mut self) -> &mut dyn Module {
        match self {
            Layer::Dropout(m) => m,
            Layer::BatchNorm1d(m) => m,
            Layer::Linear(m) => m,
            Layer::ReLU(m) => m,
            Layer::Residual(m) => m,
            Layer::Identity(m) => m,
            Layer::StripIdentity(m) => m,
            Layer::Astec(m) => m,
        }
    }

    pub fn forward(&self, x: Repr) -> Result<Repr> {
        match self {
            Layer::Identity(_) => Ok(x),
            Layer::StripIdentity(s) => s.strip(x),
            Layer::Astec(a) => a.forward_repr(x).map(Repr::Dense),
            dense => {
                let t = x.into_dense(dense.name())?;
                dense.module().forward(&t).map(Repr::Dense)
            }
        }
    }

    pub fn initialize(&mut self, init: &Tensor) -> Result<()> {
        self.module_mut().initialize(init)
    }

    pub fn is_sparse(&self) -> bool {
        self.module().is_sparse()
    }

    pub fn token_embeddings(&self) -> Option<&Tensor> {
        self.module().token_embeddings()
    }

    pub fn set_training(&self, training: bool) {
        self.module().set_training(training);
    }

    pub fn to_device(&mut self, device: Device) {
        self.module_mut().to_device(device);
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Layer({})", self.name())
    }
}
