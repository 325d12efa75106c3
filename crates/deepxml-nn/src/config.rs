// TransformConfig - declarative description of a transform stack
//
//   {
//     "order": ["relu", "dropout"],
//     "relu": {},
//     "dropout": {"p": 0.1}
//   }
//
// `order` lists config tokens in application order; every other key maps a
// token to its constructor parameters. The same token may appear in `order`
// more than once, each occurrence building a fresh stage from the shared
// parameters.

use std::fs;
use std::path::Path;

use deepxml_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::layer::Layer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    pub order: Vec<String>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl TransformConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// A config with `order` left empty; add stages with [`TransformConfig::stage`].
    pub fn new() -> Self {
        TransformConfig {
            order: Vec::new(),
            params: Map::new(),
        }
    }

    /// Append `token` to the order and set its parameters.
    pub fn stage(mut self, token: &str, params: Value) -> Self {
        self.order.push(token.to_string());
        self.params.insert(token.to_string(), params);
        self
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Instantiate every stage named in `config.order`, in order.
pub fn build_layers(config: &TransformConfig) -> Result<Vec<Layer>> {
    config
        .order
        .iter()
        .map(|token| {
            if !Layer::TOKENS.contains(&token.as_str()) {
                return Err(Error::UnknownLayer(token.clone()));
            }
            let params = config.params.get(token).ok_or_else(|| {
                Error::InvalidConfig(format!("no parameters given for layer {token:?}"))
            })?;
            Layer::from_config(token, params)
        })
        .collect()
}
