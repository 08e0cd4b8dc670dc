use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::activation::activation::ActivationFunction;
use crate::layers::dense::Layer;
use crate::network::metadata::ModelMetadata;

/// Why a model artifact could not be used.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("could not read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("model file is not a valid network: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model shape is incompatible: {0}")]
    Shape(String),

    #[error("model download failed: {0}")]
    Download(String),
}

/// A trained feed-forward network as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    pub fn new(layers: Vec<Layer>) -> Network {
        Network { layers, metadata: None }
    }

    /// Forward pass. Returns `None` if `input` does not match the first layer.
    pub fn forward(&self, input: &[f64]) -> Option<Vec<f64>> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        Some(current)
    }

    /// Verifies the network is internally consistent and maps `inputs`
    /// values onto exactly `outputs` probabilities.
    pub fn validate(&self, inputs: usize, outputs: usize) -> Result<(), ArtifactError> {
        if self.layers.is_empty() {
            return Err(ArtifactError::Shape("network has no layers".into()));
        }
        let mut width = inputs;
        for (i, layer) in self.layers.iter().enumerate() {
            layer
                .check_shape()
                .map_err(|e| ArtifactError::Shape(format!("layer {}: {}", i, e)))?;
            if layer.input_size() != width {
                return Err(ArtifactError::Shape(format!(
                    "layer {} expects {} inputs, previous width is {}",
                    i,
                    layer.input_size(),
                    width
                )));
            }
            width = layer.size;
        }
        if width != outputs {
            return Err(ArtifactError::Shape(format!(
                "network has {} outputs, expected {}",
                width, outputs
            )));
        }
        if self.layers.last().map(|l| &l.activator) != Some(&ActivationFunction::Softmax) {
            return Err(ArtifactError::Shape("output layer must use Softmax".into()));
        }
        if let Some(labels) = self.metadata.as_ref().and_then(|m| m.output_labels.as_ref()) {
            if labels.len() != outputs {
                return Err(ArtifactError::Shape(format!(
                    "metadata lists {} output labels, expected {}",
                    labels.len(),
                    outputs
                )));
            }
        }
        Ok(())
    }

    /// Serializes the network to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network, ArtifactError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
