pub mod adapter;
pub mod catalog;
pub mod download;
pub mod prediction;

pub use adapter::{Classifier, DiseaseClassifier, ModelSource};
pub use catalog::DISEASE_CLASSES;
pub use prediction::{PredictionError, PredictionResult};
