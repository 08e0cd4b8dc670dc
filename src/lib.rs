pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod vision;
pub mod classifier;
pub mod market;
pub mod config;
pub mod logging;
pub mod server;

// Convenience re-exports
pub use classifier::{Classifier, DiseaseClassifier, ModelSource, PredictionResult, DISEASE_CLASSES};
pub use config::Config;
pub use market::{CommodityRecord, PriceAggregator, PriceFeed};
pub use network::Network;
pub use server::AppState;
pub use vision::{preprocess, ImageTensor};
