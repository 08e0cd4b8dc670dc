use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::catalog::{class_name, DISEASE_CLASSES};

#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("Error predicting disease: input tensor has shape {actual:?}, expected {expected:?}")]
    InputShape { expected: [usize; 4], actual: [usize; 4] },

    #[error("Error predicting disease: model produced {actual} outputs, expected {expected}")]
    OutputLength { expected: usize, actual: usize },

    #[error("Error predicting disease: model output {index} is not a finite probability")]
    NonFinite { index: usize },
}

/// Top-1 answer returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub disease: String,
    pub confidence: f64,
    pub class_index: usize,
}

impl PredictionResult {
    pub fn for_class(class_index: usize, confidence: f64) -> Option<PredictionResult> {
        Some(PredictionResult {
            disease: class_name(class_index)?.to_owned(),
            confidence,
            class_index,
        })
    }

    /// Picks the most probable class from a full probability vector.
    pub fn from_probabilities(probs: &[f64]) -> Result<PredictionResult, PredictionError> {
        if probs.len() != DISEASE_CLASSES.len() {
            return Err(PredictionError::OutputLength {
                expected: DISEASE_CLASSES.len(),
                actual: probs.len(),
            });
        }
        if let Some(index) = probs.iter().position(|p| !p.is_finite()) {
            return Err(PredictionError::NonFinite { index });
        }
        let (index, confidence) = argmax(probs).ok_or(PredictionError::OutputLength {
            expected: DISEASE_CLASSES.len(),
            actual: 0,
        })?;
        PredictionResult::for_class(index, confidence).ok_or(PredictionError::OutputLength {
            expected: DISEASE_CLASSES.len(),
            actual: probs.len(),
        })
    }
}

/// Index and value of the maximum element; ties go to the lowest index.
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    let mut iter = values.iter().copied().enumerate();
    let mut best = iter.next()?;
    for (i, v) in iter {
        if v > best.1 {
            best = (i, v);
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(index: usize, value: f64) -> Vec<f64> {
        let mut v = vec![(1.0 - value) / 22.0; 23];
        v[index] = value;
        v
    }

    #[test]
    fn argmax_prefers_first_of_equal_maxima() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some((1, 0.4)));
        assert_eq!(argmax(&[0.25; 4]), Some((0, 0.25)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn result_label_matches_catalog_index() {
        let r = PredictionResult::from_probabilities(&one_hot(20, 0.9)).unwrap();
        assert_eq!(r.class_index, 20);
        assert_eq!(r.disease, "Potato___Early_blight");
        assert!((r.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn uniform_output_selects_first_class() {
        let r = PredictionResult::from_probabilities(&[1.0 / 23.0; 23]).unwrap();
        assert_eq!(r.class_index, 0);
        assert_eq!(r.disease, DISEASE_CLASSES[0]);
    }

    #[test]
    fn wrong_length_and_nan_are_errors() {
        assert_eq!(
            PredictionResult::from_probabilities(&[0.5, 0.5]),
            Err(PredictionError::OutputLength { expected: 23, actual: 2 })
        );
        let mut probs = one_hot(3, 0.8);
        probs[7] = f64::NAN;
        assert_eq!(
            PredictionResult::from_probabilities(&probs),
            Err(PredictionError::NonFinite { index: 7 })
        );
    }

    #[test]
    fn serializes_with_api_field_names() {
        let r = PredictionResult::for_class(3, 0.75).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"disease": "Apple___healthy", "confidence": 0.75, "class_index": 3})
        );
    }
}
