use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer: `a = act(x * W + b)`.
///
/// `weights` is `input_size x size`, `biases` is `1 x size`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

impl Layer {
    pub fn new(weights: Matrix, biases: Vec<f64>, activation: ActivationFunction) -> Layer {
        Layer {
            size: biases.len(),
            weights,
            biases: Matrix::from_data(vec![biases]),
            activator: activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Checks that the matrices agree with each other and with `size`.
    pub fn check_shape(&self) -> Result<(), String> {
        if !self.weights.is_consistent() || !self.biases.is_consistent() {
            return Err("weight or bias matrix has ragged rows".into());
        }
        if self.weights.cols != self.size {
            return Err(format!(
                "weights have {} columns but layer size is {}",
                self.weights.cols, self.size
            ));
        }
        if self.biases.rows != 1 || self.biases.cols != self.size {
            return Err(format!(
                "biases are {}x{}, expected 1x{}",
                self.biases.rows, self.biases.cols, self.size
            ));
        }
        Ok(())
    }

    /// Returns `None` if `input` does not have `input_size()` elements.
    pub fn forward(&self, input: &[f64]) -> Option<Vec<f64>> {
        let mut z = self.weights.left_mul(input)?;
        for (zi, b) in z.iter_mut().zip(&self.biases.data[0]) {
            *zi += b;
        }
        self.activator.apply(&mut z);
        Some(z)
    }
}
