use serde::{Serialize, Deserialize};

/// Row-major dense matrix as stored in model artifacts. The declared
/// `rows`/`cols` are checked against `data` by [`Matrix::is_consistent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        let cols = data.first().map(|row| row.len()).unwrap_or(0);
        Matrix {
            rows: data.len(),
            cols,
            data,
        }
    }

    /// True when the declared shape matches the actual row/column counts.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.rows && self.data.iter().all(|row| row.len() == self.cols)
    }

    /// Row-vector times matrix: `x (1 x rows) * self (rows x cols) -> (1 x cols)`.
    ///
    /// Returns `None` when `x.len() != rows`.
    pub fn left_mul(&self, x: &[f64]) -> Option<Vec<f64>> {
        if x.len() != self.rows {
            return None;
        }
        let mut out = vec![0.0; self.cols];
        for (xi, row) in x.iter().zip(&self.data) {
            // Zero inputs contribute nothing.
            if *xi == 0.0 {
                continue;
            }
            for (acc, w) in out.iter_mut().zip(row) {
                *acc += xi * w;
            }
        }
        Some(out)
    }
}
