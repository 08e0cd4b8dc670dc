//! Image preprocessing for the disease classifier.
//!
//! Decodes uploaded bytes (PNG/JPEG/BMP/GIF), converts to RGB, resizes to
//! the model's fixed input size and normalizes pixel values to [0, 1].

use image::imageops::FilterType;
use thiserror::Error;

/// Side length of the square image the classifier consumes.
pub const INPUT_SIZE: u32 = 128;
pub const CHANNELS: usize = 3;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Error preprocessing image: {0}")]
    Decode(#[from] image::ImageError),
}

/// A single-image batch laid out as (batch, row, column, channel).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    height: usize,
    width: usize,
    data: Vec<f64>,
}

impl ImageTensor {
    /// Shape as (batch, height, width, channels).
    pub fn shape(&self) -> [usize; 4] {
        [1, self.height, self.width, CHANNELS]
    }

    /// Flat row-major view, R,G,B per pixel.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Element at (row, column, channel) of the single batch entry.
    #[cfg(test)]
    pub(crate) fn get(&self, row: usize, col: usize, channel: usize) -> Option<f64> {
        if row >= self.height || col >= self.width || channel >= CHANNELS {
            return None;
        }
        self.data.get((row * self.width + col) * CHANNELS + channel).copied()
    }

    #[cfg(test)]
    pub(crate) fn from_raw(height: usize, width: usize, data: Vec<f64>) -> ImageTensor {
        assert_eq!(data.len(), height * width * CHANNELS);
        ImageTensor { height, width, data }
    }
}

/// Decodes `bytes`, converts to RGB, resizes to `INPUT_SIZE × INPUT_SIZE`
/// and scales every channel by 1/255.
pub fn preprocess(bytes: &[u8]) -> Result<ImageTensor, PreprocessError> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Lanczos3);
    let rgb = resized.to_rgb8();
    let data = rgb
        .pixels()
        .flat_map(|p| p.0.iter().map(|&c| c as f64 / 255.0))
        .collect();
    Ok(ImageTensor {
        height: INPUT_SIZE as usize,
        width: INPUT_SIZE as usize,
        data,
    })
}
