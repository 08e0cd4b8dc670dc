use thiserror::Error;

use crate::classifier::PredictionError;
use crate::vision::PreprocessError;

/// Problems with the upload itself; reported to the caller verbatim.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("No image file provided")]
    MissingImage,

    #[error("No file selected")]
    NoFileSelected,

    #[error("Invalid file type. Please upload an image.")]
    InvalidFileType,

    #[error("File too large. Maximum upload size is 16 MiB.")]
    TooLarge,
}

/// Everything a request handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation(ValidationError::TooLarge) => 413,
            ApiError::Validation(_) => 400,
            ApiError::Preprocess(_) | ApiError::Prediction(_) | ApiError::Internal(_) => 500,
        }
    }
}
