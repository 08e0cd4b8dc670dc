use std::io::Read;

use tiny_http::Request;
use tracing::{error, info, warn};

use crate::classifier::{DiseaseClassifier, PredictionResult};
use crate::server::error::{ApiError, ValidationError};
use crate::server::routes::{api_error, json_response, HttpResponse};
use crate::server::util::multipart::{extract_boundary, find_file_part};
use crate::server::AppState;
use crate::vision::preprocess;

pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];
const IMAGE_FIELD: &str = "image";

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

pub fn handle(request: &mut Request, state: &AppState) -> HttpResponse {
    let outcome = read_upload(request)
        .and_then(|(content_type, body)| predict_upload(&content_type, &body, &state.classifier));

    match outcome {
        Ok(result) => {
            info!("Predicted {} ({:.3})", result.disease, result.confidence);
            json_response(200, &result)
        }
        Err(e @ ApiError::Validation(_)) => {
            warn!("Rejected upload: {}", e);
            api_error(&e)
        }
        Err(e) => {
            error!("Prediction error: {}", e);
            api_error(&e)
        }
    }
}

/// Reads the Content-Type and at most `MAX_UPLOAD_BYTES` of body.
fn read_upload(request: &mut Request) -> Result<(String, Vec<u8>), ApiError> {
    if request.body_length().is_some_and(|n| n > MAX_UPLOAD_BYTES) {
        return Err(ValidationError::TooLarge.into());
    }

    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_UPLOAD_BYTES as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| ApiError::Internal(format!("Failed to read request body: {}", e)))?;
    if body.len() > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge.into());
    }
    Ok((content_type, body))
}

/// Validates the `image` part of a multipart body and classifies it.
pub fn predict_upload(
    content_type: &str,
    body: &[u8],
    classifier: &DiseaseClassifier,
) -> Result<PredictionResult, ApiError> {
    let boundary = extract_boundary(content_type).ok_or(ValidationError::MissingImage)?;
    let part = find_file_part(body, &boundary, IMAGE_FIELD).ok_or(ValidationError::MissingImage)?;

    if part.filename.is_empty() {
        return Err(ValidationError::NoFileSelected.into());
    }
    if !allowed_file(&part.filename) {
        return Err(ValidationError::InvalidFileType.into());
    }

    let tensor = preprocess(&part.data)?;
    Ok(classifier.predict(&tensor)?)
}

/// True when the name has an extension from `ALLOWED_EXTENSIONS` (any case).
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ModelSource, DISEASE_CLASSES};
    use crate::server::util::multipart::tests::build_body;
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    const CT: &str = "multipart/form-data; boundary=XyZ";

    fn unloaded() -> DiseaseClassifier {
        DiseaseClassifier::new(ModelSource::default())
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(20, 30, Rgb([90, 160, 40]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    fn validation(result: Result<PredictionResult, ApiError>) -> ValidationError {
        match result {
            Err(ApiError::Validation(v)) => v,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn extension_check() {
        for ok in ["a.png", "b.JPG", "c.jpeg", "d.gif", "e.BmP", "x.y.png"] {
            assert!(allowed_file(ok), "{}", ok);
        }
        for bad in ["x.txt", "png", "photo.", "archive.png.zip", ""] {
            assert!(!allowed_file(bad), "{}", bad);
        }
    }

    #[test]
    fn non_multipart_request_has_no_image() {
        let err = validation(predict_upload("application/json", b"{}", &unloaded()));
        assert_eq!(err, ValidationError::MissingImage);
    }

    #[test]
    fn missing_image_field() {
        let body = build_body("XyZ", &[("photo", Some("a.png"), b"abc")]);
        assert_eq!(validation(predict_upload(CT, &body, &unloaded())), ValidationError::MissingImage);
    }

    #[test]
    fn empty_filename() {
        let body = build_body("XyZ", &[("image", Some(""), b"")]);
        assert_eq!(validation(predict_upload(CT, &body, &unloaded())), ValidationError::NoFileSelected);
    }

    #[test]
    fn wrong_extension() {
        let body = build_body("XyZ", &[("image", Some("x.txt"), b"hello")]);
        assert_eq!(validation(predict_upload(CT, &body, &unloaded())), ValidationError::InvalidFileType);
    }

    #[test]
    fn undecodable_image_is_a_preprocess_error() {
        let body = build_body("XyZ", &[("image", Some("leaf.png"), b"definitely not a png")]);
        let err = predict_upload(CT, &body, &unloaded()).unwrap_err();
        assert!(matches!(err, ApiError::Preprocess(_)));
        assert_eq!(err.status(), 500);
        assert!(err.to_string().starts_with("Error preprocessing image:"));
    }

    #[test]
    fn valid_upload_yields_catalog_prediction() {
        let png = png_bytes();
        let body = build_body("XyZ", &[("note", None, &b"hi"[..]), ("image", Some("leaf.png"), &png[..])]);
        let result = predict_upload(CT, &body, &unloaded()).unwrap();
        assert_eq!(DISEASE_CLASSES[result.class_index], result.disease);
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}
