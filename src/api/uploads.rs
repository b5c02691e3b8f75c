use axum::body::Bytes;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartRejection;
use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::services::disease::{self, DiseaseDetection};
use crate::services::soil_service::DEFAULT_REPORT_LANGUAGE;
use crate::services::SoilReport;

/// The parts of an image upload form the handlers care about.
#[derive(Debug, Default)]
struct ImageUpload {
    image: Option<Bytes>,
    file_name: Option<String>,
    language: Option<String>,
}

async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<ImageUpload, ApiError> {
    let mut multipart = multipart?;
    let mut upload = ImageUpload::default();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("image") => {
                upload.file_name = field.file_name().map(ToString::to_string);
                upload.image = Some(field.bytes().await?);
            }
            Some("language") => {
                let text = field.text().await?;
                let text = text.trim();
                if !text.is_empty() {
                    upload.language = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(upload)
}

fn require_image(upload: &ImageUpload) -> Result<&Bytes, ApiError> {
    upload
        .image
        .as_ref()
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::validation("No image file provided"))
}

/// POST /api/soil/analyze
pub async fn analyze_soil(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SoilReport>, ApiError> {
    let upload = read_upload(multipart).await?;
    let image = require_image(&upload)?;
    let language = upload
        .language
        .as_deref()
        .unwrap_or(DEFAULT_REPORT_LANGUAGE);

    tracing::info!(
        image_name = upload.file_name.as_deref().unwrap_or("unnamed"),
        image_size = image.len(),
        language,
        "Processing soil analysis"
    );

    Ok(Json(state.shared.soil_service.analyze(image, language).await?))
}

/// POST /api/disease/detect
pub async fn detect_disease(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DiseaseDetection>, ApiError> {
    let upload = read_upload(multipart).await?;
    let image = require_image(&upload)?;

    let detection = disease::detect(&mut rand::rng());

    tracing::info!(
        image_name = upload.file_name.as_deref().unwrap_or("unnamed"),
        image_size = image.len(),
        disease = %detection.disease,
        confidence = detection.confidence,
        "Disease detection completed"
    );

    Ok(Json(detection))
}
