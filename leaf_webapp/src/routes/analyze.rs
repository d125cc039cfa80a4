use crate::{
    annotate::{annotate, to_jpeg_data_url, AnnotateError},
    report::{build_report, AnalysisReport, Outcome},
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use leaf_detection::{DetectionError, Detector};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Image decode failed: {0}")]
    InvalidImage(String),
    #[error("Inference failed: {0}")]
    Detection(String),
    #[error("Annotation failed: {0}")]
    Annotation(#[from] AnnotateError),
}

impl From<DetectionError> for AnalyzeError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::InvalidImage(reason) => AnalyzeError::InvalidImage(reason),
            other => AnalyzeError::Detection(other.to_string()),
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = match self {
            AnalyzeError::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, format!("Something went wrong: {}", self)).into_response()
    }
}

/// One upload, one synchronous inference pass, one rendered report. No
/// retries: a failed interaction surfaces its error and ends there.
#[instrument(skip(state, image_data))]
pub async fn analyze<D: Detector>(
    State(state): State<SharedState<D>>,
    image_data: Bytes,
) -> Result<Json<AnalysisReport>, AnalyzeError> {
    let original = image::load_from_memory(&image_data)
        .map_err(|e| AnalyzeError::InvalidImage(e.to_string()))?;

    let started = Instant::now();
    let detections = state.detector.detect(&image_data)?;
    state
        .metrics
        .record_inference_duration(started.elapsed().as_millis() as u64);
    state.metrics.record_detections(detections.len() as u64);

    let annotated_image = if detections.is_empty() {
        None
    } else {
        let annotated = annotate(&original, &detections, &state.labels);
        Some(to_jpeg_data_url(&annotated)?)
    };

    let report = build_report(&detections, &state.labels, &state.remedies, annotated_image);

    let outcome = match report.outcome {
        Outcome::Clear => "clear",
        Outcome::Detected => "detected",
    };
    state.metrics.record_analysis(outcome);
    tracing::debug!("Analysis finished with {} detections", detections.len());

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Metrics;
    use image::{ImageBuffer, Rgb};
    use leaf_detection::{Detection, LabelCatalog, RemedyTable};
    use std::{io::Cursor, sync::Arc};

    struct MockDetector {
        detections: Vec<Detection>,
    }

    impl Detector for MockDetector {
        fn detect(&self, _image_data: &[u8]) -> Result<Vec<Detection>, DetectionError> {
            Ok(self.detections.clone())
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&self, _image_data: &[u8]) -> Result<Vec<Detection>, DetectionError> {
            Err(DetectionError::Inference("session exploded".to_string()))
        }
    }

    fn state_with<D: Detector>(detector: D) -> SharedState<D> {
        let records = "\
Pepper__bell___Bacterial_spot, 214, 39, 40
Pepper__bell___healthy, 44, 160, 44
Potato___Early_blight, 255, 127, 14
";
        SharedState {
            detector: Arc::new(detector),
            labels: Arc::new(LabelCatalog::from_reader(Cursor::new(records)).unwrap()),
            remedies: Arc::new(RemedyTable::new()),
            metrics: Arc::new(Metrics::new()),
        }
    }

    fn png_bytes() -> Bytes {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(64, 64, Rgb([20, 120, 20]));
        let mut image_data: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut image_data);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        Bytes::from(image_data)
    }

    #[tokio::test]
    async fn test_analyze_clear_image() {
        let state = state_with(MockDetector { detections: vec![] });

        let Json(report) = analyze(State(state), png_bytes()).await.unwrap();

        assert_eq!(report.outcome, Outcome::Clear);
        assert!(report.annotated_image.is_none());
    }

    #[tokio::test]
    async fn test_analyze_detected_image() {
        let detections = vec![
            Detection {
                class_id: 2,
                confidence: 0.91,
                x1: 5.,
                y1: 5.,
                x2: 40.,
                y2: 40.,
            },
            Detection {
                class_id: 0,
                confidence: 0.33,
                x1: 10.,
                y1: 10.,
                x2: 30.,
                y2: 30.,
            },
        ];
        let state = state_with(MockDetector { detections });

        let Json(report) = analyze(State(state), png_bytes()).await.unwrap();

        assert_eq!(report.outcome, Outcome::Detected);
        assert_eq!(report.detections.len(), 2);
        let diagnosis = report.diagnosis.unwrap();
        assert_eq!(diagnosis.label, "Potato___Early_blight");
        assert!(report
            .annotated_image
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_garbage_bytes() {
        let state = state_with(MockDetector { detections: vec![] });

        let result = analyze(State(state), Bytes::from_static(&[0u8; 32])).await;

        assert!(matches!(result, Err(AnalyzeError::InvalidImage(_))));
    }

    #[tokio::test]
    async fn test_analyze_surfaces_inference_failure() {
        let state = state_with(FailingDetector);

        let result = analyze(State(state), png_bytes()).await;

        assert!(matches!(result, Err(AnalyzeError::Detection(_))));
    }
}
