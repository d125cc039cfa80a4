use leaf_detection::{Detection, LabelCatalog, RemedyTable};
use serde::Serialize;

pub const CLEAR_MESSAGE: &str = "No clear disease detected in the uploaded image.";
pub const CLEAR_ADVISORY: &str =
    "Try uploading a clearer image with a single leaf and plain background.";
pub const FALLBACK_ADVICE: &str =
    "No specific remedies found for this disease. Please consult an agricultural expert.";

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Clear,
    Detected,
}

#[derive(Debug, Serialize)]
pub struct DetectionSummary {
    pub label: String,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Remedy information for the highest-confidence detection.
#[derive(Debug, Serialize)]
pub struct Diagnosis {
    pub label: String,
    pub display_name: String,
    pub confidence_percent: String,
    pub description: Option<String>,
    pub remedies: Vec<String>,
    pub advisory: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub outcome: Outcome,
    pub message: String,
    pub advisory: Option<String>,
    pub detections: Vec<DetectionSummary>,
    pub diagnosis: Option<Diagnosis>,
    pub annotated_image: Option<String>,
}

fn label_for(class_id: u32, labels: &LabelCatalog) -> String {
    match labels.get(class_id) {
        Some(class_label) => class_label.label.clone(),
        None => format!("Unknown class {}", class_id),
    }
}

fn format_percent(confidence: f32) -> String {
    format!("{:.1}%", confidence.clamp(0.0, 1.0) * 100.0)
}

/// Builds the response for one analysis. The diagnosis always follows the
/// maximum-confidence detection, whatever order the detector returned.
pub fn build_report(
    detections: &[Detection],
    labels: &LabelCatalog,
    remedies: &RemedyTable,
    annotated_image: Option<String>,
) -> AnalysisReport {
    let Some(best) = detections
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    else {
        return AnalysisReport {
            outcome: Outcome::Clear,
            message: CLEAR_MESSAGE.to_string(),
            advisory: Some(CLEAR_ADVISORY.to_string()),
            detections: Vec::new(),
            diagnosis: None,
            annotated_image: None,
        };
    };

    let summaries = detections
        .iter()
        .map(|detection| DetectionSummary {
            label: label_for(detection.class_id, labels),
            confidence: detection.confidence,
            x1: detection.x1,
            y1: detection.y1,
            x2: detection.x2,
            y2: detection.y2,
        })
        .collect();

    let label = label_for(best.class_id, labels);
    let diagnosis = match remedies.lookup(&label) {
        Some(entry) => Diagnosis {
            display_name: label.replace('_', " "),
            confidence_percent: format_percent(best.confidence),
            description: Some(entry.description.to_string()),
            remedies: entry.remedies.iter().map(|r| r.to_string()).collect(),
            advisory: None,
            label,
        },
        None => Diagnosis {
            display_name: label.replace('_', " "),
            confidence_percent: format_percent(best.confidence),
            description: None,
            remedies: Vec::new(),
            advisory: Some(FALLBACK_ADVICE.to_string()),
            label,
        },
    };

    AnalysisReport {
        outcome: Outcome::Detected,
        message: "Crop Disease Detected".to_string(),
        advisory: None,
        detections: summaries,
        diagnosis: Some(diagnosis),
        annotated_image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn catalog() -> LabelCatalog {
        let records = "\
Pepper__bell___Bacterial_spot, 214, 39, 40
Tomato_Late_blight, 148, 103, 189
Tomato_healthy, 44, 160, 44
";
        LabelCatalog::from_reader(Cursor::new(records)).unwrap()
    }

    fn detection(class_id: u32, confidence: f32) -> Detection {
        Detection {
            class_id,
            confidence,
            x1: 1.,
            y1: 2.,
            x2: 3.,
            y2: 4.,
        }
    }

    #[test]
    fn test_zero_detections_is_clear_outcome() {
        let report = build_report(&[], &catalog(), &RemedyTable::new(), None);

        assert_eq!(report.outcome, Outcome::Clear);
        assert!(report.diagnosis.is_none());
        assert!(report.detections.is_empty());
        assert_eq!(report.advisory.as_deref(), Some(CLEAR_ADVISORY));
    }

    #[test]
    fn test_diagnosis_follows_highest_confidence() {
        // Deliberately not sorted: the healthy class comes first.
        let detections = [
            detection(2, 0.35),
            detection(1, 0.82),
            detection(0, 0.15),
        ];

        let report = build_report(&detections, &catalog(), &RemedyTable::new(), None);

        let diagnosis = report.diagnosis.unwrap();
        assert_eq!(diagnosis.label, "Tomato_Late_blight");
        assert_eq!(diagnosis.confidence_percent, "82.0%");
        assert_eq!(
            diagnosis.description.as_deref(),
            Some("Severe fungal disease causing brown lesions.")
        );
        assert_eq!(diagnosis.remedies.len(), 3);
        assert!(diagnosis.advisory.is_none());
    }

    #[test]
    fn test_display_name_replaces_underscores() {
        let detections = [detection(1, 0.5)];
        let report = build_report(&detections, &catalog(), &RemedyTable::new(), None);

        let diagnosis = report.diagnosis.unwrap();
        assert_eq!(diagnosis.display_name, "Tomato Late blight");
    }

    #[test]
    fn test_unknown_label_gets_fallback_advice() {
        // Class id 9 has no catalog entry, so no remedy entry can match.
        let detections = [detection(9, 0.77)];
        let report = build_report(&detections, &catalog(), &RemedyTable::new(), None);

        let diagnosis = report.diagnosis.unwrap();
        assert_eq!(diagnosis.label, "Unknown class 9");
        assert!(diagnosis.description.is_none());
        assert!(diagnosis.remedies.is_empty());
        assert_eq!(diagnosis.advisory.as_deref(), Some(FALLBACK_ADVICE));
    }

    #[test]
    fn test_confidence_percent_stays_in_range() {
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(1.0), "100.0%");
        // Out-of-range model scores are clamped, never rendered above 100%.
        assert_eq!(format_percent(1.7), "100.0%");
        assert_eq!(format_percent(-0.2), "0.0%");
    }

    #[test]
    fn test_detected_report_keeps_every_detection() {
        let detections = [detection(1, 0.8), detection(2, 0.4)];
        let report = build_report(
            &detections,
            &catalog(),
            &RemedyTable::new(),
            Some("data:image/jpeg;base64,abcd".to_string()),
        );

        assert_eq!(report.outcome, Outcome::Detected);
        assert_eq!(report.detections.len(), 2);
        assert!(report.annotated_image.is_some());
    }
}
