mod detector;
mod labels;
mod remedy;

pub mod config;

pub use detector::{
    Detection, DetectionError, Detector, OrtDetector, CONFIDENCE_THRESHOLD, INPUT_SIZE,
};
pub use labels::{ClassLabel, LabelCatalog, LabelCatalogError};
pub use remedy::{RemedyEntry, RemedyTable};
