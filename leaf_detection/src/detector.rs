use crate::config::ModelConfig;
use image::{imageops::FilterType, GenericImageView};
use ndarray::{s, Array, Axis, Ix4};
use ort::{
    execution_providers::CPUExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use thiserror::Error;

/// Minimum score a detection must reach to be reported.
pub const CONFIDENCE_THRESHOLD: f32 = 0.10;
/// Side length the input image is resized to before inference.
pub const INPUT_SIZE: u32 = 640;

const NMS_IOU_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to decode image: {0}")]
    InvalidImage(String),
    #[error("model session error: {0}")]
    Session(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Seam between the web layer and the model runtime, mockable in tests.
pub trait Detector: Send + Sync + 'static {
    fn detect(&self, image_data: &[u8]) -> Result<Vec<Detection>, DetectionError>;
}

fn intersection(box1: &Detection, box2: &Detection) -> f32 {
    (box1.x2.min(box2.x2) - box1.x1.max(box2.x1)) * (box1.y2.min(box2.y2) - box1.y1.max(box2.y1))
}

fn union(box1: &Detection, box2: &Detection) -> f32 {
    ((box1.x2 - box1.x1) * (box1.y2 - box1.y1)) + ((box2.x2 - box2.x1) * (box2.y2 - box2.y1))
        - intersection(box1, box2)
}

fn prepare_input(image_data: &[u8]) -> Result<(Array<f32, Ix4>, u32, u32), DetectionError> {
    let image_reader = image::ImageReader::new(std::io::Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| DetectionError::InvalidImage(e.to_string()))?;

    let original_img = image_reader
        .decode()
        .map_err(|e| DetectionError::InvalidImage(e.to_string()))?;

    let (img_width, img_height) = original_img.dimensions();
    let img = original_img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let size = INPUT_SIZE as usize;
    let mut input = Array::zeros((1, 3, size, size));
    for pixel in img.pixels() {
        let x = pixel.0 as _;
        let y = pixel.1 as _;
        let [r, g, b, _] = pixel.2 .0;
        input[[0, 0, y, x]] = (r as f32) / 255.;
        input[[0, 1, y, x]] = (g as f32) / 255.;
        input[[0, 2, y, x]] = (b as f32) / 255.;
    }

    Ok((input, img_width, img_height))
}

/// Greedy non-maximum suppression over confidence-sorted candidates.
fn suppress_overlaps(mut boxes: Vec<Detection>) -> Vec<Detection> {
    boxes.sort_by(|box1, box2| box2.confidence.total_cmp(&box1.confidence));
    let mut result = Vec::new();

    while !boxes.is_empty() {
        result.push(boxes[0]);
        boxes = boxes
            .iter()
            .filter(|box1| {
                intersection(&boxes[0], box1) / union(&boxes[0], box1) < NMS_IOU_THRESHOLD
            })
            .cloned()
            .collect();
    }

    result
}

/// Round-robin pool of ONNX sessions, loaded once at startup and read-only
/// afterwards.
pub struct OrtDetector {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
}

impl OrtDetector {
    pub fn new(model_config: &ModelConfig) -> Result<Self, DetectionError> {
        ort::init()
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .commit()
            .map_err(|e| DetectionError::Session(e.to_string()))?;

        let num_instances = model_config.num_instances;
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(model_config.get_path())?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()
            .map_err(|e| DetectionError::Session(e.to_string()))?;

        tracing::info!("Created {} ONNX sessions", num_instances);

        Ok(Self {
            sessions: Arc::new(sessions),
            counter: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn run_inference(&self, input: &Array<f32, Ix4>) -> Result<ndarray::ArrayD<f32>, DetectionError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let session_arc = &self.sessions[index];
        let mut session = session_arc
            .lock()
            .map_err(|e| DetectionError::Session(format!("session mutex poisoned: {}", e)))?;

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| DetectionError::Inference(format!("failed to build tensor: {}", e)))?;

        let input_tensor = ort::inputs![tensor_ref];

        let outputs = session
            .run(input_tensor)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let (shape, data) = outputs["output0"]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectionError::Inference(format!("failed to extract tensor: {}", e)))?;

        let ix = shape.to_ixdyn();
        let array = ndarray::ArrayD::from_shape_vec(ix, data.to_vec())
            .map_err(|e| DetectionError::Inference(format!("invalid tensor shape: {}", e)))?;

        Ok(array)
    }
}

impl Detector for OrtDetector {
    fn detect(&self, image_data: &[u8]) -> Result<Vec<Detection>, DetectionError> {
        let (input, img_width, img_height) = prepare_input(image_data)?;
        let outputs = self.run_inference(&input)?;

        let size = INPUT_SIZE as f32;
        let mut boxes = Vec::new();
        // Output layout is [1, 4 + num_classes, num_anchors].
        let output = outputs.slice(s![0, .., ..]);

        for row in output.axis_iter(Axis(1)) {
            let row: Vec<_> = row.iter().copied().collect();
            let Some((class_id, prob)) = row
                .iter()
                .skip(4)
                .enumerate()
                .map(|(index, value)| (index, *value))
                .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })
            else {
                continue;
            };

            if prob < CONFIDENCE_THRESHOLD {
                continue;
            }

            let xc = row[0] / size * (img_width as f32);
            let yc = row[1] / size * (img_height as f32);
            let w = row[2] / size * (img_width as f32);
            let h = row[3] / size * (img_height as f32);

            boxes.push(Detection {
                class_id: class_id as u32,
                confidence: prob,
                x1: xc - w / 2.,
                y1: yc - h / 2.,
                x2: xc + w / 2.,
                y2: yc + h / 2.,
            });
        }

        Ok(suppress_overlaps(boxes))
    }
}
