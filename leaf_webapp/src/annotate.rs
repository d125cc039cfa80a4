use base64::{prelude::BASE64_STANDARD, Engine};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use leaf_detection::{Detection, LabelCatalog};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("failed to encode annotated image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Draws each detection as a 2 px hollow rectangle in its class color on a
/// copy of the original-resolution image.
pub fn annotate(image: &DynamicImage, detections: &[Detection], labels: &LabelCatalog) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);

    for detection in detections {
        let x1 = (detection.x1.floor() as i32).clamp(0, width - 1);
        let y1 = (detection.y1.floor() as i32).clamp(0, height - 1);
        let x2 = (detection.x2.ceil() as i32).clamp(0, width - 1);
        let y2 = (detection.y2.ceil() as i32).clamp(0, height - 1);

        if x2 - x1 < 2 || y2 - y1 < 2 {
            continue;
        }

        let color = match labels.get(detection.class_id) {
            Some(label) => Rgb([label.red, label.green, label.blue]),
            None => Rgb([0, 0, 0]),
        };

        for inset in 0..2 {
            let rect_w = x2 - x1 - 2 * inset;
            let rect_h = y2 - y1 - 2 * inset;
            if rect_w <= 0 || rect_h <= 0 {
                break;
            }
            let rect = Rect::at(x1 + inset, y1 + inset).of_size(rect_w as u32, rect_h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    canvas
}

/// Encodes the image as JPEG wrapped in a data URL the page can show
/// directly in an `img` element.
pub fn to_jpeg_data_url(image: &RgbImage) -> Result<String, AnnotateError> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64_STANDARD.encode(&buffer)
    ))
}
