use crate::error::AppError;
use crate::models::classify_types::Prediction;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;

pub const INPUT_SIZE: u32 = 224;

/// The three shapes an image reaches the pipeline in: a path on disk (local
/// upload), raw bytes (remote download), or an already-decoded bitmap.
pub enum ImageInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Decoded(DynamicImage),
}

fn decode(input: ImageInput) -> Result<DynamicImage, AppError> {
    match input {
        ImageInput::Path(path) => ImageReader::open(&path)
            .map_err(|e| {
                AppError::Io(format!("Failed to open image {}: {}", path.display(), e))
            })?
            .decode()
            .map_err(|e| {
                AppError::Decode(format!("Failed to decode image {}: {}", path.display(), e))
            }),
        ImageInput::Bytes(bytes) => ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| AppError::Io(format!("Failed to probe image format: {}", e)))?
            .decode()
            .map_err(|e| AppError::Decode(format!("Failed to decode image bytes: {}", e))),
        ImageInput::Decoded(img) => Ok(img),
    }
}

/// Decode, stretch to 224x224 (aspect ratio is deliberately not preserved;
/// the model was trained on stretched inputs), and scale u8 [0,255] to
/// f32 [0,1]. Output shape is always NHWC (1, 224, 224, 3).
pub fn normalize_image(input: ImageInput) -> Result<Array4<f32>, AppError> {
    let img = decode(input)?;
    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let data: Vec<f32> = rgb.into_raw().iter().map(|&v| v as f32 / 255.0).collect();
    let side = INPUT_SIZE as usize;
    Array4::from_shape_vec((1, side, side, 3), data)
        .map_err(|e| AppError::Inference(format!("Failed to create tensor: {}", e)))
}

/// Forward pass plus label lookup: softmax over the logits for a confidence,
/// argmax for the class index, then the index resolved through the label map
/// by its string key.
pub fn run_inference(
    session: &mut Session,
    input: Array4<f32>,
    labels: &HashMap<String, String>,
) -> Result<Prediction, AppError> {
    let input_name = session.inputs()[0].name().to_string();

    let input_tensor = Value::from_array(input)
        .map_err(|e| AppError::Inference(format!("Failed to create tensor value: {}", e)))?;

    let outputs = session
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| AppError::Inference(format!("Inference failed: {}", e)))?;

    let output_value = outputs
        .values()
        .next()
        .ok_or_else(|| AppError::Inference("Model produced no outputs".to_string()))?;

    let (_, logits) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| AppError::Inference(format!("Failed to extract output tensor: {}", e)))?;

    let probabilities = softmax(logits);
    let index = argmax(&probabilities)
        .ok_or_else(|| AppError::Inference("Model produced an empty output".to_string()))?;
    let class_name = lookup_label(labels, index)?;

    Ok(Prediction {
        class_name,
        confidence: probabilities[index],
    })
}

pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits.iter().map(|&x| (x - max_logit).exp() / exp_sum).collect()
}

/// Index of the maximum value; ties go to the lowest index.
pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best, (i, &v)| match best {
            Some((_, best_v)) if v <= best_v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// The label index is keyed by the class index rendered as a string. A
/// missing key means a corrupted or mismatched label file; the call fails
/// rather than inventing a name.
pub(crate) fn lookup_label(
    labels: &HashMap<String, String>,
    index: usize,
) -> Result<String, AppError> {
    labels
        .get(&index.to_string())
        .cloned()
        .ok_or(AppError::LabelLookup { index })
}
