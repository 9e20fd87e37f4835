use crate::error::AppError;
use crate::models::classify_types::Prediction;
use crate::services::classifier::inference::{self, ImageInput};
use crate::services::classifier::Classify;
use log::info;
use ort::session::Session;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Process-lifetime classification state: the ONNX session and the label
/// index, loaded once at startup. A load failure has no recovery path; the
/// caller is expected to abort.
pub struct ClassifierEngine {
    session: Mutex<Session>,
    labels: HashMap<String, String>,
}

impl ClassifierEngine {
    pub fn load(model_path: &Path, labels_path: &Path) -> Result<Self, AppError> {
        let labels = load_labels(labels_path)?;
        let session = load_session(model_path)?;
        info!(
            "Loaded model {} with {} classes",
            model_path.display(),
            labels.len()
        );
        Ok(Self {
            session: Mutex::new(session),
            labels,
        })
    }

    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }
}

impl Classify for ClassifierEngine {
    fn classify(&self, input: ImageInput) -> Result<Prediction, AppError> {
        let tensor = inference::normalize_image(input)?;
        let mut session = self.session.lock().unwrap();
        inference::run_inference(&mut session, tensor, &self.labels)
    }
}

/// Label index: JSON object mapping string class indices ("0", "1", ...) to
/// human-readable class names.
fn load_labels(path: &Path) -> Result<HashMap<String, String>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Io(format!("Failed to read label index {}: {}", path.display(), e))
    })?;
    let labels: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
        AppError::Config(format!("Failed to parse label index {}: {}", path.display(), e))
    })?;
    if labels.is_empty() {
        return Err(AppError::Config(format!(
            "Label index {} contains no entries",
            path.display()
        )));
    }
    Ok(labels)
}

fn load_session(model_path: &Path) -> Result<Session, AppError> {
    let _ = ort::init().with_name("leafscan").commit();

    Session::builder()
        .map_err(|e| AppError::Inference(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
        .map_err(|e| AppError::Inference(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(4)
        .map_err(|e| AppError::Inference(format!("Failed to set intra threads: {}", e)))?
        .with_execution_providers([
            ort::ep::CPU::default().build(),
        ])
        .map_err(|e| AppError::Inference(format!("Failed to register execution provider: {}", e)))?
        .commit_from_file(model_path)
        .map_err(|e| {
            AppError::Inference(format!(
                "Failed to load ONNX model {}: {}",
                model_path.display(),
                e
            ))
        })
}
