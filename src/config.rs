use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const MODEL_DIR: &str = "trained_model";
const MODEL_FILE: &str = "leaf_disease_model.onnx";
const LABELS_FILE: &str = "class_indices.json";

/// Where the Drive client finds its service-account credential and which
/// scopes it requests. Injected, never hardcoded.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    pub credential_path: PathBuf,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl DriveConfig {
    pub fn new(credential_path: PathBuf) -> Self {
        Self {
            credential_path,
            scopes: default_scopes(),
        }
    }
}

fn default_scopes() -> Vec<String> {
    vec![DRIVE_SCOPE.to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub drive: Option<DriveConfig>,
}

impl AppConfig {
    /// Default layout: the model lives in `trained_model/` next to the running
    /// executable, with the label index as a sibling JSON file.
    pub fn from_exe_dir() -> Result<Self, AppError> {
        let exe = std::env::current_exe().map_err(|e| {
            AppError::Config(format!("Failed to locate running executable: {}", e))
        })?;
        let dir = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::in_dir(&dir))
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model_path: dir.join(MODEL_DIR).join(MODEL_FILE),
            labels_path: dir.join(LABELS_FILE),
            drive: None,
        }
    }
}
