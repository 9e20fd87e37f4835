use serde::Serialize;
use std::fmt;

/// Crate-wide error type. `Decode` and `LabelLookup` are scoped to a single
/// image or classification call; whether the rest is fatal depends on where it
/// surfaces (startup errors abort the process, per-file errors are isolated by
/// the fetch loop).
#[derive(Debug, Serialize)]
pub enum AppError {
    Io(String),
    Decode(String),
    Inference(String),
    LabelLookup { index: usize },
    Network(String),
    Auth(String),
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(msg) => write!(f, "{}", msg),
            AppError::Decode(msg) => write!(f, "{}", msg),
            AppError::Inference(msg) => write!(f, "{}", msg),
            AppError::LabelLookup { index } => {
                write!(f, "No label for predicted class index {}", index)
            }
            AppError::Network(msg) => write!(f, "{}", msg),
            AppError::Auth(msg) => write!(f, "{}", msg),
            AppError::Config(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<ort::Error> for AppError {
    fn from(err: ort::Error) -> Self {
        AppError::Inference(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
