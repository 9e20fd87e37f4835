use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    pub class_name: String,
    pub confidence: f32,
}

/// Per-file outcome of a folder fetch. A failed file keeps its slot in the
/// listing order with `prediction: None` and the failure message in `error`.
#[derive(Debug, Serialize, Clone)]
pub struct ClassifyResult {
    pub file_id: String,
    pub file_name: String,
    pub prediction: Option<Prediction>,
    pub error: Option<String>,
}

/// An empty folder is a normal outcome, not an error; the caller renders a
/// "no files found" message exactly once.
#[derive(Debug, Serialize, Clone)]
pub enum FetchOutcome {
    Empty,
    Classified(Vec<ClassifyResult>),
}
