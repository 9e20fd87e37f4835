pub mod inference;
pub mod model_manager;

use crate::error::AppError;
use crate::models::classify_types::Prediction;
use self::inference::ImageInput;

/// One image in, one prediction out. Implemented by `ClassifierEngine`; tests
/// substitute fakes.
pub trait Classify {
    fn classify(&self, input: ImageInput) -> Result<Prediction, AppError>;
}
