pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

pub use config::{AppConfig, DriveConfig};
pub use error::AppError;
pub use pipeline::AppContext;
