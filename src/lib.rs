pub mod config;
pub mod dashboard;
pub mod model;

pub use model::{ModelError, PredictionModel, Snapshot};
