use thiserror::Error;

/// Caller-input failures raised by [`PredictionModel`](super::PredictionModel).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("unknown factor '{0}'")]
    UnknownFactor(String),

    #[error("unknown competition '{0}'")]
    UnknownCompetition(String),

    /// NaN or infinite slider value. Finite values are clamped instead.
    #[error("factor '{id}' cannot take non-finite value {value}")]
    InvalidFactorValue { id: String, value: f64 },
}

impl ModelError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ModelError::UnknownFactor(_) | ModelError::UnknownCompetition(_)
        )
    }
}
