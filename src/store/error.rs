use crate::{gateway::GatewayError, model::DraftError};

/// Fallback shown when the service gave no usable message.
const GENERIC_SAVE_FAILURE: &str = "Failed to save application";

/// Failure of a store mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Draft(#[from] DraftError),
}

impl StoreError {
    pub fn gateway(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway(err) => Some(err),
            Self::Draft(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Gateway(GatewayError::Unauthorized))
    }

    /// Text suitable for a form-level error line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Draft(err) => err.to_string(),
            Self::Gateway(err) => err
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_SAVE_FAILURE.to_string()),
        }
    }
}
