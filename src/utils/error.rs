use crate::domain::model::{BranchId, CompartmentId, NodeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscretizationError {
    #[error("Unknown branch: {branch}")]
    UnknownBranch { branch: BranchId },

    #[error("Unknown node: {node}")]
    UnknownNode { node: NodeId },

    #[error("Unknown compartment: {compartment}")]
    UnknownCompartment { compartment: CompartmentId },

    #[error("No location at chainage {chainage} on branch {branch}")]
    LocationNotFound { branch: BranchId, chainage: f64 },

    #[error("Invalid topology: {message}")]
    InvalidTopology { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl DiscretizationError {
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }

    /// 結構性誤用（呼叫端錯誤），與設定錯誤區分
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnknownBranch { .. }
                | Self::UnknownNode { .. }
                | Self::UnknownCompartment { .. }
                | Self::InvalidTopology { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DiscretizationError>;
