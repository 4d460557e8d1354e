use serde::{Deserialize, Serialize};

use super::FailureContext;

/// General utility events for warnings, errors, and operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Generic warning message with optional context
    Warning {
        message: String,
        context: Option<String>,
    },

    /// Generic error message with optional details
    Error {
        message: String,
        details: Option<String>,
    },

    DebugLog { message: String },

    OperationStarted { operation: String },

    OperationCompleted { operation: String, success: bool },

    OperationFailed {
        operation: String,
        failure: FailureContext,
    },
}

impl GeneralEvent {
    /// Create a warning event
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: None,
        }
    }

    /// Create a warning event with context
    pub fn warning_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create an error event
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            details: None,
        }
    }

    /// Create a debug log event
    pub fn debug(message: impl Into<String>) -> Self {
        Self::DebugLog {
            message: message.into(),
        }
    }
}
