//! Provider task state and orchestration outcome

use serde::Serialize;

/// State of a provider task as reported by one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Still generating
    Pending,
    Succeeded { result_url: String },
    Failed { message: String },
}

impl TaskState {
    /// Classify a provider `successFlag`: 1 succeeded, 2 or 3 failed, anything else pending.
    ///
    /// A success flag without a result URL is reported as a failure.
    pub fn from_success_flag(
        flag: Option<i64>,
        result_url: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        match flag {
            Some(1) => match result_url {
                Some(result_url) => Self::Succeeded { result_url },
                None => Self::Failed {
                    message: "Provider reported success without a result image".to_string(),
                },
            },
            Some(2) | Some(3) => Self::Failed {
                message: error_message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Generation failed".to_string()),
            },
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Final result of one orchestrated generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationOutcome {
    Success {
        task_id: String,
        result_url: String,
    },
    /// Generation failed and the garment image stands in as the result
    FailedWithPlaceholder {
        task_id: Option<String>,
        placeholder_url: String,
        error: String,
    },
    Failed {
        task_id: Option<String>,
        error: String,
    },
    TimedOut {
        task_id: String,
        attempts: u32,
    },
}

impl GenerationOutcome {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Success { task_id, .. } | Self::TimedOut { task_id, .. } => Some(task_id),
            Self::FailedWithPlaceholder { task_id, .. } | Self::Failed { task_id, .. } => {
                task_id.as_deref()
            }
        }
    }

    /// URL handed back to the widget, if any
    pub fn result_url(&self) -> Option<&str> {
        match self {
            Self::Success { result_url, .. } => Some(result_url),
            Self::FailedWithPlaceholder {
                placeholder_url, ..
            } => Some(placeholder_url),
            Self::Failed { .. } | Self::TimedOut { .. } => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::FailedWithPlaceholder { error, .. } | Self::Failed { error, .. } => {
                Some(error.clone())
            }
            Self::TimedOut { .. } => Some("Generation timed out".to_string()),
        }
    }

    /// Whether settlement should charge for this outcome
    pub fn is_billable(&self, charge_placeholder: bool) -> bool {
        match self {
            Self::Success { .. } => true,
            Self::FailedWithPlaceholder { .. } => charge_placeholder,
            Self::Failed { .. } | Self::TimedOut { .. } => false,
        }
    }

    /// Replace a failure with the placeholder image
    pub fn with_placeholder(self, placeholder_url: &str) -> Self {
        match self {
            Self::Failed { task_id, error } => Self::FailedWithPlaceholder {
                task_id,
                placeholder_url: placeholder_url.to_string(),
                error,
            },
            Self::TimedOut { task_id, .. } => Self::FailedWithPlaceholder {
                task_id: Some(task_id),
                placeholder_url: placeholder_url.to_string(),
                error: "Generation timed out".to_string(),
            },
            other => other,
        }
    }
}
