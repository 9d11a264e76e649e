//! Metadata blob stored alongside usage entries

use serde::{Deserialize, Serialize};

/// Structured metadata persisted as a JSON string in the usage log.
///
/// Readers must go through [`UsageMetadata::parse_lenient`] since older
/// rows hold free-form error text instead of JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none", default)]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub input_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub credits_used: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl UsageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_result_url(mut self, url: impl Into<String>) -> Self {
        self.result_url = Some(url.into());
        self
    }

    pub fn with_input_images(mut self, images: Vec<String>) -> Self {
        self.input_images = images;
        self
    }

    pub fn with_credits_used(mut self, credits: i64) -> Self {
        self.credits_used = Some(credits);
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Serialize into the opaque column value
    pub fn to_blob(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a stored blob, treating non-JSON content as a legacy error string
    pub fn parse_lenient(raw: &str) -> Self {
        match serde_json::from_str::<Self>(raw) {
            Ok(metadata) => metadata,
            Err(_) => Self::new().with_error(raw),
        }
    }
}
