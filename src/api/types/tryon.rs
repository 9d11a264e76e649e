//! Try-on wire types

use serde::{Deserialize, Serialize};

use crate::infrastructure::services::{DemoCommand, TryOnCommand, TryOnResult};

/// POST /api/virtual-try-on body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnRequest {
    pub prompt: Option<String>,
    #[serde(rename = "type")]
    pub style: Option<String>,
    pub num_images: Option<u32>,
    /// `[subject, garment]`
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub product_id: Option<String>,
}

impl TryOnRequest {
    pub fn into_command(self, client_ip: String) -> TryOnCommand {
        let mut images = self.image_urls.into_iter();

        TryOnCommand {
            product_id: self.product_id,
            subject_url: images.next().unwrap_or_default(),
            garment_url: images.next().unwrap_or_default(),
            prompt: self.prompt,
            style: self.style,
            num_images: self.num_images,
            client_ip,
        }
    }
}

/// POST /api/generate-demo body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoRequest {
    /// Public URL or base64 `data:` URL
    #[serde(default)]
    pub user_image_url: String,
    #[serde(default)]
    pub garment_url: String,
}

impl DemoRequest {
    pub fn into_command(self, client_ip: String) -> DemoCommand {
        DemoCommand {
            user_image: self.user_image_url,
            garment_url: self.garment_url,
            client_ip,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryOnResponse {
    pub status: String,
    pub result_url: String,
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl From<TryOnResult> for TryOnResponse {
    fn from(result: TryOnResult) -> Self {
        Self {
            status: "success".to_string(),
            result_url: result.result_url,
            task_id: result.task_id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaQuery {
    pub product_id: Option<String>,
}
