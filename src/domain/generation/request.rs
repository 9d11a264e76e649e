//! Generation request

use serde::{Deserialize, Serialize};

/// Output count used when the caller does not ask for one
pub const DEFAULT_NUM_IMAGES: u32 = 1;

/// A try-on job: composite the garment onto the subject photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub subject_url: String,
    pub garment_url: String,
    pub prompt: String,
    pub num_images: u32,
}

impl GenerationRequest {
    pub fn new(
        subject_url: impl Into<String>,
        garment_url: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            subject_url: subject_url.into(),
            garment_url: garment_url.into(),
            prompt: prompt.into(),
            num_images: DEFAULT_NUM_IMAGES,
        }
    }

    pub fn with_num_images(mut self, num_images: u32) -> Self {
        self.num_images = num_images.max(1);
        self
    }

    /// Input images in provider order: subject first, garment second
    pub fn input_images(&self) -> Vec<String> {
        vec![self.subject_url.clone(), self.garment_url.clone()]
    }
}
