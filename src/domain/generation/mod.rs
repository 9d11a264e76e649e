//! Generation domain - asynchronous image generation jobs

mod image_store;
mod outcome;
mod provider;
mod request;

pub use image_store::ImageStore;
pub use outcome::{GenerationOutcome, TaskState};
pub use provider::GenerationProvider;
pub use request::{GenerationRequest, DEFAULT_NUM_IMAGES};

#[cfg(test)]
pub use provider::MockGenerationProvider;
