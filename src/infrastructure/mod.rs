//! Infrastructure layer - External service implementations

pub mod email;
pub mod image_store;
pub mod logging;
pub mod observability;
pub mod provider;
pub mod services;
pub mod storage;
