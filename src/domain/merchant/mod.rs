//! Merchant domain - store owners who own credits and a per-IP quota

mod entity;
mod repository;

pub use entity::{MerchantId, MerchantProfile, DEFAULT_DAILY_QUOTA};
pub use repository::MerchantRepository;

#[cfg(test)]
pub use repository::mock;
