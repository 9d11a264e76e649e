//! Usage log domain - audit trail of try-on attempts
//!
//! Each attempt is written as a pending entry before the provider is
//! called and finalized exactly once to a terminal status. The entries
//! are also the basis of the rolling per-IP rate-limit window.

mod entity;
mod metadata;
mod repository;

pub use entity::{UsageLogEntry, UsageLogId, UsageStatus};
pub use metadata::UsageMetadata;
pub use repository::UsageLogRepository;

#[cfg(test)]
pub use repository::mock;
