//! API middleware components

pub mod client_ip;
pub mod logging;
pub mod metrics;

pub use client_ip::ClientIp;
pub use logging::{logging_middleware, truncate_for_log};
pub use metrics::metrics_middleware;
