//! API layer - HTTP endpoints and middleware

pub mod auth;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod tryon;
pub mod types;
pub mod widget;

pub use router::{create_router, create_router_with_state};
pub use state::AppState;
