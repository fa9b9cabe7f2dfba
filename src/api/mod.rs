//! API layer - HTTP endpoint handlers.

mod health;
mod routes;
mod send;

pub use health::{health, HealthResponse};
pub use routes::{api_routes, method_not_allowed, not_found};
pub use send::{send, SendResponse};
