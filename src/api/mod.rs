pub mod handlers;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod template;
pub mod webhook;

pub use routes::{api_v1_routes, public_routes};
