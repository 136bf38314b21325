//! HTTP request handlers.

pub mod health;
pub mod messages;
pub mod metrics;

pub use health::{health_check, readiness_check};
pub use messages::{create_message, list_messages};
pub use metrics::metrics_handler;
