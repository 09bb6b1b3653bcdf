//! HTTP surface for the health-records service.
//!
//! Handlers translate JSON requests into `healthrec_core` calls and core
//! errors into HTTP statuses. No business rule lives here.

pub mod app;
pub mod config;
pub mod error;
pub mod requests;
pub mod routes;
pub mod state;

pub use app::build_router;
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use state::AppState;
