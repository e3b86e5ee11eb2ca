//! HTTP surface of the triage service.
//!
//! The router is composable: `triage_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::triage_router;
pub use server::{serve, serve_until_ctrl_c};
pub use types::AppState;
