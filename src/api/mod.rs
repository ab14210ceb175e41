//! HTTP API layer.
//!
//! Exposes the portal as JSON endpoints under `/api/`. Protected routes
//! sit behind bearer-token auth; tenant resolution, the public catalog
//! and sign-up/sign-in are open.
//!
//! The router is composable — `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod password;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ApiSession};
pub use types::ApiContext;
