//! HTTP and WebSocket surface.
//!
//! - `GET /` serves the browser client
//! - `GET /ws` upgrades to the relay socket
//! - `GET /download/{filename}` serves announced files
//! - `GET /health` reports liveness

mod download;
mod gateway;
mod routes;
pub mod types;

pub use download::DownloadError;
pub use routes::{router, serve, AppState};
