//! HTTP server for the SillyTavern companion.
//!
//! Exposes the character library read-only and relays chat between the
//! browser extension and the companion client.
//!
//! # Endpoints
//!
//! - `GET  /health`     : Liveness probe
//! - `GET  /characters`, `/lorebooks`, `/groups`, `/personas`: Library views
//! - `POST /set-chat`, `/queue-message`: Relay writes
//! - `GET  /get-chat`, `/queued-messages`: Relay reads
//! - `GET  /assets/*`   : Static files under the data root

pub mod routes;

pub use routes::{app_router, AppState};
