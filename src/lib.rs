//! # tavern-companion
//!
//! Read-only access to a SillyTavern user data directory (character cards,
//! lorebooks, group chats and personas) plus a small chat relay for the
//! browser extension, served over HTTP.
//!
//! Character cards are plain JSON files or PNG images carrying the card in a
//! text chunk; [`png`] extracts those chunks and [`cards`] turns them into
//! normalized records.

pub mod assets;
pub mod cards;
pub mod config;
pub mod error;
pub mod library;
pub mod lorebook;
pub mod png;
pub mod relay;
pub mod server;

pub use assets::AssetResolver;
pub use cards::{CardKind, CardRecord, CardSummary, CharacterDetail};
pub use config::ServerConfig;
pub use error::{LibraryError, Result};
pub use library::Library;
pub use relay::ChatRelay;

/// Crate version, reported by `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
