//! Character cards stored as plain JSON or embedded in PNG images.

pub mod fields;
pub mod resolver;

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

pub use resolver::{embedded_json, CardResolver, CARD_KEYWORDS};

/// Storage format of a card file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Json,
    Png,
}

impl CardKind {
    /// Kind from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(CardKind::Json)
        } else if ext.eq_ignore_ascii_case("png") {
            Some(CardKind::Png)
        } else {
            None
        }
    }
}

/// Normalized character record as listed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRecord {
    pub id: String,
    pub kind: CardKind,
    pub name: String,
    pub tags: Vec<String>,
    pub description: String,
    pub avatar: Option<String>,
}

/// Reduced record used for group members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardSummary {
    pub id: String,
    pub kind: CardKind,
    pub name: String,
    pub avatar: Option<String>,
}

/// A card record plus the full card JSON it was extracted from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterDetail {
    #[serde(flatten)]
    pub card: CardRecord,
    pub data: Value,
}
