//! Card file resolution: JSON or PNG in, normalized record out.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use serde_json::Value;

use super::fields::{self, AVATAR_PATHS, DESCRIPTION_PATHS, NAME_PATHS, TAGS_PATHS};
use super::{CardKind, CardRecord, CardSummary, CharacterDetail};
use crate::assets::AssetResolver;
use crate::error::{read_error, LibraryError, Result};
use crate::png::{read_text_chunks, TextChunk};

/// Chunk keywords searched first, in priority order (case-insensitive).
pub const CARD_KEYWORDS: [&str; 5] = ["chara", "character", "ai_character", "json", "profile"];

/// Sub-path under the data root holding avatars of JSON cards.
const AVATARS_DIR: &str = "avatars";

/// A card file parsed far enough to build any of the record shapes.
struct LoadedCard {
    id: String,
    kind: CardKind,
    fallback_name: String,
    data: Value,
    avatar: Option<String>,
}

impl LoadedCard {
    fn name(&self) -> String {
        fields::lookup_str(&self.data, NAME_PATHS)
            .map(str::to_string)
            .unwrap_or_else(|| self.fallback_name.clone())
    }

    fn record(&self) -> CardRecord {
        CardRecord {
            id: self.id.clone(),
            kind: self.kind,
            name: self.name(),
            tags: fields::lookup_tags(&self.data, TAGS_PATHS).unwrap_or_default(),
            description: fields::lookup_str(&self.data, DESCRIPTION_PATHS)
                .unwrap_or_default()
                .to_string(),
            avatar: self.avatar.clone(),
        }
    }

    fn summary(self) -> CardSummary {
        CardSummary {
            name: self.name(),
            id: self.id,
            kind: self.kind,
            avatar: self.avatar,
        }
    }
}

/// Turns character files into records.
#[derive(Debug, Clone)]
pub struct CardResolver {
    assets: AssetResolver,
}

impl CardResolver {
    pub fn new(assets: AssetResolver) -> Self {
        Self { assets }
    }

    /// Full record for a card file.
    pub fn resolve(&self, path: &Path) -> Result<CardRecord> {
        Ok(self.load(path)?.record())
    }

    /// Record plus the extracted card JSON.
    pub fn resolve_detail(&self, path: &Path) -> Result<CharacterDetail> {
        let loaded = self.load(path)?;
        let card = loaded.record();
        Ok(CharacterDetail {
            card,
            data: loaded.data,
        })
    }

    /// Summary-only mode: id, kind, name and avatar.
    pub fn resolve_summary(&self, path: &Path) -> Result<CardSummary> {
        Ok(self.load(path)?.summary())
    }

    fn load(&self, path: &Path) -> Result<LoadedCard> {
        let kind = CardKind::from_path(path)
            .ok_or_else(|| LibraryError::NotFound(path.display().to_string()))?;
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let fallback_name = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (data, avatar) = match kind {
            CardKind::Json => {
                let content = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
                let data: Value = serde_json::from_str(&content)
                    .map_err(|e| LibraryError::bad_json(path, &e))?;
                let avatar = fields::lookup_str(&data, AVATAR_PATHS)
                    .and_then(|file| self.assets.resolve(&format!("{}/{}", AVATARS_DIR, file)));
                (data, avatar)
            }
            CardKind::Png => {
                let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
                let chunks = read_text_chunks(&bytes);
                let data = embedded_json(&chunks)
                    .ok_or_else(|| LibraryError::NoEmbeddedData(path.display().to_string()))?;
                (data, self.assets.published_url(path))
            }
        };

        Ok(LoadedCard {
            id,
            kind,
            fallback_name,
            data,
            avatar,
        })
    }
}

/// Find the card JSON among a PNG's text chunks.
///
/// Priority keywords are tried in order first; failing that, every chunk is
/// tried in file order. The second pass can pick up unrelated metadata that
/// happens to be valid JSON.
pub fn embedded_json(chunks: &[TextChunk]) -> Option<Value> {
    for keyword in CARD_KEYWORDS {
        let found = chunks
            .iter()
            .filter(|c| c.keyword.eq_ignore_ascii_case(keyword))
            .find_map(|c| parse_payload(&c.text));
        if found.is_some() {
            return found;
        }
    }
    chunks.iter().find_map(|c| parse_payload(&c.text))
}

/// Chunk text as JSON, either verbatim or base64-wrapped.
fn parse_payload(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let decoded = base64::engine::general_purpose::STANDARD.decode(text).ok()?;
    serde_json::from_slice(&decoded).ok()
}
