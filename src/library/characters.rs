//! Character listing and lookup.

use crate::assets::contain;
use crate::cards::{CardKind, CardRecord, CharacterDetail};
use crate::error::Result;

use super::{compare_names, read_dir_sorted, Library};

impl Library {
    /// Every resolvable card under `characters/`, sorted by name.
    pub fn list_characters(&self) -> Result<Vec<CardRecord>> {
        let mut records = Vec::new();
        for path in read_dir_sorted(&self.characters_dir())? {
            if !path.is_file() || CardKind::from_path(&path).is_none() {
                continue;
            }
            match self.cards.resolve(&path) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping character {:?}: {}", path, e),
            }
        }
        records.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    /// One card by file name, e.g. `bob.json` or `Ann.png`.
    pub fn get_character(&self, id: &str) -> Result<CharacterDetail> {
        let path = contain(&self.characters_dir(), id)?;
        self.cards.resolve_detail(&path)
    }
}
