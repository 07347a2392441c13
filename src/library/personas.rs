//! User persona names from `settings.json`.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::{LibraryError, Result};

use super::{read_json, Library};

impl Library {
    /// Distinct, non-empty persona names from `power_user.personas`, sorted.
    ///
    /// A missing settings file means no personas.
    pub fn list_personas(&self) -> Result<Vec<String>> {
        let settings = match read_json(&self.settings_path()) {
            Ok(settings) => settings,
            Err(LibraryError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let names: BTreeSet<String> = settings
            .pointer("/power_user/personas")
            .and_then(Value::as_object)
            .map(|personas| {
                personas
                    .values()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names.into_iter().collect())
    }
}
