//! Group chats: listing, lookup and member resolution.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::assets::contain;
use crate::cards::CardSummary;
use crate::error::{LibraryError, Result};

use super::{compare_names, has_json_extension, read_dir_sorted, read_json, string_like, Library};

/// A group as listed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub member_ids: Vec<String>,
    pub disabled_ids: BTreeSet<String>,
    pub member_count: usize,
    pub disabled_count: usize,
    pub avatar_url: Option<String>,
    pub allow_self_responses: bool,
    pub activation_strategy: Option<Value>,
    pub generation_mode: Option<Value>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    #[serde(flatten)]
    pub card: CardSummary,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: GroupSummary,
    pub members: Vec<GroupMember>,
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| string_like(Some(v))).collect())
        .unwrap_or_default()
}

fn present(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

impl Library {
    fn group_from_value(&self, path: &Path, group: &Value) -> GroupSummary {
        let id = string_like(group.get("id")).unwrap_or_else(|| {
            path.file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let name = group
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());
        let member_ids = string_list(group.get("members"));
        let disabled_ids: BTreeSet<String> =
            string_list(group.get("disabled_members")).into_iter().collect();
        let avatar_url = group
            .get("avatar_url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .and_then(|url| self.assets.resolve(url));

        GroupSummary {
            name,
            member_count: member_ids.len(),
            disabled_count: disabled_ids.len(),
            member_ids,
            disabled_ids,
            avatar_url,
            allow_self_responses: group
                .get("allow_self_responses")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            activation_strategy: present(group.get("activation_strategy")),
            generation_mode: present(group.get("generation_mode")),
            chat_id: string_like(group.get("chat_id")),
            id,
        }
    }

    /// Every readable group file, sorted by name then id.
    pub fn list_groups(&self) -> Result<Vec<GroupSummary>> {
        let mut groups = Vec::new();
        for path in read_dir_sorted(&self.groups_dir())? {
            if !path.is_file() || !has_json_extension(&path) {
                continue;
            }
            match read_json(&path) {
                Ok(value) => groups.push(self.group_from_value(&path, &value)),
                Err(e) => log::warn!("Skipping group {:?}: {}", path, e),
            }
        }
        groups.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    /// Find a group by file name, falling back to its internal `id` field.
    fn find_group(&self, id: &str) -> Result<GroupSummary> {
        let dir = self.groups_dir();
        let file_name = if has_json_extension(Path::new(id)) {
            id.to_string()
        } else {
            format!("{}.json", id)
        };
        let direct = contain(&dir, &file_name)?;
        if direct.is_file() {
            let value = read_json(&direct)?;
            return Ok(self.group_from_value(&direct, &value));
        }

        for path in read_dir_sorted(&dir)? {
            if !path.is_file() || !has_json_extension(&path) {
                continue;
            }
            let value = match read_json(&path) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Skipping group {:?}: {}", path, e);
                    continue;
                }
            };
            if string_like(value.get("id")).as_deref() == Some(id) {
                return Ok(self.group_from_value(&path, &value));
            }
        }
        Err(LibraryError::NotFound(id.to_string()))
    }

    /// One group with its members resolved to card summaries.
    ///
    /// Members that cannot be resolved are dropped.
    pub fn get_group(&self, id: &str) -> Result<GroupDetail> {
        let group = self.find_group(id)?;
        let characters = self.characters_dir();
        let disabled: BTreeSet<String> =
            group.disabled_ids.iter().map(|d| d.to_lowercase()).collect();

        let mut members = Vec::new();
        for member_id in &group.member_ids {
            let card = contain(&characters, member_id)
                .and_then(|path| self.cards.resolve_summary(&path));
            match card {
                Ok(card) => members.push(GroupMember {
                    disabled: disabled.contains(&member_id.to_lowercase()),
                    card,
                }),
                Err(e) => log::warn!("Dropping member {} of group {}: {}", member_id, group.id, e),
            }
        }

        Ok(GroupDetail { group, members })
    }
}
