// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles non-empty builder lists and optional user config directories.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::PathBuf;

use super::BuilderEntry;

pub fn deserialize_builders<'de, D>(deserializer: D) -> Result<NonEmpty<BuilderEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries: Vec<BuilderEntry> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(entries)
        .ok_or_else(|| serde::de::Error::custom("at least one builder is required"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DirOrSwitch {
    Switch(bool),
    Dir(PathBuf),
}

/// `false` disables a directory, `true` keeps the default, a path overrides it.
///
/// Returns `Some(None)` for "disabled", `None` for "use default".
pub fn deserialize_optional_dir<'de, D>(deserializer: D) -> Result<Option<Option<PathBuf>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<DirOrSwitch>::deserialize(deserializer)? {
        None | Some(DirOrSwitch::Switch(true)) => None,
        Some(DirOrSwitch::Switch(false)) => Some(None),
        Some(DirOrSwitch::Dir(dir)) => Some(Some(dir)),
    })
}
