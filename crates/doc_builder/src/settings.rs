//! Builder settings
//!
//! Settings are plain serde structs so they can be kept next to a batch
//! job as JSON.

use crate::error::BuildResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Options that apply to a whole build
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuilderSettings {
    /// Give every style name a single id across all sources before
    /// assembly, renaming conflicting ids
    pub normalize_style_ids: bool,
    /// Item ids (`ds:itemID`) of custom XML parts to carry over from the
    /// first source even when no content control binds to them
    pub custom_xml_guids: BTreeSet<String>,
}

impl BuilderSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> BuildResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> BuildResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> BuildResult<Self> {
        let content = std::fs::read_to_string(path).map_err(store::StoreError::from)?;
        Self::from_json(&content)
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> BuildResult<()> {
        std::fs::write(path, self.to_json()?).map_err(store::StoreError::from)?;
        Ok(())
    }

    /// Whether a custom XML item id was requested, ignoring case and braces
    pub fn wants_custom_xml(&self, item_id: &str) -> bool {
        let wanted = normalize_guid(item_id);
        self.custom_xml_guids.iter().any(|g| normalize_guid(g) == wanted)
    }
}

fn normalize_guid(guid: &str) -> String {
    guid.trim_matches(|c| c == '{' || c == '}').to_lowercase()
}
