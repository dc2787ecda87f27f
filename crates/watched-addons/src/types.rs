//! Core types for worker addons and their actions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identifier of an action an addon can perform.
///
/// The wire form is the lowercase name, e.g. `directory`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Browse a directory of items.
    Directory,
    /// Fetch details of a single item.
    Item,
    /// List playable sources of an item.
    Source,
    /// List subtitles of an item.
    Subtitle,
    /// Resolve a source into a playable URL.
    Resolve,
}

impl ActionType {
    /// All known action types, in declaration order.
    pub const ALL: [ActionType; 5] = [
        ActionType::Directory,
        ActionType::Item,
        ActionType::Source,
        ActionType::Subtitle,
        ActionType::Resolve,
    ];

    /// Get the wire name of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Item => "item",
            Self::Source => "source",
            Self::Subtitle => "subtitle",
            Self::Resolve => "resolve",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown action: {0}")]
pub struct UnknownActionType(pub String);

impl FromStr for ActionType {
    type Err = UnknownActionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownActionType(s.to_string()))
    }
}

/// Kind of addon. Addons built with this crate are always workers.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AddonType {
    #[default]
    Worker,
}

/// A resource an addon declares, with the actions it supports for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddonResource {
    /// Item types served by this resource (e.g. `movie`, `series`).
    #[serde(default)]
    pub item_types: Vec<String>,

    /// Actions the addon implements for this resource.
    pub actions: Vec<ActionType>,
}

/// Validated descriptor of a worker addon.
///
/// Only produced by [`crate::validate_worker_addon_props`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WorkerAddonProps {
    pub id: String,
    pub name: String,
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(rename = "type")]
    pub addon_type: AddonType,

    pub resources: Vec<AddonResource>,
}

impl WorkerAddonProps {
    /// Union of all actions declared across resources, sorted and deduplicated.
    pub fn declared_actions(&self) -> Vec<ActionType> {
        let mut actions: Vec<ActionType> = self
            .resources
            .iter()
            .flat_map(|r| r.actions.iter().copied())
            .collect();
        actions.sort();
        actions.dedup();
        actions
    }
}

/// Input of the `directory` action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRequest {
    /// Directory to browse. `None` is the addon's root directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[ts(type = "Record<string, unknown>")]
    pub filter: BTreeMap<String, serde_json::Value>,

    /// Opaque pagination cursor from a previous [`DirectoryResponse`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown")]
    pub cursor: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Output of the `directory` action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryResponse {
    pub items: Vec<DirectoryItem>,

    /// Cursor for the next page, `None` on the last page.
    #[serde(default)]
    #[ts(type = "unknown")]
    pub next_cursor: Option<serde_json::Value>,
}

/// One entry of a [`DirectoryResponse`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryItem {
    pub id: String,

    #[serde(rename = "type")]
    pub item_type: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}
