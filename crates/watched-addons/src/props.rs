//! Validation and normalization of worker addon properties.

use std::collections::HashSet;

use serde::Deserialize;
use serde::de::IgnoredAny;
use thiserror::Error;

use crate::{ActionType, AddonResource, AddonType, WorkerAddonProps};

/// Version assumed when the addon does not declare one.
pub const DEFAULT_ADDON_VERSION: &str = "0.0.0";

/// Unvalidated addon properties as supplied by addon authors.
///
/// Every field is optional; [`validate_worker_addon_props`] fills defaults
/// and rejects anything structurally invalid.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkerAddonProps {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// Accepted in any shape and discarded: the type is always forced to `worker`.
    #[serde(default, rename = "type")]
    pub addon_type: Option<IgnoredAny>,
    #[serde(default)]
    pub resources: Option<Vec<RawAddonResource>>,
}

/// Unvalidated resource declaration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddonResource {
    #[serde(default)]
    pub item_types: Option<Vec<String>>,
    #[serde(default)]
    pub actions: Option<Vec<ActionType>>,
}

impl RawWorkerAddonProps {
    /// Raw properties with only an id set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Declare a resource serving `item_types` with `actions`.
    pub fn with_resource(mut self, item_types: &[&str], actions: &[ActionType]) -> Self {
        self.resources.get_or_insert_with(Vec::new).push(RawAddonResource {
            item_types: Some(item_types.iter().map(|t| t.to_string()).collect()),
            actions: Some(actions.to_vec()),
        });
        self
    }

    /// Parse raw properties from JSON, e.g. an addon's manifest file.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))
    }
}

/// Structural problems found in raw addon properties.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed addon properties: {0}")]
    Malformed(String),

    #[error("Addon id is required")]
    MissingId,

    #[error("Addon id is invalid: {0}")]
    InvalidId(String),

    #[error("Addon version is invalid: {0} (expected major.minor.patch[-pre][+build])")]
    InvalidVersion(String),

    #[error("Resource {index} declares no actions")]
    MissingActions { index: usize },

    #[error("Resource {index} declares action \"{action}\" more than once")]
    DuplicateAction { index: usize, action: ActionType },

    #[error("Resource {index} contains an empty item type")]
    EmptyItemType { index: usize },
}

/// Validate raw properties and normalize them into [`WorkerAddonProps`].
///
/// The addon type is forced to [`AddonType::Worker`] regardless of input.
pub fn validate_worker_addon_props(
    raw: RawWorkerAddonProps,
) -> Result<WorkerAddonProps, ValidationError> {
    let id = non_blank(raw.id).ok_or(ValidationError::MissingId)?;
    if !is_valid_addon_id(&id) {
        return Err(ValidationError::InvalidId(id));
    }

    let version =
        non_blank(raw.version).unwrap_or_else(|| DEFAULT_ADDON_VERSION.to_string());
    if !is_semver(&version) {
        return Err(ValidationError::InvalidVersion(version));
    }

    let resources = raw
        .resources
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, r)| validate_resource(index, r))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WorkerAddonProps {
        name: non_blank(raw.name).unwrap_or_else(|| id.clone()),
        id,
        version,
        description: non_blank(raw.description),
        homepage: non_blank(raw.homepage),
        addon_type: AddonType::Worker,
        resources,
    })
}

fn validate_resource(
    index: usize,
    raw: RawAddonResource,
) -> Result<AddonResource, ValidationError> {
    let actions = raw.actions.unwrap_or_default();
    if actions.is_empty() {
        return Err(ValidationError::MissingActions { index });
    }

    let mut seen = HashSet::new();
    for action in &actions {
        if !seen.insert(*action) {
            return Err(ValidationError::DuplicateAction {
                index,
                action: *action,
            });
        }
    }

    let item_types = raw.item_types.unwrap_or_default();
    if item_types.iter().any(|t| t.trim().is_empty()) {
        return Err(ValidationError::EmptyItemType { index });
    }

    Ok(AddonResource {
        item_types,
        actions,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lowercase ascii segments joined by single `.`, `-` or `_`.
fn is_valid_addon_id(value: &str) -> bool {
    let mut prev_separator = true;
    for c in value.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
        } else if matches!(c, '.' | '-' | '_') && !prev_separator {
            prev_separator = true;
        } else {
            return false;
        }
    }
    !prev_separator
}

/// `major.minor.patch` with optional `-pre` and `+build` dot-separated
/// alphanumeric identifiers.
fn is_semver(value: &str) -> bool {
    let (rest, build) = match value.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (value, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        && pre.is_none_or(is_identifier_list)
        && build.is_none_or(is_identifier_list)
}

fn is_identifier_list(value: &str) -> bool {
    value.split('.').all(|id| {
        !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
