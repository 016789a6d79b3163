//! Envelope types shared by the library store, the CLI and the editor.

use crate::filters::{
    adjust_filter_group_for_load, adjust_filter_group_for_save, count_active_filters, FilterGroup,
    ScreenerRanges,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who may read a saved screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    /// Visible to its owner only
    #[default]
    Private,
    /// Readable by every user
    Shared,
    /// Built-in screen, readable by every user
    System,
}

impl Permission {
    /// Whether users other than the owner can read the screen.
    pub fn is_public(&self) -> bool {
        matches!(self, Permission::Shared | Permission::System)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Private => "PRIVATE",
            Permission::Shared => "SHARED",
            Permission::System => "SYSTEM",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "PRIVATE" => Ok(Permission::Private),
            "SHARED" => Ok(Permission::Shared),
            "SYSTEM" => Ok(Permission::System),
            other => Err(Error::InvalidOperation(format!(
                "Unknown permission: {}",
                other
            ))),
        }
    }
}

/// A saved screen as exchanged with the editor and the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroupDto {
    /// Record id, assigned by the store on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_group_id: Option<String>,
    /// Display name
    pub filter_group_name: String,
    /// Free-text description
    #[serde(default)]
    pub filter_group_description: String,
    /// Read visibility
    #[serde(default)]
    pub permission: Permission,
    /// Owner, assigned by the store on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Search tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// The criteria tree
    pub filter_group: FilterGroup,
    /// Last write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FilterGroupDto {
    /// Create an unsaved private screen.
    pub fn new(name: &str, filter_group: FilterGroup) -> Self {
        Self {
            filter_group_id: None,
            filter_group_name: name.to_string(),
            filter_group_description: String::new(),
            permission: Permission::Private,
            user_id: None,
            tags: Vec::new(),
            filter_group,
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.filter_group_description = description.to_string();
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `user_id` owns this screen.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// Whether `user_id` may read this screen.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.permission.is_public() || self.is_owned_by(user_id)
    }

    /// Active-filter count of the whole tree.
    pub fn active_filter_count(&self) -> usize {
        count_active_filters(&self.filter_group)
    }

    /// Copy with the tree normalized for persistence.
    pub fn adjusted_for_save(&self, ranges: &ScreenerRanges) -> Self {
        Self {
            filter_group: adjust_filter_group_for_save(&self.filter_group, ranges),
            ..self.clone()
        }
    }

    /// Copy with the tree restored for editing.
    pub fn adjusted_for_load(&self, ranges: &ScreenerRanges) -> Self {
        Self {
            filter_group: adjust_filter_group_for_load(&self.filter_group, ranges),
            ..self.clone()
        }
    }

    /// Check the fields a store requires before accepting a write.
    pub fn validate(&self) -> Result<()> {
        if self.filter_group_name.trim().is_empty() {
            return Err(Error::InvalidFilterGroup(
                "filter group name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}
