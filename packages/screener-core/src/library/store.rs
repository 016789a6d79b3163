//! Saved-screen persistence.

use crate::filters::ScreenerRanges;
use crate::types::{FilterGroupDto, Permission};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Version written to the library file.
pub const LIBRARY_FORMAT_VERSION: u32 = 1;

/// Owner assigned to imported screens that carry no user id.
pub const SYSTEM_USER: &str = "system";

/// One saved screen as written to disk.
///
/// `payload` is the JSON text of the save-normalized filter group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterGroupRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permission: Permission,
    pub user_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryFile {
    version: u32,
    #[serde(default)]
    records: Vec<FilterGroupRecord>,
}

#[derive(Debug, Clone)]
struct StoredScreen {
    dto: FilterGroupDto,
    created_at: DateTime<Utc>,
}

impl StoredScreen {
    fn id(&self) -> &str {
        self.dto.filter_group_id.as_deref().unwrap_or_default()
    }

    fn from_record(record: FilterGroupRecord) -> Result<Self> {
        let filter_group = serde_json::from_str(&record.payload)?;
        Ok(Self {
            dto: FilterGroupDto {
                filter_group_id: Some(record.id),
                filter_group_name: record.name,
                filter_group_description: record.description,
                permission: record.permission,
                user_id: Some(record.user_id),
                tags: record.tags,
                filter_group,
                updated_at: Some(record.updated_at),
            },
            created_at: record.created_at,
        })
    }

    fn to_record(&self) -> Result<FilterGroupRecord> {
        Ok(FilterGroupRecord {
            id: self.id().to_string(),
            name: self.dto.filter_group_name.clone(),
            description: self.dto.filter_group_description.clone(),
            permission: self.dto.permission,
            user_id: self.dto.user_id.clone().unwrap_or_else(|| SYSTEM_USER.to_string()),
            tags: self.dto.tags.clone(),
            payload: serde_json::to_string(&self.dto.filter_group)?,
            created_at: self.created_at,
            updated_at: self.dto.updated_at.unwrap_or(self.created_at),
        })
    }
}

/// Trim, lowercase and de-duplicate tags, dropping empty ones.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Store of saved screens persisted to a JSON file.
///
/// Screens are held in save-normalized form; use
/// [`load_for_editing`](Self::load_for_editing) to get concrete bounds back.
#[derive(Debug)]
pub struct FilterLibrary {
    /// Path to the library JSON file
    path: PathBuf,
    /// In-memory screens
    screens: Vec<StoredScreen>,
    /// Set when the file exists but could not be read; saving is refused
    load_failed: bool,
}

impl FilterLibrary {
    /// Create a library backed by the default path.
    ///
    /// Default path: `~/.traderslab/screener/filter_groups.json`
    /// Can be overridden with `SCREENER_LIBRARY_FILE` environment variable.
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    /// Create a library with a custom path.
    ///
    /// An unreadable file starts an empty library that refuses to save, so
    /// the file on disk is never replaced by the empty copy.
    pub fn with_path(path: PathBuf) -> Self {
        match Self::load_from_path(&path) {
            Ok(screens) => Self {
                path,
                screens,
                load_failed: false,
            },
            Err(e) => {
                tracing::warn!("Could not read filter library {}: {}", path.display(), e);
                Self {
                    path,
                    screens: Vec::new(),
                    load_failed: true,
                }
            }
        }
    }

    /// Open a library, failing if the file exists but cannot be read.
    pub fn open(path: PathBuf) -> Result<Self> {
        let screens = Self::load_from_path(&path)?;
        Ok(Self {
            path,
            screens,
            load_failed: false,
        })
    }

    /// Create an in-memory library (no persistence).
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            screens: Vec::new(),
            load_failed: false,
        }
    }

    /// Get the default library file path.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("SCREENER_LIBRARY_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".traderslab/screener/filter_groups.json"))
            .unwrap_or_else(|| PathBuf::from("filter_groups.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_path(path: &Path) -> Result<Vec<StoredScreen>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)?;
        let data: serde_json::Value = serde_json::from_str(&content)?;

        // Exported screens: a bare list of DTOs
        if data.is_array() {
            let dtos: Vec<FilterGroupDto> = serde_json::from_value(data)?;
            tracing::warn!(
                "Importing {} screens from legacy list format in {}",
                dtos.len(),
                path.display()
            );
            return Ok(dtos.into_iter().map(Self::import).collect());
        }

        let file: LibraryFile = serde_json::from_value(data)?;
        if file.version > LIBRARY_FORMAT_VERSION {
            return Err(Error::InvalidOperation(format!(
                "Filter library version {} is newer than supported version {}",
                file.version, LIBRARY_FORMAT_VERSION
            )));
        }

        file.records
            .into_iter()
            .map(StoredScreen::from_record)
            .collect()
    }

    fn import(mut dto: FilterGroupDto) -> StoredScreen {
        let now = Utc::now();
        if dto.filter_group_id.is_none() {
            dto.filter_group_id = Some(Uuid::new_v4().to_string());
        }
        if dto.user_id.is_none() {
            dto.user_id = Some(SYSTEM_USER.to_string());
        }
        dto.tags = normalize_tags(&dto.tags);
        let created_at = dto.updated_at.unwrap_or(now);
        StoredScreen { dto, created_at }
    }

    /// Write the library to disk.
    pub fn save(&self) -> Result<()> {
        // Skip if in-memory only
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }

        if self.load_failed {
            return Err(Error::InvalidOperation(format!(
                "Filter library {} could not be read; refusing to overwrite it",
                self.path.display()
            )));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = LibraryFile {
            version: LIBRARY_FORMAT_VERSION,
            records: self
                .screens
                .iter()
                .map(StoredScreen::to_record)
                .collect::<Result<Vec<_>>>()?,
        };

        let content = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, content)?;
        tracing::debug!("Saved {} screens to {}", self.screens.len(), self.path.display());
        Ok(())
    }

    /// Reload the library from disk.
    pub fn reload(&mut self) -> Result<()> {
        self.screens = Self::load_from_path(&self.path)?;
        self.load_failed = false;
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.screens
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| Error::FilterGroupNotFound(id.to_string()))
    }

    /// Store a new screen owned by `user_id`.
    ///
    /// The tree is save-normalized against `ranges`. Any id or owner on `dto`
    /// is replaced. Returns the stored form.
    pub fn create(
        &mut self,
        user_id: &str,
        dto: &FilterGroupDto,
        ranges: &ScreenerRanges,
    ) -> Result<FilterGroupDto> {
        dto.validate()?;

        let now = Utc::now();
        let mut stored = dto.adjusted_for_save(ranges);
        stored.filter_group_id = Some(Uuid::new_v4().to_string());
        stored.user_id = Some(user_id.to_string());
        stored.tags = normalize_tags(&dto.tags);
        stored.updated_at = Some(now);

        tracing::debug!(
            "Created screen {} ({}) for {}",
            stored.filter_group_name,
            stored.filter_group_id.as_deref().unwrap_or_default(),
            user_id
        );

        self.screens.push(StoredScreen {
            dto: stored.clone(),
            created_at: now,
        });
        Ok(stored)
    }

    /// Replace an existing screen. Only its owner may update it.
    ///
    /// The id comes from `dto.filter_group_id`; ownership and creation time
    /// are kept from the stored screen.
    pub fn update(
        &mut self,
        user_id: &str,
        dto: &FilterGroupDto,
        ranges: &ScreenerRanges,
    ) -> Result<FilterGroupDto> {
        let id = dto.filter_group_id.as_deref().ok_or_else(|| {
            Error::InvalidOperation("Cannot update a screen without an id".to_string())
        })?;
        let idx = self.position(id)?;

        let existing = &self.screens[idx];
        if !existing.dto.is_owned_by(user_id) {
            return Err(Error::PermissionDenied(format!(
                "{} does not own screen {}",
                user_id, id
            )));
        }
        dto.validate()?;

        let mut stored = dto.adjusted_for_save(ranges);
        stored.user_id = existing.dto.user_id.clone();
        stored.tags = normalize_tags(&dto.tags);
        stored.updated_at = Some(Utc::now());

        tracing::debug!("Updated screen {} for {}", id, user_id);
        self.screens[idx].dto = stored.clone();
        Ok(stored)
    }

    /// Remove a screen. Only its owner may delete it.
    ///
    /// Returns the removed screen.
    pub fn delete(&mut self, user_id: &str, id: &str) -> Result<FilterGroupDto> {
        let idx = self.position(id)?;
        if !self.screens[idx].dto.is_owned_by(user_id) {
            return Err(Error::PermissionDenied(format!(
                "{} does not own screen {}",
                user_id, id
            )));
        }

        tracing::debug!("Deleted screen {} for {}", id, user_id);
        Ok(self.screens.remove(idx).dto)
    }

    /// Find a screen by id, in stored form, regardless of visibility.
    pub fn get(&self, id: &str) -> Option<&FilterGroupDto> {
        self.screens.iter().find(|s| s.id() == id).map(|s| &s.dto)
    }

    /// Find a screen `user_id` is allowed to read.
    pub fn get_for_user(&self, user_id: &str, id: &str) -> Result<&FilterGroupDto> {
        let dto = &self.screens[self.position(id)?].dto;
        if !dto.is_visible_to(user_id) {
            return Err(Error::PermissionDenied(format!(
                "Screen {} is private to its owner",
                id
            )));
        }
        Ok(dto)
    }

    /// Read a screen with its ranges restored against `ranges`, ready for
    /// the editor.
    pub fn load_for_editing(
        &self,
        user_id: &str,
        id: &str,
        ranges: &ScreenerRanges,
    ) -> Result<FilterGroupDto> {
        Ok(self.get_for_user(user_id, id)?.adjusted_for_load(ranges))
    }

    /// Creation time of a stored screen.
    pub fn created_at(&self, id: &str) -> Option<DateTime<Utc>> {
        self.screens.iter().find(|s| s.id() == id).map(|s| s.created_at)
    }

    /// Screens owned by `user_id`.
    pub fn by_owner(&self, user_id: &str) -> Vec<&FilterGroupDto> {
        self.filter(|dto| dto.is_owned_by(user_id))
    }

    /// Screens carrying `tag` (case-insensitive).
    pub fn by_tag(&self, tag: &str) -> Vec<&FilterGroupDto> {
        let tag = tag.trim().to_lowercase();
        self.filter(|dto| dto.tags.iter().any(|t| *t == tag))
    }

    /// Screens readable by every user.
    pub fn shared(&self) -> Vec<&FilterGroupDto> {
        self.filter(|dto| dto.permission.is_public())
    }

    /// Screens `user_id` may read: their own plus shared and system ones.
    pub fn visible_to(&self, user_id: &str) -> Vec<&FilterGroupDto> {
        self.filter(|dto| dto.is_visible_to(user_id))
    }

    /// All screens in insertion order.
    pub fn all(&self) -> Vec<&FilterGroupDto> {
        self.filter(|_| true)
    }

    fn filter<F>(&self, predicate: F) -> Vec<&FilterGroupDto>
    where
        F: Fn(&FilterGroupDto) -> bool,
    {
        self.screens
            .iter()
            .map(|s| &s.dto)
            .filter(|dto| predicate(dto))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

impl Default for FilterLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterCriteria, FilterGroup, FilterKey, RangeValue};
    use tempfile::tempdir;

    fn ranges() -> ScreenerRanges {
        ScreenerRanges::new()
            .with(FilterKey::PriceRange, 1.0, 500.0)
            .with(FilterKey::VolumeRange, 0.0, 5_000_000.0)
    }

    fn screen(name: &str) -> FilterGroupDto {
        let criteria = FilterCriteria::new()
            .with_range(FilterKey::PriceRange, 1.0, 500.0)
            .unwrap()
            .with_range(FilterKey::VolumeRange, 100.0, 2000.0)
            .unwrap();
        FilterGroupDto::new(name, FilterGroup::and().with_criteria(criteria))
    }

    #[test]
    fn test_create_assigns_id_owner_and_normalizes() {
        let mut library = FilterLibrary::in_memory();
        let stored = library.create("alice", &screen("Liquid"), &ranges()).unwrap();

        assert!(stored.filter_group_id.is_some());
        assert_eq!(stored.user_id.as_deref(), Some("alice"));
        assert!(stored.updated_at.is_some());

        let leaf = stored.filter_group.as_simple().unwrap();
        assert_eq!(leaf.range(FilterKey::PriceRange), Some(&RangeValue::unbounded()));
        assert_eq!(
            leaf.range(FilterKey::VolumeRange),
            Some(&RangeValue::new(100.0, 2000.0))
        );
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let mut library = FilterLibrary::in_memory();
        let result = library.create("alice", &screen(""), &ranges());
        assert!(matches!(result, Err(Error::InvalidFilterGroup(_))));
        assert!(library.is_empty());
    }

    #[test]
    fn test_load_for_editing_restores_bounds() {
        let mut library = FilterLibrary::in_memory();
        let original = screen("Liquid");
        let stored = library.create("alice", &original, &ranges()).unwrap();
        let id = stored.filter_group_id.unwrap();

        let loaded = library.load_for_editing("alice", &id, &ranges()).unwrap();
        assert_eq!(loaded.filter_group, original.filter_group);
    }

    #[test]
    fn test_update_requires_owner() {
        let mut library = FilterLibrary::in_memory();
        let mut stored = library.create("alice", &screen("Liquid"), &ranges()).unwrap();
        stored.filter_group_name = "Renamed".to_string();

        let result = library.update("bob", &stored, &ranges());
        assert!(matches!(result, Err(Error::PermissionDenied(_))));

        let updated = library.update("alice", &stored, &ranges()).unwrap();
        assert_eq!(updated.filter_group_name, "Renamed");
        assert_eq!(updated.user_id.as_deref(), Some("alice"));
    }

    #[test]
    fn test_update_unknown_id() {
        let mut library = FilterLibrary::in_memory();
        let mut dto = screen("Ghost");
        dto.filter_group_id = Some("missing".to_string());
        let result = library.update("alice", &dto, &ranges());
        assert!(matches!(result, Err(Error::FilterGroupNotFound(_))));

        dto.filter_group_id = None;
        let result = library.update("alice", &dto, &ranges());
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_delete_requires_owner() {
        let mut library = FilterLibrary::in_memory();
        let stored = library
            .create(
                "alice",
                &screen("Shared").with_permission(Permission::Shared),
                &ranges(),
            )
            .unwrap();
        let id = stored.filter_group_id.unwrap();

        assert!(matches!(
            library.delete("bob", &id),
            Err(Error::PermissionDenied(_))
        ));
        let removed = library.delete("alice", &id).unwrap();
        assert_eq!(removed.filter_group_name, "Shared");
        assert!(library.is_empty());
    }

    #[test]
    fn test_visibility_queries() {
        let mut library = FilterLibrary::in_memory();
        let private = library.create("alice", &screen("Private"), &ranges()).unwrap();
        library
            .create(
                "alice",
                &screen("Shared").with_permission(Permission::Shared),
                &ranges(),
            )
            .unwrap();
        library
            .create(
                "admin",
                &screen("Preset").with_permission(Permission::System),
                &ranges(),
            )
            .unwrap();

        assert_eq!(library.by_owner("alice").len(), 2);
        assert_eq!(library.shared().len(), 2);
        assert_eq!(library.visible_to("bob").len(), 2);
        assert_eq!(library.visible_to("alice").len(), 3);

        let id = private.filter_group_id.unwrap();
        assert!(library.get_for_user("alice", &id).is_ok());
        assert!(matches!(
            library.get_for_user("bob", &id),
            Err(Error::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_tags_normalized_and_searchable() {
        let mut library = FilterLibrary::in_memory();
        let stored = library
            .create(
                "alice",
                &screen("Tagged").with_tags([" Momentum ", "momentum", "", "Swing"]),
                &ranges(),
            )
            .unwrap();

        assert_eq!(stored.tags, vec!["momentum", "swing"]);
        assert_eq!(library.by_tag("MOMENTUM").len(), 1);
        assert!(library.by_tag("value").is_empty());
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/filter_groups.json");

        let id = {
            let mut library = FilterLibrary::with_path(path.clone());
            let stored = library.create("alice", &screen("Liquid"), &ranges()).unwrap();
            library.save().unwrap();
            stored.filter_group_id.unwrap()
        };

        let library = FilterLibrary::open(path.clone()).unwrap();
        assert_eq!(library.len(), 1);
        let loaded = library.load_for_editing("alice", &id, &ranges()).unwrap();
        assert_eq!(loaded.filter_group, screen("Liquid").filter_group);
        assert!(library.created_at(&id).is_some());

        // payload column holds the normalized tree as JSON text
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        let payload = raw["records"][0]["payload"].as_str().unwrap();
        assert!(payload.contains("\"priceRange\":[null,null]"));
    }

    #[test]
    fn test_legacy_list_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filter_groups.json");
        fs::write(
            &path,
            r#"[{
                "filterGroupName": "Old",
                "permission": "SYSTEM",
                "tags": ["Classic"],
                "filterGroup": {"operator": "AND", "filters": [
                    {"priceRange": [-9007199254740991, 1.7976931348623157e308]}
                ]}
            }]"#,
        )
        .unwrap();

        let library = FilterLibrary::open(path).unwrap();
        let dto = library.all()[0];
        assert_eq!(dto.user_id.as_deref(), Some(SYSTEM_USER));
        assert!(dto.filter_group_id.is_some());
        assert_eq!(dto.tags, vec!["classic"]);
        assert_eq!(
            dto.filter_group.as_simple().unwrap().range(FilterKey::PriceRange),
            Some(&RangeValue::unbounded())
        );
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filter_groups.json");
        fs::write(&path, r#"{"version": 99, "records": []}"#).unwrap();

        assert!(matches!(
            FilterLibrary::open(path.clone()),
            Err(Error::InvalidOperation(_))
        ));
        assert!(FilterLibrary::with_path(path).is_empty());
    }

    fn write_two_screens(path: &Path) {
        let mut library = FilterLibrary::with_path(path.to_path_buf());
        library.create("alice", &screen("Liquid"), &ranges()).unwrap();
        library.create("bob", &screen("Cheap"), &ranges()).unwrap();
        library.save().unwrap();
    }

    fn set_first_payload(path: &Path, payload: &str) {
        let mut raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        raw["records"][0]["payload"] = serde_json::Value::from(payload);
        fs::write(path, raw.to_string()).unwrap();
    }

    #[test]
    fn test_unreadable_library_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filter_groups.json");
        write_two_screens(&path);
        set_first_payload(&path, "{\"operator\": \"AND\", \"filters\": [");
        let before = fs::read_to_string(&path).unwrap();

        let mut library = FilterLibrary::with_path(path.clone());
        assert!(library.is_empty());
        library.create("carol", &screen("New"), &ranges()).unwrap();

        assert!(matches!(library.save(), Err(Error::InvalidOperation(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_malformed_filter_value_in_payload_still_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("filter_groups.json");
        write_two_screens(&path);
        set_first_payload(
            &path,
            r#"{"operator":"AND","filters":[{"priceRange":[5.0],"volumeRange":[100.0,2000.0]}]}"#,
        );

        let mut library = FilterLibrary::with_path(path.clone());
        assert_eq!(library.len(), 2);
        library.create("carol", &screen("New"), &ranges()).unwrap();
        library.save().unwrap();

        let reopened = FilterLibrary::open(path).unwrap();
        assert_eq!(reopened.len(), 3);
        let kept = reopened
            .all()
            .into_iter()
            .find(|dto| dto.filter_group_name == "Liquid")
            .unwrap();
        let leaf = kept.filter_group.as_simple().unwrap();
        assert_eq!(leaf.unrecognized()["priceRange"], serde_json::json!([5.0]));
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let library = FilterLibrary::in_memory();
        assert!(library.save().is_ok());
    }
}
