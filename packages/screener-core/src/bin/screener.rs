//! Screener CLI - Command line interface for saved screens.
//!
//! Prints JSON on stdout for the web bridge; logs go to stderr.

use clap::{Parser, Subcommand};
use screener_core::{
    count_active_filters,
    filters::{adjust_filter_group_for_load, adjust_filter_group_for_save},
    ApiResponse, Config, Error, FilterGroup, FilterGroupDto, FilterLibrary, Permission, Result,
    ScreenerRanges,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "screener")]
#[command(about = "Screener CLI - saved screens and filter normalization")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.traderslab/screener/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter group commands
    Filters {
        #[command(subcommand)]
        action: FiltersAction,
    },
    /// Saved screen library commands
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
}

#[derive(Subcommand)]
enum FiltersAction {
    /// Normalize a filter group for saving
    Save {
        /// Filter group JSON file
        #[arg(short, long)]
        file: PathBuf,
        /// Screener ranges JSON file
        #[arg(short, long)]
        ranges: Option<PathBuf>,
    },
    /// Restore a saved filter group for editing
    Load {
        /// Filter group JSON file
        #[arg(short, long)]
        file: PathBuf,
        /// Screener ranges JSON file
        #[arg(short, long)]
        ranges: Option<PathBuf>,
    },
    /// Count active filters
    Count {
        /// Filter group JSON file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum LibraryAction {
    /// List saved screens
    List {
        /// Only screens owned by this user
        #[arg(long)]
        owner: Option<String>,
        /// Only screens carrying this tag
        #[arg(long)]
        tag: Option<String>,
        /// Only shared and system screens
        #[arg(long)]
        shared: bool,
    },
    /// Get a saved screen, restored for editing
    Get {
        /// Screen id
        #[arg(short, long)]
        id: String,
        /// Requesting user
        #[arg(short, long)]
        user: Option<String>,
        /// Screener ranges JSON file
        #[arg(short, long)]
        ranges: Option<PathBuf>,
    },
    /// Save a new screen
    Create {
        /// Owner
        #[arg(short, long)]
        user: Option<String>,
        /// Screen name
        #[arg(short, long)]
        name: String,
        /// Screen description
        #[arg(short, long, default_value = "")]
        description: String,
        /// private, shared or system
        #[arg(short, long, default_value = "private")]
        permission: Permission,
        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Filter group JSON file
        #[arg(short, long)]
        file: PathBuf,
        /// Screener ranges JSON file
        #[arg(short, long)]
        ranges: Option<PathBuf>,
    },
    /// Update a saved screen
    Update {
        /// Owner
        #[arg(short, long)]
        user: Option<String>,
        /// Screen id
        #[arg(short, long)]
        id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New permission
        #[arg(short, long)]
        permission: Option<Permission>,
        /// Replacement tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Replacement filter group JSON file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Screener ranges JSON file
        #[arg(short, long)]
        ranges: Option<PathBuf>,
    },
    /// Delete a saved screen
    Delete {
        /// Owner
        #[arg(short, long)]
        user: Option<String>,
        /// Screen id
        #[arg(short, long)]
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    // Initialize logging
    let default_filter = config.log_filter.clone().unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Filters { action } => handle_filters(action, &config),
        Commands::Library { action } => handle_library(action, &config),
    };

    if let Err(e) = &result {
        tracing::error!("Command failed: {}", e);
    }

    println!("{}", serde_json::to_string_pretty(&ApiResponse::from(result))?);
    Ok(())
}

fn read_group(path: &Path) -> Result<FilterGroup> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn resolve_ranges(path: Option<PathBuf>, config: &Config) -> Result<ScreenerRanges> {
    match path {
        Some(path) => ScreenerRanges::load_from_path(&path),
        None => config.ranges(),
    }
}

fn resolve_user(user: Option<String>, config: &Config) -> Result<String> {
    user.or_else(|| config.default_user.clone()).ok_or_else(|| {
        Error::InvalidOperation("No user given; pass --user or set default_user".to_string())
    })
}

fn summary(dto: &FilterGroupDto) -> Value {
    json!({
        "filterGroupId": dto.filter_group_id,
        "filterGroupName": dto.filter_group_name,
        "permission": dto.permission,
        "userId": dto.user_id,
        "tags": dto.tags,
        "activeFilters": dto.active_filter_count(),
        "updatedAt": dto.updated_at,
    })
}

fn handle_filters(action: FiltersAction, config: &Config) -> Result<Value> {
    match action {
        FiltersAction::Save { file, ranges } => {
            let group = read_group(&file)?;
            let ranges = resolve_ranges(ranges, config)?;
            Ok(serde_json::to_value(adjust_filter_group_for_save(&group, &ranges))?)
        }
        FiltersAction::Load { file, ranges } => {
            let group = read_group(&file)?;
            let ranges = resolve_ranges(ranges, config)?;
            Ok(serde_json::to_value(adjust_filter_group_for_load(&group, &ranges))?)
        }
        FiltersAction::Count { file } => {
            let group = read_group(&file)?;
            Ok(json!({
                "activeFilters": count_active_filters(&group),
                "leaves": group.leaf_count(),
                "depth": group.depth(),
            }))
        }
    }
}

fn handle_library(action: LibraryAction, config: &Config) -> Result<Value> {
    let mut library = FilterLibrary::open(config.library_path())?;

    match action {
        LibraryAction::List { owner, tag, shared } => {
            let mut screens = match (&owner, &tag) {
                (Some(owner), _) => library.by_owner(owner),
                (None, Some(tag)) => library.by_tag(tag),
                (None, None) => library.all(),
            };
            if let (Some(_), Some(tag)) = (&owner, &tag) {
                let tag = tag.trim().to_lowercase();
                screens.retain(|dto| dto.tags.contains(&tag));
            }
            if shared {
                screens.retain(|dto| dto.permission.is_public());
            }
            let count = screens.len();
            let screens: Vec<Value> = screens.into_iter().map(summary).collect();
            Ok(json!({ "screens": screens, "count": count }))
        }
        LibraryAction::Get { id, user, ranges } => {
            let ranges = resolve_ranges(ranges, config)?;
            let dto = match resolve_user(user, config) {
                Ok(user) => library.load_for_editing(&user, &id, &ranges)?,
                Err(_) => {
                    let dto = library
                        .get(&id)
                        .ok_or_else(|| Error::FilterGroupNotFound(id.clone()))?;
                    if !dto.permission.is_public() {
                        return Err(Error::PermissionDenied(format!(
                            "Screen {} is private to its owner",
                            id
                        )));
                    }
                    dto.adjusted_for_load(&ranges)
                }
            };
            Ok(serde_json::to_value(dto)?)
        }
        LibraryAction::Create {
            user,
            name,
            description,
            permission,
            tags,
            file,
            ranges,
        } => {
            let user = resolve_user(user, config)?;
            let ranges = resolve_ranges(ranges, config)?;
            let dto = FilterGroupDto::new(&name, read_group(&file)?)
                .with_description(&description)
                .with_permission(permission)
                .with_tags(tags);

            let stored = library.create(&user, &dto, &ranges)?;
            library.save()?;
            Ok(json!({ "created": stored }))
        }
        LibraryAction::Update {
            user,
            id,
            name,
            description,
            permission,
            tags,
            file,
            ranges,
        } => {
            let user = resolve_user(user, config)?;
            let ranges = resolve_ranges(ranges, config)?;

            // Start from the editable form so unchanged ranges re-normalize cleanly
            let mut dto = library.load_for_editing(&user, &id, &ranges)?;
            if let Some(name) = name {
                dto.filter_group_name = name;
            }
            if let Some(description) = description {
                dto.filter_group_description = description;
            }
            if let Some(permission) = permission {
                dto.permission = permission;
            }
            if !tags.is_empty() {
                dto.tags = tags;
            }
            if let Some(file) = file {
                dto.filter_group = read_group(&file)?;
            }

            let stored = library.update(&user, &dto, &ranges)?;
            library.save()?;
            Ok(json!({ "updated": stored }))
        }
        LibraryAction::Delete { user, id } => {
            let user = resolve_user(user, config)?;
            let removed = library.delete(&user, &id)?;
            library.save()?;
            Ok(json!({ "removed": summary(&removed) }))
        }
    }
}
