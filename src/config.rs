//! # Configuration Module
//!
//! Reads the TOML configuration file and validates each playlist definition
//! into [`GenerationParams`] before any catalog access happens.
//!
//! ## Data Storage
//!
//! The catalog database lives in the platform-standard data directory:
//! - Linux: `~/.local/share/dailymix/catalog.db`
//! - macOS: `~/Library/Application Support/dailymix/catalog.db`
//! - Windows: `%APPDATA%\dailymix\catalog.db`
//!
//! The configuration file defaults to `<config dir>/dailymix/config.toml`.

use crate::catalog::{GenreScope, Rating};
use crate::genre::ALL_GENRES;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "dailymix";

/// Rejected configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("playlist `{0}': max_tracks must be greater than 0")]
    InvalidLength(String),

    #[error(
        "playlist `{id}': min_track_duration ({min}) must be lower than \
         max_track_duration ({max})"
    )]
    InvalidDurationRange { id: String, min: u32, max: u32 },

    #[error("playlist `{id}': minimal_track_rating must be between 1 and 5, got {rating}")]
    InvalidRating { id: String, rating: u8 },

    #[error("playlist `{id}': invalid ignore_tracks_matching pattern `{pattern}'")]
    InvalidPattern {
        id: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("a playlist has an empty id")]
    MissingPlaylistId,

    #[error("playlist id `{0}' is used more than once")]
    DuplicatePlaylistId(String),
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub playlists: Vec<PlaylistConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Overrides the default database location.
    pub database: Option<PathBuf>,
}

/// One `[[playlists]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaylistConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub max_tracks: usize,
    pub min_track_duration: u32,
    pub max_track_duration: u32,
    pub minimal_track_rating: u8,
    pub ignore_tracks_matching: String,
    pub genres: Vec<String>,
    pub include_genre_aliases: bool,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: "Unnamed Mix".to_string(),
            description: "Daily Mix".to_string(),
            max_tracks: 60,
            min_track_duration: 60,
            max_track_duration: 600,
            minimal_track_rating: 1,
            ignore_tracks_matching: String::new(),
            genres: vec![ALL_GENRES.to_string()],
            include_genre_aliases: true,
        }
    }
}

/// Validated inputs of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub length: usize,
    pub min_duration: u32,
    pub max_duration: u32,
    pub min_rating: Rating,
    /// `None` when the configured pattern is empty.
    pub title_exclude: Option<Regex>,
    pub genres: Vec<String>,
    pub include_genre_aliases: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        let defaults = PlaylistConfig::default();
        Self {
            length: defaults.max_tracks,
            min_duration: defaults.min_track_duration,
            max_duration: defaults.max_track_duration,
            min_rating: Rating::clamped(i64::from(defaults.minimal_track_rating)),
            title_exclude: None,
            genres: defaults.genres,
            include_genre_aliases: defaults.include_genre_aliases,
        }
    }
}

impl GenerationParams {
    /// The filter for these params with an already expanded genre scope.
    #[must_use]
    pub fn filter(&self, genres: GenreScope) -> crate::catalog::TrackFilter {
        crate::catalog::TrackFilter {
            min_duration: self.min_duration,
            max_duration: self.max_duration,
            min_rating: self.min_rating,
            title_exclude: self.title_exclude.clone(),
            genres,
        }
    }
}

/// Compile a title exclusion pattern: case-insensitive, matched from the
/// start of the track name. Empty patterns exclude nothing.
pub fn compile_title_pattern(pattern: &str) -> Result<Option<Regex>, regex::Error> {
    if pattern.is_empty() {
        return Ok(None);
    }
    RegexBuilder::new(&format!("^(?:{pattern})"))
        .case_insensitive(true)
        .build()
        .map(Some)
}

impl PlaylistConfig {
    /// Check ranges and compile the title pattern.
    pub fn validate(&self) -> Result<GenerationParams, ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::MissingPlaylistId);
        }
        if self.max_tracks == 0 {
            return Err(ConfigError::InvalidLength(self.id.clone()));
        }
        if self.min_track_duration >= self.max_track_duration {
            return Err(ConfigError::InvalidDurationRange {
                id: self.id.clone(),
                min: self.min_track_duration,
                max: self.max_track_duration,
            });
        }
        if !(1..=5).contains(&self.minimal_track_rating) {
            return Err(ConfigError::InvalidRating {
                id: self.id.clone(),
                rating: self.minimal_track_rating,
            });
        }
        let title_exclude = compile_title_pattern(&self.ignore_tracks_matching).map_err(|source| {
            ConfigError::InvalidPattern {
                id: self.id.clone(),
                pattern: self.ignore_tracks_matching.clone(),
                source,
            }
        })?;

        Ok(GenerationParams {
            length: self.max_tracks,
            min_duration: self.min_track_duration,
            max_duration: self.max_track_duration,
            min_rating: Rating::clamped(i64::from(self.minimal_track_rating)),
            title_exclude,
            genres: self.genres.clone(),
            include_genre_aliases: self.include_genre_aliases,
        })
    }
}

impl Config {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))
    }

    /// Validate every playlist, in file order.
    pub fn validate(&self) -> Result<Vec<(&PlaylistConfig, GenerationParams)>, ConfigError> {
        let mut seen = HashSet::new();
        self.playlists
            .iter()
            .map(|playlist| {
                let params = playlist.validate()?;
                if !seen.insert(playlist.id.as_str()) {
                    return Err(ConfigError::DuplicatePlaylistId(playlist.id.clone()));
                }
                Ok((playlist, params))
            })
            .collect()
    }

    /// Database path: the configured one, else the platform default.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.catalog.database {
            Some(path) => Ok(path.clone()),
            None => get_db_path(),
        }
    }
}

/// Returns the platform-appropriate data directory, creating it if needed.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. \
             Please ensure your platform supports standard data directories."
        )
    })?;
    ensure_dir(data_dir.join(APP_DIR))
}

/// Returns the platform-appropriate catalog database path.
///
/// # Errors
///
/// Fails when the data directory cannot be determined or created.
///
/// ```no_run
/// let db_path = dailymix::config::get_db_path()?;
/// println!("Catalog location: {}", db_path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("catalog.db"))
}

/// Default configuration file location. The file itself may not exist.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!("Could not determine system configuration directory.")
    })?;
    Ok(config_dir.join(APP_DIR).join("config.toml"))
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    fs::create_dir_all(&dir).with_context(|| {
        format!(
            "Failed to create data directory at {}. Please check file permissions.",
            dir.display()
        )
    })?;
    Ok(dir)
}
