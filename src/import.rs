//! Catalog and genre taxonomy import.
//!
//! The catalog comes from a JSON export of the remote music server, using
//! its camelCase field names. The genre taxonomy comes from three
//! tab-separated files of a MusicBrainz database dump.

use crate::genre::{normalize, GenreTaxonomy};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// MusicBrainz link type: `entity0` is a subgenre of `entity1`.
pub const LINK_SUBGENRE_OF: i64 = 944_810;
/// MusicBrainz link type: `entity0` is a fusion of `entity1`.
pub const LINK_FUSION_OF: i64 = 944_812;

/// Dump files read by [`import_musicbrainz_genres`].
pub const MUSICBRAINZ_FILES: [&str; 3] = ["genre", "genre_alias", "l_genre_genre"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogExport {
    #[serde(default)]
    pub artists: Vec<ArtistEntry>,
    #[serde(default)]
    pub albums: Vec<AlbumEntry>,
    #[serde(default)]
    pub tracks: Vec<TrackEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistEntry {
    pub id: String,
    pub name: String,
    pub sort_name: Option<String>,
    /// Timestamp of starring; present means starred.
    pub starred: Option<String>,
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumEntry {
    pub id: String,
    /// Album artist.
    #[serde(alias = "parent")]
    pub artist_id: String,
    #[serde(alias = "title")]
    pub name: String,
    pub sort_name: Option<String>,
    pub year: Option<i32>,
    pub created: Option<DateTime<Utc>>,
    pub starred: Option<String>,
    #[serde(alias = "userRating")]
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEntry {
    pub id: String,
    pub artist_id: String,
    pub album_artist_id: Option<String>,
    pub album_id: Option<String>,
    #[serde(alias = "title")]
    pub name: String,
    pub sort_name: Option<String>,
    pub duration: u32,
    pub year: Option<i32>,
    pub created: DateTime<Utc>,
    pub starred: Option<String>,
    pub user_rating: Option<i64>,
    pub play_count: Option<u32>,
    pub played: Option<DateTime<Utc>>,
    pub genre: Option<String>,
}

impl ArtistEntry {
    #[must_use]
    pub fn is_starred(&self) -> bool {
        self.starred.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl AlbumEntry {
    #[must_use]
    pub fn is_starred(&self) -> bool {
        self.starred.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl TrackEntry {
    #[must_use]
    pub fn is_starred(&self) -> bool {
        self.starred.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Falls back to the track artist when the export has no album artist.
    #[must_use]
    pub fn album_artist_id(&self) -> &str {
        self.album_artist_id.as_deref().unwrap_or(&self.artist_id)
    }

    #[must_use]
    pub fn normalized_genre(&self) -> Option<String> {
        self.genre
            .as_deref()
            .map(normalize)
            .filter(|genre| !genre.is_empty())
    }
}

/// Parse a catalog export file.
pub fn read_catalog_export(path: &Path) -> Result<CatalogExport> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog export {}", path.display()))?;
    let export: CatalogExport = serde_json::from_str(&content)
        .with_context(|| format!("Invalid catalog export {}", path.display()))?;
    info!(
        "Read {} artists, {} albums, {} tracks from {}",
        export.artists.len(),
        export.albums.len(),
        export.tracks.len(),
        path.display()
    );
    Ok(export)
}

/// Build a taxonomy from the MusicBrainz dump files in `dir`.
///
/// Subgenre and fusion links become parent→child edges with `entity1` as
/// the parent. Other link types are ignored.
pub fn import_musicbrainz_genres(dir: &Path) -> Result<GenreTaxonomy> {
    let read = |name: &str| {
        let path = dir.join(name);
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read MusicBrainz dump file {}", path.display()))
    };

    let genres = read(MUSICBRAINZ_FILES[0])?;
    let aliases = read(MUSICBRAINZ_FILES[1])?;
    let links = read(MUSICBRAINZ_FILES[2])?;
    parse_musicbrainz_genres(&genres, &aliases, &links)
}

/// Parse the three dump tables. Columns used: `genre(id, gid, name)`,
/// `genre_alias(id, genre, name)` and `l_genre_genre(id, link, entity0, entity1)`.
pub fn parse_musicbrainz_genres(genres: &str, aliases: &str, links: &str) -> Result<GenreTaxonomy> {
    let mut taxonomy = GenreTaxonomy::new();
    let mut names_by_id: HashMap<i64, String> = HashMap::new();

    for (line_no, fields) in pgdump_rows(genres) {
        let id = parse_id(fields.first(), "genre", line_no)?;
        let name = field(&fields, 2)
            .with_context(|| format!("genre line {line_no}: missing name"))?;
        let name = normalize(name);
        if name.is_empty() {
            continue;
        }
        taxonomy.add_genre(&name);
        names_by_id.insert(id, name);
    }

    let mut skipped_aliases = 0usize;
    for (line_no, fields) in pgdump_rows(aliases) {
        let genre_id = parse_id(fields.get(1), "genre_alias", line_no)?;
        let Some(alias) = field(&fields, 2) else {
            continue;
        };
        match names_by_id.get(&genre_id) {
            Some(genre) => {
                if !taxonomy.add_alias(genre, alias) {
                    skipped_aliases += 1;
                }
            }
            None => warn!("genre_alias line {line_no}: unknown genre id {genre_id}"),
        }
    }

    let mut edges = 0usize;
    for (line_no, fields) in pgdump_rows(links) {
        let link = parse_id(fields.get(1), "l_genre_genre", line_no)?;
        if link != LINK_SUBGENRE_OF && link != LINK_FUSION_OF {
            continue;
        }
        let child_id = parse_id(fields.get(2), "l_genre_genre", line_no)?;
        let parent_id = parse_id(fields.get(3), "l_genre_genre", line_no)?;
        match (names_by_id.get(&parent_id), names_by_id.get(&child_id)) {
            (Some(parent), Some(child)) => {
                taxonomy.add_child(parent, child);
                edges += 1;
            }
            _ => warn!("l_genre_genre line {line_no}: unknown genre id"),
        }
    }

    debug!(
        "MusicBrainz taxonomy: {} genres, {edges} relations, \
         {skipped_aliases} duplicate aliases skipped",
        taxonomy.len()
    );
    Ok(taxonomy)
}

/// Non-empty lines of a PostgreSQL dump split on tabs, with 1-based line numbers.
fn pgdump_rows(content: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| (i + 1, line.split('\t').collect()))
}

/// Column `index`, with `\N` read as missing.
fn field<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields.get(index).copied().filter(|value| *value != "\\N")
}

fn parse_id(value: Option<&&str>, table: &str, line_no: usize) -> Result<i64> {
    let value = value.with_context(|| format!("{table} line {line_no}: missing column"))?;
    value
        .parse()
        .with_context(|| format!("{table} line {line_no}: invalid id `{value}'"))
}
