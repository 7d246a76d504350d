//! SQLite catalog store.
//!
//! Holds the imported catalog (artists, albums, tracks) and the genre
//! taxonomy, and serves the candidate track query of a generation run.

use crate::catalog::{GenreScope, Rating, Track, TrackFilter, TrackSource};
use crate::genre::GenreTaxonomy;
use crate::import::{AlbumEntry, ArtistEntry, CatalogExport, TrackEntry};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, trace};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS artists (
    id        TEXT    PRIMARY KEY,
    name      TEXT    NOT NULL,
    sort_name TEXT,
    starred   INTEGER NOT NULL DEFAULT 0,
    rating    INTEGER
);

CREATE TABLE IF NOT EXISTS albums (
    id        TEXT    PRIMARY KEY,
    artist_id TEXT    NOT NULL,
    name      TEXT,
    sort_name TEXT,
    year      INTEGER NOT NULL DEFAULT 0,
    created   TEXT,
    starred   INTEGER NOT NULL DEFAULT 0,
    rating    INTEGER
);

CREATE TABLE IF NOT EXISTS tracks (
    id              TEXT    PRIMARY KEY,
    album_artist_id TEXT    NOT NULL,
    artist_id       TEXT    NOT NULL,
    album_id        TEXT,
    name            TEXT    NOT NULL,
    sort_name       TEXT,
    duration        INTEGER NOT NULL,
    year            INTEGER NOT NULL DEFAULT 0,
    created         TEXT    NOT NULL,
    starred         INTEGER NOT NULL DEFAULT 0,
    rating          INTEGER,
    play_count      INTEGER NOT NULL DEFAULT 0,
    last_played     TEXT,
    genre           TEXT
);

CREATE INDEX IF NOT EXISTS idx_tracks_genre ON tracks(genre);

CREATE TABLE IF NOT EXISTS genres (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT    NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS genre_aliases (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    genre_id INTEGER NOT NULL REFERENCES genres(id),
    name     TEXT    NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS genre_links (
    parent_id INTEGER NOT NULL REFERENCES genres(id),
    child_id  INTEGER NOT NULL REFERENCES genres(id),
    PRIMARY KEY (parent_id, child_id)
);
";

/// Track rating with album fallback, clamped to 1..=5.
const RESOLVED_RATING: &str =
    "MAX(1, MIN(5, COALESCE(NULLIF(t.rating, 0), NULLIF(al.rating, 0), 3)))";

/// Catalog database handle.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path` and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog database at {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Invalid SQL when creating catalog tables")?;
        Ok(Self { conn })
    }

    /// Replace the catalog tables with the content of `export`.
    ///
    /// The genre taxonomy is left untouched.
    pub fn replace_catalog(&mut self, export: &CatalogExport) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM tracks; DELETE FROM albums; DELETE FROM artists;")
            .context("Failed to clear catalog tables")?;

        insert_artists(&tx, &export.artists)?;
        insert_albums(&tx, &export.albums)?;
        insert_tracks(&tx, &export.tracks)?;

        tx.commit().context("Committing catalog import failed")?;
        debug!(
            "Imported {} artists, {} albums, {} tracks",
            export.artists.len(),
            export.albums.len(),
            export.tracks.len()
        );
        Ok(())
    }

    pub fn track_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))
            .context("Could not count tracks")?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Replace the genre tables with `taxonomy`.
    pub fn replace_genre_taxonomy(&mut self, taxonomy: &GenreTaxonomy) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM genre_links; DELETE FROM genre_aliases; DELETE FROM genres;")
            .context("Failed to clear genre tables")?;

        {
            let mut genre_stmt = tx.prepare("INSERT OR IGNORE INTO genres (name) VALUES (?1)")?;
            for name in taxonomy.names() {
                genre_stmt.execute([&name])?;
            }

            let mut alias_stmt = tx.prepare(
                "INSERT OR IGNORE INTO genre_aliases (genre_id, name)
                 SELECT id, ?2 FROM genres WHERE name = ?1",
            )?;
            for (alias, genre) in taxonomy.alias_pairs() {
                alias_stmt
                    .execute([&genre, &alias])
                    .with_context(|| format!("Failed to store alias `{alias}' of `{genre}'"))?;
            }

            let mut link_stmt = tx.prepare(
                "INSERT OR IGNORE INTO genre_links (parent_id, child_id)
                 SELECT p.id, c.id FROM genres p, genres c WHERE p.name = ?1 AND c.name = ?2",
            )?;
            for (parent, child) in taxonomy.links() {
                link_stmt.execute([&parent, &child])?;
            }
        }

        tx.commit().context("Committing genre taxonomy failed")?;
        Ok(())
    }

    /// Read the genre tables into memory.
    pub fn load_genre_taxonomy(&self) -> Result<GenreTaxonomy> {
        let mut taxonomy = GenreTaxonomy::new();

        let mut stmt = self.conn.prepare("SELECT name FROM genres ORDER BY id")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for name in names {
            taxonomy.add_genre(&name.context("Failed to read genre row")?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT g.name, a.name FROM genre_aliases a
             JOIN genres g ON g.id = a.genre_id ORDER BY a.id",
        )?;
        let aliases = stmt.query_map([], name_pair)?;
        for alias in aliases {
            let (genre, alias) = alias.context("Failed to read genre alias row")?;
            taxonomy.add_alias(&genre, &alias);
        }

        let mut stmt = self.conn.prepare(
            "SELECT p.name, c.name FROM genre_links l
             JOIN genres p ON p.id = l.parent_id
             JOIN genres c ON c.id = l.child_id",
        )?;
        let links = stmt.query_map([], name_pair)?;
        for link in links {
            let (parent, child) = link.context("Failed to read genre link row")?;
            taxonomy.add_child(&parent, &child);
        }

        trace!("Loaded {} genres from the catalog", taxonomy.len());
        Ok(taxonomy)
    }

    /// Canonical genre names, sorted.
    pub fn genre_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM genres ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("Failed to read genre names")?;
        Ok(names)
    }
}

impl TrackSource for Database {
    fn matching_tracks(&self, filter: &TrackFilter) -> Result<Vec<Track>> {
        let mut sql = format!(
            "SELECT t.id, t.artist_id, t.album_artist_id, COALESCE(ar.name, ''),
                    COALESCE(al.name, ''), t.name, t.duration, t.year, {RESOLVED_RATING},
                    t.starred, t.play_count, t.last_played, t.created, t.genre
             FROM tracks t
             LEFT JOIN albums al ON al.id = t.album_id
             LEFT JOIN artists ar ON ar.id = t.album_artist_id
             WHERE {RESOLVED_RATING} >= ?1 AND t.duration > ?2 AND t.duration < ?3"
        );
        let mut values = vec![
            Value::Integer(i64::from(filter.min_rating.get())),
            Value::Integer(i64::from(filter.min_duration)),
            Value::Integer(i64::from(filter.max_duration)),
        ];

        if let GenreScope::Only(names) = &filter.genres {
            if names.is_empty() {
                sql.push_str(" AND 0");
            } else {
                let placeholders = vec!["?"; names.len()].join(", ");
                sql.push_str(&format!(" AND t.genre IN ({placeholders})"));
                values.extend(names.iter().cloned().map(Value::Text));
            }
        }
        // Stable row order keeps seeded runs reproducible.
        sql.push_str(" ORDER BY t.id");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Invalid SQL when selecting candidate tracks")?;
        let rows = stmt
            .query_map(params_from_iter(values), track_from_row)
            .context("Cannot query candidate tracks")?;

        let mut tracks = Vec::new();
        for row in rows {
            let track = row.context("Failed to read candidate track row")?;
            if !filter.title_excluded(&track.name) {
                tracks.push(track);
            }
        }
        Ok(tracks)
    }
}

fn insert_artists(tx: &Transaction<'_>, artists: &[ArtistEntry]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT OR REPLACE INTO artists (id, name, sort_name, starred, rating)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for artist in artists {
        stmt.execute(params![
            artist.id,
            artist.name,
            artist.sort_name.as_deref().unwrap_or(&artist.name),
            artist.is_starred(),
            artist.rating,
        ])
        .with_context(|| format!("Failed to insert artist `{}'", artist.id))?;
    }
    Ok(())
}

fn name_pair(row: &Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn insert_albums(tx: &Transaction<'_>, albums: &[AlbumEntry]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT OR REPLACE INTO albums
             (id, artist_id, name, sort_name, year, created, starred, rating)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for album in albums {
        stmt.execute(params![
            album.id,
            album.artist_id,
            album.name,
            album.sort_name.as_deref().unwrap_or(&album.name),
            album.year.unwrap_or(0),
            album.created.map(|c| c.to_rfc3339()),
            album.is_starred(),
            album.rating,
        ])
        .with_context(|| format!("Failed to insert album `{}'", album.id))?;
    }
    Ok(())
}

fn insert_tracks(tx: &Transaction<'_>, tracks: &[TrackEntry]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT OR REPLACE INTO tracks (id, album_artist_id, artist_id, album_id, name, sort_name,
             duration, year, created, starred, rating, play_count, last_played, genre)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )?;
    for track in tracks {
        stmt.execute(params![
            track.id,
            track.album_artist_id(),
            track.artist_id,
            track.album_id,
            track.name,
            track.sort_name.as_deref().unwrap_or(&track.name),
            track.duration,
            track.year.unwrap_or(0),
            track.created.to_rfc3339(),
            track.is_starred(),
            track.user_rating,
            track.play_count.unwrap_or(0),
            track.played.map(|p| p.to_rfc3339()),
            track.normalized_genre(),
        ])
        .with_context(|| format!("Failed to insert track `{}'", track.id))?;
    }
    Ok(())
}

fn track_from_row(row: &Row<'_>) -> rusqlite::Result<Track> {
    let last_played: Option<String> = row.get(11)?;
    let created: String = row.get(12)?;

    Ok(Track {
        id: row.get(0)?,
        artist_id: row.get(1)?,
        album_artist_id: row.get(2)?,
        album_artist_name: row.get(3)?,
        album_name: row.get(4)?,
        name: row.get(5)?,
        duration: row.get(6)?,
        year: row.get(7)?,
        rating: Rating::clamped(row.get(8)?),
        starred: row.get(9)?,
        play_count: row.get(10)?,
        last_played: last_played
            .map(|text| parse_timestamp(11, &text))
            .transpose()?,
        created_at: parse_timestamp(12, &created)?,
        genre_name: row.get(13)?,
    })
}

/// RFC 3339, or SQLite's `YYYY-MM-DD HH:MM:SS` taken as UTC.
fn parse_timestamp(column: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
