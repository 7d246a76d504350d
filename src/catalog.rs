//! Catalog records and the collaborator contracts the engine consumes.
//!
//! The engine never talks to a concrete store directly. It asks a
//! [`TrackSource`] for the tracks passing a [`TrackFilter`] and a
//! [`GenreLookup`] for the genre taxonomy. [`crate::db::Database`] backs both
//! with SQLite; [`MemoryCatalog`] backs tracks with a plain vector.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Rating used when neither the track nor its album carries one.
pub const DEFAULT_RATING: u8 = 3;

/// A 1 to 5 star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rating(u8);

impl Rating {
    /// Clamp any raw value into `1..=5`. Zero and negative values become 1.
    #[must_use]
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(1, 5) as u8)
    }

    /// Resolve a track rating: the track's own rating, then the album's,
    /// then [`DEFAULT_RATING`]. Zero counts as "not rated".
    #[must_use]
    pub fn resolve(track: Option<i64>, album: Option<i64>) -> Self {
        let rated = |value: Option<i64>| value.filter(|&v| v > 0);
        rated(track)
            .or_else(|| rated(album))
            .map_or(Self(DEFAULT_RATING), Self::clamped)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(DEFAULT_RATING)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

/// A track as read from the catalog. Immutable during a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub artist_id: String,
    pub album_artist_id: String,
    pub album_artist_name: String,
    pub album_name: String,
    pub name: String,
    /// Duration in seconds.
    pub duration: u32,
    /// Release year, `0` when unknown.
    pub year: i32,
    pub rating: Rating,
    pub starred: bool,
    pub play_count: u32,
    pub last_played: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Normalized genre name.
    pub genre_name: Option<String>,
}

/// Which selection strategy supplies a playlist slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Regular,
    Interest,
    Freshness,
    BackCatalog,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Regular, Role::Interest, Role::Freshness, Role::BackCatalog];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Interest => "interest",
            Role::Freshness => "freshness",
            Role::BackCatalog => "back-catalog",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A candidate track annotated with the pool it came from and both scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrack {
    pub track: Track,
    pub role: Role,
    pub interest: f64,
    pub freshness: f64,
}

/// Genre scope of a query.
///
/// `All` disables genre filtering; `Only` with an empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenreScope {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl GenreScope {
    #[must_use]
    pub fn is_filtering(&self) -> bool {
        matches!(self, GenreScope::Only(_))
    }

    #[must_use]
    pub fn allows(&self, genre_name: Option<&str>) -> bool {
        match self {
            GenreScope::All => true,
            GenreScope::Only(names) => genre_name.is_some_and(|name| names.contains(name)),
        }
    }
}

/// The predicate shared by all four candidate queries.
#[derive(Debug, Clone)]
pub struct TrackFilter {
    /// Exclusive lower duration bound, in seconds.
    pub min_duration: u32,
    /// Exclusive upper duration bound, in seconds.
    pub max_duration: u32,
    pub min_rating: Rating,
    /// Case-insensitive pattern; matching track names are excluded.
    pub title_exclude: Option<Regex>,
    pub genres: GenreScope,
}

impl TrackFilter {
    /// Everything except the title pattern, which stores evaluate in-process.
    #[must_use]
    pub fn matches_fields(&self, track: &Track) -> bool {
        track.rating >= self.min_rating
            && self.min_duration < track.duration
            && track.duration < self.max_duration
            && self.genres.allows(track.genre_name.as_deref())
    }

    #[must_use]
    pub fn title_excluded(&self, name: &str) -> bool {
        self.title_exclude
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(name))
    }

    #[must_use]
    pub fn matches(&self, track: &Track) -> bool {
        self.matches_fields(track) && !self.title_excluded(&track.name)
    }
}

/// Catalog-store collaborator.
pub trait TrackSource {
    /// Every track satisfying `filter`, in no particular order.
    ///
    /// # Errors
    ///
    /// Store failures are returned as-is; callers do not retry.
    fn matching_tracks(&self, filter: &TrackFilter) -> anyhow::Result<Vec<Track>>;
}

/// Genre-lookup collaborator. All names are normalized.
pub trait GenreLookup {
    fn is_genre(&self, name: &str) -> bool;

    /// Canonical genre name an alias denotes.
    fn genre_for_alias(&self, alias: &str) -> Option<String>;

    /// Direct children of `name` (subgenres and fusion genres), one level deep.
    fn subgenres(&self, name: &str) -> Vec<String>;

    fn aliases(&self, name: &str) -> Vec<String>;
}

/// In-memory track store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tracks: Vec<Track>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl TrackSource for MemoryCatalog {
    fn matching_tracks(&self, filter: &TrackFilter) -> anyhow::Result<Vec<Track>> {
        Ok(self
            .tracks
            .iter()
            .filter(|track| filter.matches(track))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::RegexBuilder;

    pub(crate) fn track(id: &str, artist: &str) -> Track {
        Track {
            id: id.to_string(),
            artist_id: artist.to_string(),
            album_artist_id: artist.to_string(),
            album_artist_name: format!("Artist {artist}"),
            album_name: "Album".to_string(),
            name: format!("Track {id}"),
            duration: 200,
            year: 2020,
            rating: Rating::default(),
            starred: false,
            play_count: 0,
            last_played: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            genre_name: Some("rock".to_string()),
        }
    }

    fn open_filter() -> TrackFilter {
        TrackFilter {
            min_duration: 60,
            max_duration: 600,
            min_rating: Rating::clamped(1),
            title_exclude: None,
            genres: GenreScope::All,
        }
    }

    #[test]
    fn test_rating_resolution_falls_back_to_album_then_default() {
        assert_eq!(Rating::resolve(Some(5), Some(2)).get(), 5);
        assert_eq!(Rating::resolve(None, Some(2)).get(), 2);
        assert_eq!(Rating::resolve(Some(0), Some(4)).get(), 4);
        assert_eq!(Rating::resolve(None, None).get(), DEFAULT_RATING);
        assert_eq!(Rating::resolve(Some(9), None).get(), 5);
    }

    #[test]
    fn test_duration_bounds_are_exclusive() {
        let filter = open_filter();
        let mut t = track("1", "a");
        t.duration = 60;
        assert!(!filter.matches(&t));
        t.duration = 61;
        assert!(filter.matches(&t));
        t.duration = 600;
        assert!(!filter.matches(&t));
    }

    #[test]
    fn test_title_pattern_is_case_insensitive() {
        let mut filter = open_filter();
        filter.title_exclude = Some(
            RegexBuilder::new("^(?:.*instrumental)")
                .case_insensitive(true)
                .build()
                .unwrap(),
        );
        let mut t = track("1", "a");
        t.name = "Song (Instrumental)".to_string();
        assert!(!filter.matches(&t));
        t.name = "Song".to_string();
        assert!(filter.matches(&t));
    }

    #[test]
    fn test_empty_genre_scope_matches_nothing() {
        let mut filter = open_filter();
        filter.genres = GenreScope::Only(BTreeSet::new());
        assert!(!filter.matches(&track("1", "a")));

        filter.genres = GenreScope::All;
        let mut untagged = track("2", "a");
        untagged.genre_name = None;
        assert!(filter.matches(&untagged));
    }

    #[test]
    fn test_memory_catalog_applies_filter() {
        let mut low = track("low", "a");
        low.rating = Rating::clamped(1);
        let catalog = MemoryCatalog::new(vec![track("1", "a"), low]);

        let mut filter = open_filter();
        filter.min_rating = Rating::clamped(2);
        let found = catalog.matching_tracks(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
    }
}
