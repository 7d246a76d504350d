//! # Playlist Generation
//!
//! Drives one generation run: genre tokens are expanded, the candidate pools
//! fetched, a role skeleton laid out and the slots filled.
//!
//! All randomness comes from the caller's RNG and the clock from the
//! [`ScoringContext`], so a seeded run over the same catalog is repeatable.
//!
//! ```
//! use dailymix::catalog::MemoryCatalog;
//! use dailymix::config::GenerationParams;
//! use dailymix::genre::GenreTaxonomy;
//! use dailymix::playlist::PlaylistGenerator;
//! use dailymix::scoring::ScoringContext;
//! use rand::SeedableRng;
//!
//! let catalog = MemoryCatalog::new(Vec::new());
//! let taxonomy = GenreTaxonomy::new();
//! let generator = PlaylistGenerator::new(&catalog, &taxonomy);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let playlist = generator
//!     .generate(&GenerationParams::default(), &ScoringContext::default(), &mut rng)
//!     .unwrap();
//! assert!(playlist.is_empty());
//! ```

use crate::catalog::{GenreLookup, GenreScope, Role, ScoredTrack, TrackSource};
use crate::config::{GenerationParams, PlaylistConfig};
use crate::genre::GenreResolver;
use crate::pools::CandidatePoolFetcher;
use crate::scoring::ScoringContext;
use crate::selector::Selector;
use crate::skeleton::SkeletonGenerator;
use anyhow::Result;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// One filled slot.
pub type PlaylistEntry = ScoredTrack;

/// Ordered result of a generation run.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub entries: Vec<PlaylistEntry>,
    /// Genre tokens that matched nothing in the taxonomy.
    pub unresolved_genres: Vec<String>,
}

impl Playlist {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Track ids in playlist order.
    #[must_use]
    pub fn track_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.track.id.clone()).collect()
    }

    /// The document handed to the publisher.
    #[must_use]
    pub fn export(&self, config: &PlaylistConfig) -> PlaylistExport {
        PlaylistExport {
            id: config.id.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            tracks: self.track_ids(),
        }
    }

    /// Print the diagnostics table.
    pub fn print(&self, title: &str) {
        println!("🎵 {title}");
        println!("✅ Generated {} tracks", self.len());
        if !self.unresolved_genres.is_empty() {
            println!("⚠️  Unknown genres: {}", self.unresolved_genres.join(", "));
        }
        for (i, entry) in self.entries.iter().enumerate() {
            let track = &entry.track;
            println!(
                "  {:>3}. [{:<12}] {} - {} \
                 (rating: {}, plays: {}, interest: {:.2}, freshness: {:.2}){}",
                i + 1,
                entry.role,
                track.album_artist_name,
                track.name,
                track.rating,
                track.play_count,
                entry.interest,
                entry.freshness,
                if track.starred { " ★" } else { "" }
            );
        }
    }
}

/// Serialized playlist: metadata plus ordered track ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistExport {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tracks: Vec<String>,
}

/// Generates playlists over a catalog and a genre taxonomy.
pub struct PlaylistGenerator<'a, S: TrackSource + ?Sized, L: GenreLookup + ?Sized> {
    source: &'a S,
    genres: &'a L,
}

impl<'a, S: TrackSource + ?Sized, L: GenreLookup + ?Sized> PlaylistGenerator<'a, S, L> {
    #[must_use]
    pub fn new(source: &'a S, genres: &'a L) -> Self {
        Self { source, genres }
    }

    /// Generate one playlist.
    ///
    /// Two independent generators are seeded from `rng` before anything
    /// else happens: one breaks ranking ties, the other draws the slots.
    /// See [`generate_with`](Self::generate_with).
    ///
    /// # Errors
    ///
    /// Catalog failures are propagated. Unknown genres and short results
    /// are not errors.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        params: &GenerationParams,
        context: &ScoringContext,
        rng: &mut R,
    ) -> Result<Playlist> {
        let mut tiebreak = StdRng::seed_from_u64(rng.gen());
        let mut draws = StdRng::seed_from_u64(rng.gen());
        self.generate_with(params, context, &mut tiebreak, &mut draws)
    }

    /// Generate one playlist with separate random sources for pool
    /// tiebreaks and slot draws.
    ///
    /// The result holds at most `params.length` distinct tracks, each
    /// passing every filter in `params`. It is shorter when a pool runs dry.
    /// Changes to the catalog only move the tiebreak stream; the draw
    /// stream stays the same.
    ///
    /// # Errors
    ///
    /// Catalog failures are propagated.
    pub fn generate_with<T, D>(
        &self,
        params: &GenerationParams,
        context: &ScoringContext,
        tiebreak: &mut T,
        draws: &mut D,
    ) -> Result<Playlist>
    where
        T: Rng + ?Sized,
        D: Rng + ?Sized,
    {
        let expansion =
            GenreResolver::new(self.genres, params.include_genre_aliases).expand(&params.genres);
        for token in &expansion.unresolved {
            warn!("Genre `{token}' is not in the taxonomy, matching it literally");
        }
        if let GenreScope::Only(names) = &expansion.scope {
            debug!("Genre scope covers {} names", names.len());
        }

        let filter = params.filter(expansion.scope);
        let pools = CandidatePoolFetcher::new(self.source, context)
            .fetch(&filter, params.length, tiebreak)?;

        let skeleton = SkeletonGenerator.generate(params.length);
        for role in Role::ALL {
            debug!(
                "Skeleton has {} `{role}' slots",
                skeleton.iter().filter(|r| **r == role).count()
            );
        }

        let entries = Selector::new(pools).select(&skeleton, draws);
        info!("Selected {} of {} tracks", entries.len(), params.length);

        Ok(Playlist {
            entries,
            unresolved_genres: expansion.unresolved,
        })
    }
}
