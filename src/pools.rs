//! # Candidate Pools
//!
//! One pool per [`Role`], each the top of a ranking over the tracks passing
//! the shared [`TrackFilter`]:
//!
//! - **interest**: highest [`interest_score`], `length / 2` tracks
//! - **freshness**: highest [`freshness_score`], `length / 2` tracks
//! - **back catalog**: oldest `last_played`, `length / 4` tracks, played
//!   tracks only
//! - **regular**: highest `random * rating`, `2 * length` tracks
//!
//! A track may sit in several pools at once; the selector removes it from
//! all of them once it is picked.
//!
//! Ties are broken with a random key drawn from the injected RNG, so a
//! seeded run always fetches the same pools.

use crate::catalog::{Role, ScoredTrack, Track, TrackFilter, TrackSource};
use crate::scoring::{freshness_score, interest_score, ScoringContext};
use anyhow::{Context, Result};
use log::debug;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Tracks of one role keyed by track id.
///
/// Ordered by id so that a draw at a given index is reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPool(BTreeMap<String, ScoredTrack>);

impl TrackPool {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn insert(&mut self, track: ScoredTrack) {
        self.0.insert(track.track.id.clone(), track);
    }

    pub fn remove(&mut self, id: &str) -> Option<ScoredTrack> {
        self.0.remove(id)
    }

    /// Track at `index` in id order.
    #[must_use]
    pub fn nth(&self, index: usize) -> Option<&ScoredTrack> {
        self.0.values().nth(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredTrack> {
        self.0.values()
    }
}

impl FromIterator<ScoredTrack> for TrackPool {
    fn from_iter<I: IntoIterator<Item = ScoredTrack>>(iter: I) -> Self {
        let mut pool = Self::default();
        for track in iter {
            pool.insert(track);
        }
        pool
    }
}

/// The four pools of one generation run.
///
/// Owned by a single run: the selector takes them by value and mutates them
/// as tracks are picked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePools {
    pub regular: TrackPool,
    pub interest: TrackPool,
    pub freshness: TrackPool,
    pub back_catalog: TrackPool,
}

impl CandidatePools {
    /// Pool supplying slots of `role`.
    #[must_use]
    pub fn pool(&self, role: Role) -> &TrackPool {
        match role {
            Role::Regular => &self.regular,
            Role::Interest => &self.interest,
            Role::Freshness => &self.freshness,
            Role::BackCatalog => &self.back_catalog,
        }
    }

    pub fn pool_mut(&mut self, role: Role) -> &mut TrackPool {
        match role {
            Role::Regular => &mut self.regular,
            Role::Interest => &mut self.interest,
            Role::Freshness => &mut self.freshness,
            Role::BackCatalog => &mut self.back_catalog,
        }
    }

    /// First role whose pool is empty, in [`Role::ALL`] order.
    ///
    /// Any empty pool ends selection, whichever role the next slot needs.
    #[must_use]
    pub fn exhausted_role(&self) -> Option<Role> {
        Role::ALL.into_iter().find(|&role| self.pool(role).is_empty())
    }

    /// Remove a track from every pool.
    pub fn remove_everywhere(&mut self, id: &str) {
        for role in Role::ALL {
            self.pool_mut(role).remove(id);
        }
    }
}

/// Pool sizes for a playlist of `length` tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub regular: usize,
    pub interest: usize,
    pub freshness: usize,
    pub back_catalog: usize,
}

impl PoolLimits {
    /// Half the length for interest and freshness, a quarter for back
    /// catalog and twice the length for regular, rounded down.
    ///
    /// Below four tracks the back-catalog limit is zero, so such playlists
    /// come out empty.
    ///
    /// ```
    /// use dailymix::pools::PoolLimits;
    ///
    /// let limits = PoolLimits::for_length(10);
    /// assert_eq!((limits.interest, limits.back_catalog, limits.regular), (5, 2, 20));
    /// ```
    #[must_use]
    pub fn for_length(length: usize) -> Self {
        Self {
            regular: length * 2,
            interest: length / 2,
            freshness: length / 2,
            back_catalog: length / 4,
        }
    }
}

/// Builds the four candidate pools from a [`TrackSource`].
///
/// The source is queried once per [`fetch`](Self::fetch); every ranking then
/// runs in memory over the same candidate list, scored against one
/// [`ScoringContext`].
pub struct CandidatePoolFetcher<'a, S: TrackSource + ?Sized> {
    source: &'a S,
    context: &'a ScoringContext,
}

impl<'a, S: TrackSource + ?Sized> CandidatePoolFetcher<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, context: &'a ScoringContext) -> Self {
        Self { source, context }
    }

    /// Fetch all four pools for a playlist of `length` tracks.
    ///
    /// # Errors
    ///
    /// Fails only when the source fails. Empty pools are not an error.
    pub fn fetch<R: Rng + ?Sized>(
        &self,
        filter: &TrackFilter,
        length: usize,
        rng: &mut R,
    ) -> Result<CandidatePools> {
        let candidates = self
            .source
            .matching_tracks(filter)
            .context("Failed to query candidate tracks from the catalog")?;
        debug!("{} tracks pass the playlist filter", candidates.len());

        let limits = PoolLimits::for_length(length);
        let pools = CandidatePools {
            interest: self.by_interest(&candidates, limits.interest, rng),
            freshness: self.by_freshness(&candidates, limits.freshness, rng),
            back_catalog: self.by_last_played(&candidates, limits.back_catalog, rng),
            regular: self.rating_weighted(&candidates, limits.regular, rng),
        };

        for role in Role::ALL {
            debug!("Pool `{role}': {} tracks", pools.pool(role).len());
        }
        Ok(pools)
    }

    /// Top `limit` tracks by interest score: well rated, starred, and not
    /// played to death.
    pub fn by_interest<R: Rng + ?Sized>(
        &self,
        candidates: &[Track],
        limit: usize,
        rng: &mut R,
    ) -> TrackPool {
        self.top_by(candidates, Role::Interest, limit, rng, |scored, _| scored.interest)
    }

    /// Top `limit` tracks by freshness score: recently added, recently
    /// released, and rarely played.
    pub fn by_freshness<R: Rng + ?Sized>(
        &self,
        candidates: &[Track],
        limit: usize,
        rng: &mut R,
    ) -> TrackPool {
        self.top_by(candidates, Role::Freshness, limit, rng, |scored, _| scored.freshness)
    }

    /// The `limit` tracks played longest ago. Never-played tracks are not
    /// eligible.
    pub fn by_last_played<R: Rng + ?Sized>(
        &self,
        candidates: &[Track],
        limit: usize,
        rng: &mut R,
    ) -> TrackPool {
        let mut ranked: Vec<(ScoredTrack, f64)> = candidates
            .iter()
            .filter(|track| track.last_played.is_some())
            .map(|track| (self.score(track, Role::BackCatalog), rng.gen::<f64>()))
            .collect();

        ranked.sort_by(|(a, a_tie), (b, b_tie)| {
            a.track
                .last_played
                .cmp(&b.track.last_played)
                .then_with(|| a_tie.total_cmp(b_tie))
        });

        ranked.into_iter().take(limit).map(|(scored, _)| scored).collect()
    }

    /// `limit` tracks in a rating-weighted shuffle: ordered by
    /// `random * rating`, descending.
    ///
    /// Every candidate can make the cut, but a 5-star track's key is drawn
    /// from a range five times wider than a 1-star track's.
    pub fn rating_weighted<R: Rng + ?Sized>(
        &self,
        candidates: &[Track],
        limit: usize,
        rng: &mut R,
    ) -> TrackPool {
        self.top_by(candidates, Role::Regular, limit, rng, |scored, tie| {
            tie * f64::from(scored.track.rating.get())
        })
    }

    /// Rank descending by `key(scored, random)`, random tiebreak, keep `limit`.
    fn top_by<R, F>(
        &self,
        candidates: &[Track],
        role: Role,
        limit: usize,
        rng: &mut R,
        key: F,
    ) -> TrackPool
    where
        R: Rng + ?Sized,
        F: Fn(&ScoredTrack, f64) -> f64,
    {
        let mut ranked: Vec<(ScoredTrack, f64, f64)> = candidates
            .iter()
            .map(|track| {
                let scored = self.score(track, role);
                let tie = rng.gen::<f64>();
                let rank = key(&scored, tie);
                (scored, rank, tie)
            })
            .collect();

        ranked.sort_by(|(_, a, a_tie), (_, b, b_tie)| {
            b.partial_cmp(a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a_tie.total_cmp(b_tie))
        });

        ranked.into_iter().take(limit).map(|(scored, _, _)| scored).collect()
    }

    fn score(&self, track: &Track, role: Role) -> ScoredTrack {
        ScoredTrack {
            track: track.clone(),
            role,
            interest: interest_score(track, self.context),
            freshness: freshness_score(track, self.context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::track;
    use crate::catalog::{GenreScope, MemoryCatalog, Rating};
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn context() -> ScoringContext {
        ScoringContext::at(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
    }

    fn filter() -> TrackFilter {
        TrackFilter {
            min_duration: 60,
            max_duration: 600,
            min_rating: Rating::clamped(1),
            title_exclude: None,
            genres: GenreScope::All,
        }
    }

    #[test]
    fn test_pool_limits() {
        assert_eq!(
            PoolLimits::for_length(60),
            PoolLimits {
                regular: 120,
                interest: 30,
                freshness: 30,
                back_catalog: 15
            }
        );
        assert_eq!(PoolLimits::for_length(4).back_catalog, 1);
        assert_eq!(PoolLimits::for_length(3).back_catalog, 0);
        assert_eq!(PoolLimits::for_length(1).interest, 0);
    }

    #[test]
    fn test_tiny_length_fetches_no_back_catalog() {
        let context = context();
        let tracks: Vec<Track> = (0..20)
            .map(|i| {
                let mut t = track(&i.to_string(), "a");
                t.last_played = Some(context.now - Duration::days(i));
                t
            })
            .collect();
        let source = MemoryCatalog::new(tracks);
        let fetcher = CandidatePoolFetcher::new(&source, &context);

        let pools = fetcher.fetch(&filter(), 1, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(pools.regular.len(), 2);
        assert!(pools.interest.is_empty());
        assert!(pools.back_catalog.is_empty());
        assert_eq!(pools.exhausted_role(), Some(Role::Interest));
    }

    #[test]
    fn test_freshness_pool_prefers_new_recent_unplayed() {
        let context = context();
        let mut tracks: Vec<Track> = (0..10)
            .map(|i| {
                let mut t = track(&format!("old{i}"), "a");
                t.created_at = context.now - Duration::days(800);
                t.year = 1975;
                t.play_count = 30;
                t
            })
            .collect();
        for id in ["new1", "new2"] {
            let mut t = track(id, "b");
            t.created_at = context.now - Duration::days(2);
            t.year = 2025;
            t.play_count = 0;
            tracks.push(t);
        }

        let source = MemoryCatalog::default();
        let fetcher = CandidatePoolFetcher::new(&source, &context);
        for seed in 0..5 {
            let pool = fetcher.by_freshness(&tracks, 2, &mut StdRng::seed_from_u64(seed));
            assert!(pool.contains("new1") && pool.contains("new2"));
            assert!(pool.iter().all(|t| t.role == Role::Freshness));
        }
    }

    #[test]
    fn test_regular_pool_favours_high_ratings() {
        let context = context();
        let tracks: Vec<Track> = (0..100)
            .map(|i| {
                let mut t = track(&format!("{i:03}"), "a");
                t.rating = Rating::clamped(if i < 50 { 5 } else { 1 });
                t
            })
            .collect();

        let source = MemoryCatalog::default();
        let fetcher = CandidatePoolFetcher::new(&source, &context);
        let (mut five, mut one) = (0, 0);
        for seed in 0..20 {
            let pool = fetcher.rating_weighted(&tracks, 10, &mut StdRng::seed_from_u64(seed));
            assert_eq!(pool.len(), 10);
            for t in pool.iter() {
                if t.track.rating.get() == 5 {
                    five += 1;
                } else {
                    one += 1;
                }
            }
        }
        // A 1-star key never exceeds 1, a 5-star key does 80% of the time.
        assert!(five > one * 5, "5-star: {five}, 1-star: {one}");
    }

    #[test]
    fn test_equal_scores_are_broken_by_the_rng() {
        let context = context();
        let tracks: Vec<Track> = (0..30).map(|i| track(&i.to_string(), "a")).collect();
        let source = MemoryCatalog::default();
        let fetcher = CandidatePoolFetcher::new(&source, &context);
        let ids = |seed| {
            fetcher
                .by_interest(&tracks, 5, &mut StdRng::seed_from_u64(seed))
                .iter()
                .map(|t| t.track.id.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(ids(1), ids(1));
        let distinct: std::collections::HashSet<_> = (0..6).map(ids).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_interest_pool_keeps_highest_scores() {
        let context = context();
        let mut tracks: Vec<Track> = (0..10).map(|i| track(&i.to_string(), "a")).collect();
        tracks[3].rating = Rating::clamped(5);
        tracks[3].starred = true;
        tracks[7].rating = Rating::clamped(5);

        let source = MemoryCatalog::default();
        let fetcher = CandidatePoolFetcher::new(&source, &context);
        let mut rng = StdRng::seed_from_u64(7);
        let pool = fetcher.by_interest(&tracks, 2, &mut rng);

        assert_eq!(pool.len(), 2);
        assert!(pool.contains("3"));
        assert!(pool.contains("7"));
        assert!(pool.iter().all(|t| t.role == Role::Interest));
    }

    #[test]
    fn test_back_catalog_excludes_never_played() {
        let context = context();
        let mut tracks: Vec<Track> = (0..6).map(|i| track(&i.to_string(), "a")).collect();
        tracks[1].last_played = Some(context.now - Duration::days(400));
        tracks[2].last_played = Some(context.now - Duration::days(3));
        tracks[4].last_played = Some(context.now - Duration::days(90));

        let source = MemoryCatalog::default();
        let fetcher = CandidatePoolFetcher::new(&source, &context);
        let mut rng = StdRng::seed_from_u64(1);

        let pool = fetcher.by_last_played(&tracks, 2, &mut rng);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains("1"));
        assert!(pool.contains("4"));

        let all = fetcher.by_last_played(&tracks, 10, &mut rng);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_regular_pool_is_limited_and_scored() {
        let context = context();
        let tracks: Vec<Track> = (0..50).map(|i| track(&i.to_string(), "a")).collect();
        let source = MemoryCatalog::new(tracks);
        let fetcher = CandidatePoolFetcher::new(&source, &context);
        let mut rng = StdRng::seed_from_u64(3);

        let pools = fetcher.fetch(&filter(), 10, &mut rng).unwrap();
        assert_eq!(pools.regular.len(), 20);
        assert_eq!(pools.interest.len(), 5);
        assert_eq!(pools.freshness.len(), 5);
        // Nothing has been played yet.
        assert!(pools.back_catalog.is_empty());
        assert_eq!(pools.exhausted_role(), Some(Role::BackCatalog));

        let sample = pools.regular.nth(0).unwrap();
        assert_eq!(sample.interest, interest_score(&sample.track, &context));
        assert_eq!(sample.freshness, freshness_score(&sample.track, &context));
    }

    #[test]
    fn test_same_seed_same_pools() {
        let context = context();
        let tracks: Vec<Track> = (0..40).map(|i| track(&i.to_string(), "a")).collect();
        let source = MemoryCatalog::new(tracks);
        let fetcher = CandidatePoolFetcher::new(&source, &context);

        let first = fetcher.fetch(&filter(), 8, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = fetcher.fetch(&filter(), 8, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_remove_everywhere() {
        let context = context();
        let source = MemoryCatalog::default();
        let fetcher = CandidatePoolFetcher::new(&source, &context);
        let t = fetcher.score(&track("x", "a"), Role::Interest);

        let mut pools = CandidatePools::default();
        pools.interest.insert(t.clone());
        pools.regular.insert(ScoredTrack { role: Role::Regular, ..t });
        pools.remove_everywhere("x");
        assert!(pools.interest.is_empty());
        assert!(pools.regular.is_empty());
    }
}
