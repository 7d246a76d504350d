//! # Slot Selection Module
//!
//! Draws tracks into skeleton slots.
//!
//! A rejection sampler with a bounded budget: each slot draws up to
//! [`MAX_DRAWS`] times from its role's pool, trying to avoid the artist of
//! the previous track, and keeps the last draw when every attempt collides.
//!
//! ## Rules
//!
//! - Before each slot, the run stops if **any** pool is empty, not only
//!   the pool of the slot's role. The playlist is then shorter than the
//!   skeleton and the truncation is logged at `info` level.
//! - Draws are uniform over the remaining tracks of the pool.
//! - A selected track leaves every pool, so no track appears twice.
//! - The first slot has no previous artist and takes its first draw.
//!
//! ## Example
//!
//! ```
//! use dailymix::pools::CandidatePools;
//! use dailymix::selector::Selector;
//! use dailymix::skeleton::SkeletonGenerator;
//! use rand::SeedableRng;
//!
//! let mut selector = Selector::new(CandidatePools::default());
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let playlist = selector.select(&SkeletonGenerator.generate(20), &mut rng);
//! assert!(playlist.is_empty());
//! ```

use crate::catalog::{Role, ScoredTrack};
use crate::pools::CandidatePools;
use log::{debug, info};
use rand::Rng;

/// Draws per slot before accepting an artist repeat.
pub const MAX_DRAWS: usize = 3;

/// Owns the pools for the duration of one run.
///
/// Pools shrink as tracks are selected; a `Selector` is built per
/// playlist and dropped afterwards.
#[derive(Debug)]
pub struct Selector {
    pools: CandidatePools,
}

impl Selector {
    /// Take ownership of freshly fetched pools.
    #[must_use]
    pub fn new(pools: CandidatePools) -> Self {
        Self { pools }
    }

    /// What is left of the pools.
    #[must_use]
    pub fn pools(&self) -> &CandidatePools {
        &self.pools
    }

    /// Fill `skeleton` slot by slot.
    ///
    /// Stops as soon as any pool is empty; the result is then shorter than
    /// the skeleton. A selected track is removed from every pool.
    ///
    /// # Arguments
    ///
    /// * `skeleton` - Role of each slot, in playlist order
    /// * `rng` - Source of the slot draws
    ///
    /// # Returns
    ///
    /// The selected tracks in slot order, each tagged with its slot's role.
    pub fn select<R: Rng + ?Sized>(
        &mut self,
        skeleton: &[Role],
        rng: &mut R,
    ) -> Vec<ScoredTrack> {
        let mut playlist: Vec<ScoredTrack> = Vec::with_capacity(skeleton.len());

        for (index, &role) in skeleton.iter().enumerate() {
            if let Some(exhausted) = self.pools.exhausted_role() {
                info!(
                    "Pool `{exhausted}' exhausted at slot {index}, playlist truncated to {} tracks",
                    playlist.len()
                );
                break;
            }

            let previous_artist = playlist.last().map(|t| t.track.artist_id.as_str());
            let Some(track) = self.draw(role, previous_artist, rng) else {
                break;
            };

            self.pools.remove_everywhere(&track.track.id);
            playlist.push(track);
        }

        playlist
    }

    /// One slot: up to [`MAX_DRAWS`] uniform draws, stopping at the first
    /// track whose artist differs from `previous_artist`.
    fn draw<R: Rng + ?Sized>(
        &self,
        role: Role,
        previous_artist: Option<&str>,
        rng: &mut R,
    ) -> Option<ScoredTrack> {
        let pool = self.pools.pool(role);
        if pool.is_empty() {
            return None;
        }

        let mut candidate = None;
        for _ in 0..MAX_DRAWS {
            let drawn = pool.nth(rng.gen_range(0..pool.len()))?;
            let repeat = previous_artist == Some(drawn.track.artist_id.as_str());
            candidate = Some(drawn);
            if !repeat {
                break;
            }
        }

        let track = candidate?;
        if previous_artist == Some(track.track.artist_id.as_str()) {
            debug!(
                "Accepting artist repeat `{}' for a {role} slot after {MAX_DRAWS} draws",
                track.track.artist_id
            );
        }
        Some(track.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::track;
    use crate::pools::TrackPool;
    use crate::skeleton::SkeletonGenerator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn scored(id: &str, artist: &str, role: Role) -> ScoredTrack {
        ScoredTrack {
            track: track(id, artist),
            role,
            interest: 1.0,
            freshness: 1.0,
        }
    }

    fn pool(role: Role, prefix: &str, count: usize, artists: usize) -> TrackPool {
        (0..count)
            .map(|i| scored(&format!("{prefix}{i}"), &format!("artist{}", i % artists), role))
            .collect()
    }

    fn full_pools() -> CandidatePools {
        CandidatePools {
            regular: pool(Role::Regular, "r", 200, 17),
            interest: pool(Role::Interest, "i", 50, 7),
            freshness: pool(Role::Freshness, "f", 50, 5),
            back_catalog: pool(Role::BackCatalog, "b", 25, 3),
        }
    }

    #[test]
    fn test_fills_every_slot_with_unique_tracks() {
        let skeleton = SkeletonGenerator.generate(60);
        let mut selector = Selector::new(full_pools());
        let playlist = selector.select(&skeleton, &mut StdRng::seed_from_u64(9));

        assert_eq!(playlist.len(), 60);
        let ids: HashSet<_> = playlist.iter().map(|t| t.track.id.clone()).collect();
        assert_eq!(ids.len(), 60);
        for (slot, track) in skeleton.iter().zip(&playlist) {
            assert_eq!(*slot, track.role);
        }
    }

    #[test]
    fn test_selected_tracks_leave_all_pools() {
        let shared = scored("shared", "x", Role::Interest);
        let mut pools = full_pools();
        pools.interest = std::iter::once(shared.clone()).collect();
        pools.interest.insert(scored("other", "y", Role::Interest));
        pools.regular.insert(ScoredTrack { role: Role::Regular, ..shared });

        let mut selector = Selector::new(pools);
        let playlist = selector.select(&[Role::Interest], &mut StdRng::seed_from_u64(0));
        let picked = &playlist[0].track.id;

        assert!(!selector.pools().regular.contains(picked));
        assert!(!selector.pools().interest.contains(picked));
    }

    #[test]
    fn test_truncates_when_special_pool_drains() {
        let mut pools = full_pools();
        pools.interest = pool(Role::Interest, "i", 1, 1);
        pools.freshness = pool(Role::Freshness, "f", 1, 1);
        pools.back_catalog = pool(Role::BackCatalog, "b", 1, 1);

        let skeleton = SkeletonGenerator.generate(30);
        let mut selector = Selector::new(pools);
        let playlist = selector.select(&skeleton, &mut StdRng::seed_from_u64(5));

        // Slot 0 drains the interest pool, slot 1 sees it empty.
        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist[0].track.id, "i0");
    }

    #[test]
    fn test_empty_special_pools_yield_empty_playlist() {
        let pools = CandidatePools {
            regular: pool(Role::Regular, "r", 10, 3),
            ..CandidatePools::default()
        };
        let skeleton = SkeletonGenerator.generate(10);
        let playlist = Selector::new(pools).select(&skeleton, &mut StdRng::seed_from_u64(1));
        assert!(playlist.is_empty());
    }

    #[test]
    fn test_single_artist_pool_relaxes_repeat() {
        let mut pools = full_pools();
        pools.regular = pool(Role::Regular, "r", 10, 1);

        let mut selector = Selector::new(pools);
        let mut rng = StdRng::seed_from_u64(2);
        let playlist = selector.select(&[Role::Regular, Role::Regular], &mut rng);

        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist[0].track.artist_id, playlist[1].track.artist_id);
        assert_ne!(playlist[0].track.id, playlist[1].track.id);
    }

    #[test]
    fn test_avoids_repeat_when_alternative_is_likely() {
        // Two artists, many tracks each: with three draws a repeat needs
        // three collisions in a row, so over many slots most avoid it.
        let mut pools = full_pools();
        pools.regular = pool(Role::Regular, "r", 400, 2);
        let skeleton = vec![Role::Regular; 100];

        let mut selector = Selector::new(pools);
        let playlist = selector.select(&skeleton, &mut StdRng::seed_from_u64(11));
        let repeats = playlist
            .windows(2)
            .filter(|w| w[0].track.artist_id == w[1].track.artist_id)
            .count();
        assert!(repeats < 40, "too many repeats: {repeats}");
    }

    #[test]
    fn test_same_seed_same_playlist() {
        let skeleton = SkeletonGenerator.generate(40);
        let ids = |seed| {
            Selector::new(full_pools())
                .select(&skeleton, &mut StdRng::seed_from_u64(seed))
                .into_iter()
                .map(|t| t.track.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(3), ids(3));
    }
}
