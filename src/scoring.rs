//! Track scoring along the "interest" and "freshness" axes.
//!
//! Both scores are plain functions of a [`Track`] and a [`ScoringContext`].
//! Every factor sits on a bounded logarithmic scale so no single input can
//! dominate. All logarithms are natural; only relative ordering matters.

use crate::catalog::Track;
use chrono::{DateTime, Datelike, Utc};

/// Scoring parameters plus the clock the run is evaluated against.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub now: DateTime<Utc>,
    /// Interest multiplier bonus for starred tracks.
    pub starred_boost: f64,
    /// Play counts above this stop lowering the score.
    pub play_count_cap: u32,
    /// Catalog age (days) above which a track is no longer "new".
    pub catalog_age_cap_days: i64,
    /// Release age (years) above which a track is no longer "recent".
    pub release_age_cap_years: i32,
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl ScoringContext {
    /// Default parameters evaluated at a fixed instant.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            starred_boost: 1.2,
            play_count_cap: 10,
            catalog_age_cap_days: 365,
            release_age_cap_years: 5,
        }
    }
}

/// Interest score.
///
/// ```text
/// interest = ln(rating) * (1 + 1.2 * starred) + play_count_term
/// ```
///
/// # Examples
///
/// ```
/// use dailymix::scoring::{interest_score, ScoringContext};
/// # use dailymix::catalog::{Rating, Track};
/// # use chrono::Utc;
/// # let base = Track {
/// #     id: "1".into(), artist_id: "a".into(), album_artist_id: "a".into(),
/// #     album_artist_name: "A".into(), album_name: "B".into(), name: "T".into(),
/// #     duration: 200, year: 2020, rating: Rating::clamped(5), starred: true,
/// #     play_count: 0, last_played: None, created_at: Utc::now(), genre_name: None,
/// # };
/// let context = ScoringContext::default();
/// let loved = base.clone();
/// let meh = Track { rating: Rating::clamped(2), starred: false, ..base };
/// assert!(interest_score(&loved, &context) > interest_score(&meh, &context));
/// ```
#[must_use]
pub fn interest_score(track: &Track, context: &ScoringContext) -> f64 {
    // Rating is clamped to 1..=5 upstream, so ln never sees zero.
    let rating = f64::from(track.rating.get().max(1));
    let starred = if track.starred { 1.0 } else { 0.0 };

    rating.ln() * (1.0 + context.starred_boost * starred)
        + play_count_term(track.play_count, context.play_count_cap)
}

/// Freshness score.
///
/// ```text
/// freshness = (1 + (ln(366) - ln(1 + days_in_catalog)) / ln(365))
///           + (1 + ln(6) - ln(1 + years_since_release))
///           + play_count_term
/// ```
///
/// `days_in_catalog` is clamped to `0..=365` and `years_since_release` to
/// `0..=5`; an unknown release year counts as the oldest.
#[must_use]
pub fn freshness_score(track: &Track, context: &ScoringContext) -> f64 {
    catalog_age_term(track, context)
        + release_age_term(track, context)
        + play_count_term(track.play_count, context.play_count_cap)
}

/// `1 + ln(cap + 1) - ln(1 + min(play_count, cap))`: 1 at the cap, larger below it.
#[inline]
fn play_count_term(play_count: u32, cap: u32) -> f64 {
    let cap_f = f64::from(cap);
    1.0 + (cap_f + 1.0).ln() - (1.0 + f64::from(play_count.min(cap))).ln()
}

#[inline]
fn catalog_age_term(track: &Track, context: &ScoringContext) -> f64 {
    let cap = context.catalog_age_cap_days as f64;
    let days = (context.now - track.created_at)
        .num_days()
        .clamp(0, context.catalog_age_cap_days) as f64;

    1.0 + ((cap + 1.0).ln() - (1.0 + days).ln()) / cap.ln()
}

#[inline]
fn release_age_term(track: &Track, context: &ScoringContext) -> f64 {
    let cap = context.release_age_cap_years;
    let years = if track.year > 0 {
        (context.now.year() - track.year).clamp(0, cap)
    } else {
        cap
    };

    1.0 + (f64::from(cap) + 1.0).ln() - (1.0 + f64::from(years)).ln()
}
