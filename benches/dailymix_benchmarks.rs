//! # dailymix Performance Benchmarks
//!
//! ## Benchmark Categories
//!
//! - **Scoring**: Interest and freshness scores
//! - **Skeleton**: Role layout for different lengths
//! - **Pools**: Candidate pool fetching over an in-memory catalog
//! - **Selection**: Filling a skeleton from fetched pools
//! - **Genres**: Taxonomy expansion
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench pools
//! ```

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use dailymix::catalog::{GenreScope, MemoryCatalog, Rating, Track, TrackFilter};
use dailymix::genre::{GenreResolver, GenreTaxonomy};
use dailymix::pools::CandidatePoolFetcher;
use dailymix::scoring::{freshness_score, interest_score, ScoringContext};
use dailymix::selector::Selector;
use dailymix::skeleton::SkeletonGenerator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

fn context() -> ScoringContext {
    ScoringContext::at(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

/// Catalog of `count` tracks with spread ratings, play counts and ages.
fn create_test_tracks(count: usize) -> Vec<Track> {
    let now = context().now;
    (0..count)
        .map(|i| Track {
            id: format!("tr{i:06}"),
            artist_id: format!("ar{}", i % 400),
            album_artist_id: format!("ar{}", i % 400),
            album_artist_name: format!("Artist {}", i % 400),
            album_name: format!("Album {}", i / 12),
            name: format!("Song {i}"),
            duration: 90 + (i as u32 * 31) % 400,
            year: 1970 + (i % 56) as i32,
            rating: Rating::clamped(1 + (i % 5) as i64),
            starred: i % 15 == 0,
            play_count: (i % 40) as u32,
            last_played: (i % 2 == 0).then(|| now - Duration::days((i % 1000) as i64)),
            created_at: now - Duration::days((i % 1500) as i64),
            genre_name: Some(["rock", "jazz", "pop", "electronic"][i % 4].to_string()),
        })
        .collect()
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

fn benchmark_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let tracks = create_test_tracks(1000);
    let context = context();

    group.bench_function("interest_1000", |b| {
        b.iter(|| {
            tracks
                .iter()
                .map(|t| interest_score(black_box(t), &context))
                .sum::<f64>()
        })
    });
    group.bench_function("freshness_1000", |b| {
        b.iter(|| {
            tracks
                .iter()
                .map(|t| freshness_score(black_box(t), &context))
                .sum::<f64>()
        })
    });

    group.finish();
}

fn benchmark_skeleton(c: &mut Criterion) {
    let mut group = c.benchmark_group("skeleton");
    for length in [20, 60, 500] {
        group.bench_with_input(BenchmarkId::new("generate", length), &length, |b, &length| {
            b.iter(|| SkeletonGenerator.generate(black_box(length)))
        });
    }
    group.finish();
}

fn benchmark_pools(c: &mut Criterion) {
    let mut group = c.benchmark_group("pools");
    let context = context();
    let filter = open_filter();

    for size in [1_000, 10_000] {
        let catalog = MemoryCatalog::new(create_test_tracks(size));
        group.bench_with_input(BenchmarkId::new("fetch", size), &catalog, |b, catalog| {
            let fetcher = CandidatePoolFetcher::new(catalog, &context);
            let mut rng = StdRng::seed_from_u64(1);
            b.iter(|| fetcher.fetch(black_box(&filter), 60, &mut rng))
        });
    }
    group.finish();
}

fn benchmark_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    let context = context();
    let catalog = MemoryCatalog::new(create_test_tracks(10_000));
    let mut rng = StdRng::seed_from_u64(2);
    let fetcher = CandidatePoolFetcher::new(&catalog, &context);
    let Ok(pools) = fetcher.fetch(&open_filter(), 60, &mut rng) else {
        return;
    };
    let skeleton = SkeletonGenerator.generate(60);

    group.bench_function("select_60", |b| {
        b.iter_batched(
            || pools.clone(),
            |pools| Selector::new(pools).select(black_box(&skeleton), &mut rng),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn benchmark_genre_expansion(c: &mut Criterion) {
    let mut taxonomy = GenreTaxonomy::new();
    for i in 0..200 {
        taxonomy.add_child("rock", &format!("rock {i}"));
        for j in 0..5 {
            taxonomy.add_child(&format!("rock {i}"), &format!("rock {i} {j}"));
        }
        taxonomy.add_alias(&format!("rock {i}"), &format!("r{i}"));
    }

    c.bench_function("expand_rock", |b| {
        let resolver = GenreResolver::new(&taxonomy, true);
        b.iter(|| resolver.expand(black_box(&["rock"][..])))
    });
}

criterion_group!(
    benches,
    benchmark_scoring,
    benchmark_skeleton,
    benchmark_pools,
    benchmark_selection,
    benchmark_genre_expansion
);

criterion_main!(benches);
