//! Playlist generation from a rated, play-counted music catalog.
//!
//! Core modules:
//! - [`scoring`] - Interest and freshness scores
//! - [`genre`] - Genre normalization and taxonomy expansion
//! - [`pools`] - Candidate pools, one per role
//! - [`skeleton`] - Role layout of a playlist
//! - [`selector`] - Random draws into the skeleton
//! - [`playlist`] - Generation driver and export
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - Track records and the store contracts
//! - [`db`] - SQLite catalog store
//! - [`import`] - Catalog export and MusicBrainz taxonomy import
//! - [`config`] - Configuration file and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use dailymix::config::{self, Config};
//! use dailymix::db::Database;
//! use dailymix::playlist::PlaylistGenerator;
//! use dailymix::scoring::ScoringContext;
//! use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let config = Config::load(&config::get_config_path()?)?;
//! let database = Database::open(&config.database_path()?)?;
//! let taxonomy = database.load_genre_taxonomy()?;
//!
//! let generator = PlaylistGenerator::new(&database, &taxonomy);
//! let mut rng = rand::thread_rng();
//! for (playlist, params) in config.validate()? {
//!     let mix = generator.generate(&params, &ScoringContext::default(), &mut rng)?;
//!     println!("{}: {:?}", playlist.id, mix.track_ids());
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod genre;
pub mod import;
pub mod playlist;
pub mod pools;
pub mod scoring;
pub mod selector;
pub mod skeleton;
