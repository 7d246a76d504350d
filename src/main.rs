//! # dailymix
//!
//! Builds "daily mix" playlists from a music catalog: well-rated tracks,
//! tracks worth hearing again, new arrivals and forgotten favourites,
//! mixed along a fixed role skeleton.
//!
//! ## Usage
//!
//! ```bash
//! # Load the catalog and the genre taxonomy
//! dailymix import-catalog export.json
//! dailymix import-genres ./mbdump
//!
//! # Generate every configured playlist
//! dailymix generate --output ~/playlists
//!
//! # Inspect one playlist without writing it
//! dailymix generate -p daily --print --dry-run
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use dailymix::catalog::GenreScope;
use dailymix::cli::{self, Command};
use dailymix::config::{self, Config, GenerationParams, PlaylistConfig};
use dailymix::db::Database;
use dailymix::genre::GenreResolver;
use dailymix::playlist::PlaylistGenerator;
use dailymix::scoring::ScoringContext;
use dailymix::{completion, import};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

/// Main entry point.
///
/// Logging is controlled with `RUST_LOG`:
/// - `RUST_LOG=debug dailymix generate` - Pool sizes and skeleton layout
/// - `RUST_LOG=dailymix::selector=debug dailymix generate` - Artist repeats
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        Command::Generate {
            config,
            db,
            playlists,
            seed,
            print,
            dry_run,
            output,
        } => {
            let options = GenerateOptions {
                config,
                db,
                only: playlists,
                seed,
                print,
                dry_run,
                output,
            };
            generate(&options)?;
        }
        Command::ImportCatalog { path, db } => {
            let export = import::read_catalog_export(&path)?;
            let mut database = Database::open(&resolve_db(db)?)?;
            database.replace_catalog(&export)?;
            println!("Imported {} tracks from {}", database.track_count()?, path.display());
        }
        Command::ImportGenres { dir, db } => {
            let taxonomy = import::import_musicbrainz_genres(&dir)?;
            let mut database = Database::open(&resolve_db(db)?)?;
            database.replace_genre_taxonomy(&taxonomy)?;
            println!("Imported {} genres from {}", taxonomy.len(), dir.display());
        }
        Command::Genres { tokens, db, no_aliases } => {
            let database = open_existing(&resolve_db(db)?)?;
            let taxonomy = database.load_genre_taxonomy()?;
            let expansion = GenreResolver::new(&taxonomy, !no_aliases).expand(&tokens);

            for token in &expansion.unresolved {
                eprintln!("warning: `{token}' is not a known genre or alias");
            }
            match expansion.scope {
                GenreScope::All => println!("(all genres)"),
                GenreScope::Only(names) => {
                    for name in names {
                        println!("{name}");
                    }
                }
            }
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let shell = completion::shell_to_completion_shell(&shell);
            completion::generate_completions(shell, &mut cmd);
        }
        Command::CompletionEnhanced { shell } => match shell {
            cli::Shell::Bash => print!("{}", completion::enhanced_bash_completion()),
            cli::Shell::Fish => print!("{}", completion::enhanced_fish_completion()),
            _ => bail!("Enhanced completions only supported for bash and fish"),
        },
        Command::CompleteGenres { db, plain } => {
            completion::print_genre_completions(db.as_deref(), plain)?;
        }
    }

    Ok(())
}

struct GenerateOptions {
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    only: Vec<String>,
    seed: Option<u64>,
    print: bool,
    dry_run: bool,
    output: Option<PathBuf>,
}

fn generate(options: &GenerateOptions) -> Result<()> {
    let config_path = match &options.config {
        Some(path) => path.clone(),
        None => config::get_config_path()?,
    };
    let config = Config::load(&config_path)?;

    // Every playlist is validated before the catalog is touched.
    let validated = config.validate()?;
    let selected = select_playlists(validated, &options.only)?;
    if selected.is_empty() {
        warn!("No playlists configured in {}", config_path.display());
        return Ok(());
    }

    let db_path = match &options.db {
        Some(path) => path.clone(),
        None => config.database_path()?,
    };
    let database = open_existing(&db_path)?;
    let taxonomy = database.load_genre_taxonomy()?;
    let generator = PlaylistGenerator::new(&database, &taxonomy);

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let context = ScoringContext::default();

    if let Some(dir) = &options.output {
        if !options.dry_run {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        }
    }

    for (playlist_config, params) in selected {
        info!("Generating playlist `{}'", playlist_config.id);
        let playlist = generator
            .generate(&params, &context, &mut rng)
            .with_context(|| format!("Failed to generate playlist `{}'", playlist_config.id))?;

        if playlist.len() < params.length {
            warn!(
                "Playlist `{}' has {} of {} tracks",
                playlist_config.id,
                playlist.len(),
                params.length
            );
        }
        if options.print {
            playlist.print(&playlist_config.name);
        }
        if options.dry_run {
            continue;
        }

        let json = serde_json::to_string_pretty(&playlist.export(playlist_config))?;
        match &options.output {
            Some(dir) => {
                let path = dir.join(format!("{}.json", playlist_config.id));
                fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {}", path.display());
            }
            None => println!("{json}"),
        }
    }

    Ok(())
}

/// Keep only the playlists named in `only`, in configuration order.
fn select_playlists<'a>(
    validated: Vec<(&'a PlaylistConfig, GenerationParams)>,
    only: &[String],
) -> Result<Vec<(&'a PlaylistConfig, GenerationParams)>> {
    if only.is_empty() {
        return Ok(validated);
    }
    if let Some(unknown) = only
        .iter()
        .find(|id| !validated.iter().any(|(p, _)| &p.id == *id))
    {
        bail!("No playlist with id `{unknown}' in the configuration");
    }
    Ok(validated
        .into_iter()
        .filter(|(p, _)| only.contains(&p.id))
        .collect())
}

fn resolve_db(db: Option<PathBuf>) -> Result<PathBuf> {
    match db {
        Some(path) => Ok(path),
        None => config::get_db_path(),
    }
}

fn open_existing(path: &Path) -> Result<Database> {
    if !path.exists() {
        bail!(
            "Catalog database {} does not exist. Run `dailymix import-catalog` first.",
            path.display()
        );
    }
    Database::open(path)
}
