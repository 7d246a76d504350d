//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `dailymix` binary.
//!
//! ## Commands
//!
//! - `generate`: Build every configured playlist and write the exports
//! - `import-catalog`: Load a catalog JSON export into the database
//! - `import-genres`: Load the MusicBrainz genre taxonomy dump
//! - `genres`: Preview how genre tokens expand
//! - `completion`: Print a shell completion script
//!
//! ## Examples
//!
//! ```bash
//! dailymix import-catalog export.json
//! dailymix import-genres ./mbdump
//! dailymix generate --print --output ~/playlists
//! dailymix genres rock "hip hop"
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "dailymix")]
#[command(about = "dailymix: rating, novelty and rediscovery driven playlists")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the configured playlists
    ///
    /// Validates the whole configuration first, then builds each playlist
    /// and writes one `<id>.json` export per playlist. Without `--output`
    /// the exports are printed to stdout.
    Generate {
        /// Configuration file (defaults to the platform config directory)
        #[arg(short, long, env = "DAILYMIX_CONFIG", value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,

        /// Catalog database, overriding the configuration
        #[arg(long, env = "DAILYMIX_DB", value_hint = clap::ValueHint::FilePath)]
        db: Option<PathBuf>,

        /// Only generate the playlists with these ids (repeatable)
        #[arg(short, long = "playlist", value_name = "ID")]
        playlists: Vec<String>,

        /// Seed the random source for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Print each playlist with its roles and scores
        #[arg(long)]
        print: bool,

        /// Generate without writing any export
        #[arg(long)]
        dry_run: bool,

        /// Directory receiving the `<id>.json` exports
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: Option<PathBuf>,
    },

    /// Replace the catalog with a JSON export
    ///
    /// The export holds `artists`, `albums` and `tracks` arrays with
    /// Subsonic field names. Existing artists, albums and tracks are
    /// removed; the genre taxonomy is kept.
    ImportCatalog {
        /// Path to the JSON export
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,

        /// Catalog database (defaults to the platform data directory)
        #[arg(long, env = "DAILYMIX_DB", value_hint = clap::ValueHint::FilePath)]
        db: Option<PathBuf>,
    },

    /// Replace the genre taxonomy with a MusicBrainz dump
    ///
    /// Reads the `genre`, `genre_alias` and `l_genre_genre` files of an
    /// extracted `mbdump` directory.
    ImportGenres {
        /// Directory holding the dump files
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: PathBuf,

        /// Catalog database (defaults to the platform data directory)
        #[arg(long, env = "DAILYMIX_DB", value_hint = clap::ValueHint::FilePath)]
        db: Option<PathBuf>,
    },

    /// Show the genre names a set of tokens expands to
    Genres {
        /// Genre names or aliases
        #[arg(required = true)]
        tokens: Vec<String>,

        /// Catalog database (defaults to the platform data directory)
        #[arg(long, env = "DAILYMIX_DB", value_hint = clap::ValueHint::FilePath)]
        db: Option<PathBuf>,

        /// Do not include genre aliases in the expansion
        #[arg(long)]
        no_aliases: bool,
    },

    /// Generate shell completions
    ///
    /// Usage: dailymix completion bash > ~/.local/share/bash-completion/completions/dailymix
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// Generate enhanced completion with genre name completion
    ///
    /// The script completes the tokens of `genres` with the genre names
    /// stored in the catalog database.
    ///
    /// Usage: dailymix completion-enhanced fish > ~/.config/fish/completions/dailymix.fish
    CompletionEnhanced {
        /// Shell to generate enhanced completions for (bash and fish)
        shell: Shell,
    },

    /// List genre names for completion (hidden command)
    #[command(hide = true)]
    CompleteGenres {
        #[arg(long, env = "DAILYMIX_DB")]
        db: Option<PathBuf>,

        /// One raw name per line, without shell quoting
        #[arg(long)]
        plain: bool,
    },
}
