//! # Shell Completion Module
//!
//! Plain completion scripts come from clap. The enhanced bash and fish
//! scripts also complete the tokens of `genres` with names from the
//! catalog database, by calling the hidden `complete-genres` command.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! dailymix completion bash > ~/.local/share/bash-completion/completions/dailymix
//!
//! # Generate fish completions with genre names
//! dailymix completion-enhanced fish > ~/.config/fish/completions/dailymix.fish
//! ```

use crate::config;
use crate::db::Database;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use log::debug;
use std::io;
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Enhanced fish completion script with genre name completion
pub fn enhanced_fish_completion() -> &'static str {
    r#"# Enhanced dailymix completion script for Fish shell with genre name completion
# Install with: dailymix completion-enhanced fish > ~/.config/fish/completions/dailymix.fish

function __dailymix_complete_genres
    if command -sq dailymix
        dailymix complete-genres --plain 2>/dev/null
    end
end

complete -c dailymix -e

complete -c dailymix -s h -l help -d 'Print help information'
complete -c dailymix -s V -l version -d 'Print version information'

complete -c dailymix -f -n '__fish_is_first_token' -a 'generate' -d 'Generate the configured playlists'
complete -c dailymix -f -n '__fish_is_first_token' -a 'import-catalog' -d 'Replace the catalog with a JSON export'
complete -c dailymix -f -n '__fish_is_first_token' -a 'import-genres' -d 'Replace the genre taxonomy with a MusicBrainz dump'
complete -c dailymix -f -n '__fish_is_first_token' -a 'genres' -d 'Show the genre names a set of tokens expands to'
complete -c dailymix -f -n '__fish_is_first_token' -a 'completion' -d 'Generate shell completions'
complete -c dailymix -f -n '__fish_is_first_token' -a 'completion-enhanced' -d 'Generate enhanced shell completions'

complete -c dailymix -n '__fish_seen_subcommand_from generate' -s c -l config -r -F -d 'Configuration file'
complete -c dailymix -n '__fish_seen_subcommand_from generate' -l db -r -F -d 'Catalog database'
complete -c dailymix -f -n '__fish_seen_subcommand_from generate' -s p -l playlist -r -d 'Playlist id'
complete -c dailymix -f -n '__fish_seen_subcommand_from generate' -l seed -r -d 'Random seed'
complete -c dailymix -f -n '__fish_seen_subcommand_from generate' -l print -d 'Print each playlist'
complete -c dailymix -f -n '__fish_seen_subcommand_from generate' -l dry-run -d 'Do not write exports'
complete -c dailymix -n '__fish_seen_subcommand_from generate' -s o -l output -r -a '(__fish_complete_directories)' -d 'Export directory'

complete -c dailymix -n '__fish_seen_subcommand_from import-catalog' -F -d 'JSON export'
complete -c dailymix -n '__fish_seen_subcommand_from import-genres' -a '(__fish_complete_directories)' -d 'mbdump directory'

complete -c dailymix -f -n '__fish_seen_subcommand_from genres' -a '(__dailymix_complete_genres)' -d 'Genre'
complete -c dailymix -f -n '__fish_seen_subcommand_from genres' -l no-aliases -d 'Ignore genre aliases'

complete -c dailymix -f -n '__fish_seen_subcommand_from completion' -a 'bash zsh fish power-shell elvish'
complete -c dailymix -f -n '__fish_seen_subcommand_from completion-enhanced' -a 'bash fish'
"#
}

/// Enhanced bash completion script with genre name completion
pub fn enhanced_bash_completion() -> &'static str {
    r#"#!/bin/bash
# Enhanced dailymix completion script with genre name completion
# Install with: dailymix completion-enhanced bash > ~/.local/share/bash-completion/completions/dailymix

_dailymix_complete_genres() {
    if command -v dailymix >/dev/null 2>&1; then
        dailymix complete-genres 2>/dev/null
    fi
}

_dailymix() {
    local cur prev words cword
    _init_completion || return

    case "${prev}" in
        --config|-c|--db)
            _filedir
            return 0
            ;;
        --output|-o)
            _filedir -d
            return 0
            ;;
        import-catalog)
            _filedir
            return 0
            ;;
        import-genres)
            _filedir -d
            return 0
            ;;
        completion)
            COMPREPLY=($(compgen -W "bash zsh fish power-shell elvish" -- "${cur}"))
            return 0
            ;;
        completion-enhanced)
            COMPREPLY=($(compgen -W "bash fish" -- "${cur}"))
            return 0
            ;;
    esac

    local subcommands="generate import-catalog import-genres genres completion completion-enhanced help"

    if [[ $cword -eq 1 ]]; then
        COMPREPLY=($(compgen -W "$subcommands --help --version" -- "${cur}"))
        return 0
    fi

    case "${words[1]}" in
        generate)
            COMPREPLY=($(compgen -W "--config --db --playlist --seed --print --dry-run --output --help" -- "${cur}"))
            ;;
        genres)
            if [[ "${cur}" == -* ]]; then
                COMPREPLY=($(compgen -W "--db --no-aliases --help" -- "${cur}"))
            else
                mapfile -t COMPREPLY < <(_dailymix_complete_genres | grep -i "^\"\{0,1\}${cur}")
            fi
            ;;
        *)
            COMPREPLY=($(compgen -W "--db --help" -- "${cur}"))
            ;;
    esac
} &&
complete -F _dailymix dailymix

# ex: filetype=sh
"#
}

/// Convert our Shell enum to clap_complete's Shell enum
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Genre names stored in the catalog database.
///
/// Completion must never fail loudly: a missing or unreadable database
/// yields an empty list.
pub fn get_genre_completions(db_path: Option<&Path>) -> Vec<String> {
    let path = match db_path {
        Some(path) => path.to_path_buf(),
        None => match config::get_db_path() {
            Ok(path) => path,
            Err(_) => return Vec::new(),
        },
    };
    if !path.exists() {
        return Vec::new();
    }

    match Database::open(&path).and_then(|db| db.genre_names()) {
        Ok(names) => names,
        Err(e) => {
            debug!("Genre completion unavailable: {e:#}");
            Vec::new()
        }
    }
}

/// Print genre names, one per line.
///
/// Unless `plain` is set, names containing whitespace are double-quoted
/// so a bash completion can insert them as one word.
pub fn print_genre_completions(db_path: Option<&Path>, plain: bool) -> Result<()> {
    for name in get_genre_completions(db_path) {
        if !plain && name.contains(char::is_whitespace) {
            println!("\"{}\"", name.replace('"', "\\\""));
        } else {
            println!("{name}");
        }
    }
    Ok(())
}
