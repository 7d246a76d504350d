//! Genre taxonomy and genre scope expansion.
//!
//! The taxonomy is a forest of genres stored as an arena: each node has a
//! canonical name, its aliases and the indices of its child genres.
//! Subgenre and fusion relations are both stored as parent→child edges.

use crate::catalog::{GenreLookup, GenreScope};
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Token that disables genre filtering.
pub const ALL_GENRES: &str = "all";

const MULTI_VALUE_SEPARATORS: [char; 3] = [';', ',', '|'];

/// Normalize a genre name, alias or user token.
///
/// Keeps only the first value of a multi-value tag, case-folds, turns
/// underscores into spaces, collapses whitespace runs and punctuation runs
/// and trims. Normalizing twice is the same as normalizing once.
///
/// ```
/// use dailymix::genre::normalize;
///
/// assert_eq!(normalize("  Hip__Hop "), "hip hop");
/// assert_eq!(normalize("Rock; Pop"), "rock");
/// assert_eq!(normalize("drum --& bass"), "drum - bass");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    let first = raw
        .split(MULTI_VALUE_SEPARATORS)
        .next()
        .unwrap_or_default();

    let mut out = String::with_capacity(first.len());
    let mut last: Option<char> = None;
    for c in first.trim().chars().flat_map(char::to_lowercase) {
        let c = if c == '_' { ' ' } else { c };
        if c.is_whitespace() {
            if !matches!(last, None | Some(' ')) {
                out.push(' ');
                last = Some(' ');
            }
        } else if c.is_ascii_punctuation() {
            if !last.is_some_and(|l| l.is_ascii_punctuation()) {
                out.push(c);
                last = Some(c);
            }
        } else {
            out.push(c);
            last = Some(c);
        }
    }

    out.truncate(out.trim_end().len());
    out
}

#[derive(Debug, Clone)]
struct GenreNode {
    name: String,
    aliases: Vec<String>,
    children: Vec<usize>,
}

/// In-memory genre taxonomy.
#[derive(Debug, Clone, Default)]
pub struct GenreTaxonomy {
    nodes: Vec<GenreNode>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl GenreTaxonomy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a genre, or return the existing one with the same normalized name.
    pub fn add_genre(&mut self, name: &str) -> usize {
        let name = normalize(name);
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(GenreNode {
            name: name.clone(),
            aliases: Vec::new(),
            children: Vec::new(),
        });
        self.by_name.insert(name, id);
        id
    }

    /// Attach an alias to `genre`. An alias already owned by a genre keeps
    /// its first owner; returns whether the alias was attached.
    pub fn add_alias(&mut self, genre: &str, alias: &str) -> bool {
        let alias = normalize(alias);
        if alias.is_empty() || self.by_alias.contains_key(&alias) {
            return false;
        }
        let id = self.add_genre(genre);
        if self.nodes[id].name == alias {
            return false;
        }
        self.nodes[id].aliases.push(alias.clone());
        self.by_alias.insert(alias, id);
        true
    }

    /// Record that `child` is a subgenre (or fusion) of `parent`.
    pub fn add_child(&mut self, parent: &str, child: &str) {
        let parent = self.add_genre(parent);
        let child = self.add_genre(child);
        if !self.nodes[parent].children.contains(&child) {
            self.nodes[parent].children.push(child);
        }
    }

    /// Canonical genre names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.iter().map(|n| n.name.clone()).collect();
        names.sort();
        names
    }

    /// All aliases as `(alias, canonical name)` pairs.
    #[must_use]
    pub fn alias_pairs(&self) -> Vec<(String, String)> {
        self.by_alias
            .iter()
            .map(|(alias, &id)| (alias.clone(), self.nodes[id].name.clone()))
            .collect()
    }

    /// All parent→child edges as name pairs.
    #[must_use]
    pub fn links(&self) -> Vec<(String, String)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.children
                    .iter()
                    .map(move |&child| (node.name.clone(), self.nodes[child].name.clone()))
            })
            .collect()
    }

    fn node(&self, name: &str) -> Option<&GenreNode> {
        self.by_name.get(name).map(|&id| &self.nodes[id])
    }
}

impl GenreLookup for GenreTaxonomy {
    fn is_genre(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    fn genre_for_alias(&self, alias: &str) -> Option<String> {
        self.by_alias.get(alias).map(|&id| self.nodes[id].name.clone())
    }

    fn subgenres(&self, name: &str) -> Vec<String> {
        self.node(name)
            .map(|node| {
                node.children
                    .iter()
                    .map(|&child| self.nodes[child].name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn aliases(&self, name: &str) -> Vec<String> {
        self.node(name).map(|node| node.aliases.clone()).unwrap_or_default()
    }
}

/// Result of expanding user genre tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreExpansion {
    pub scope: GenreScope,
    /// Normalized tokens that matched neither a genre nor an alias.
    /// They are still part of `scope` as exact filters.
    pub unresolved: Vec<String>,
}

/// Expands genre tokens into every name a matching track may carry.
pub struct GenreResolver<'a, L: GenreLookup + ?Sized> {
    lookup: &'a L,
    include_aliases: bool,
}

impl<'a, L: GenreLookup + ?Sized> GenreResolver<'a, L> {
    #[must_use]
    pub fn new(lookup: &'a L, include_aliases: bool) -> Self {
        Self {
            lookup,
            include_aliases,
        }
    }

    /// Expand `tokens` into a genre scope.
    ///
    /// No tokens, or any token normalizing to `"all"`, disables filtering.
    /// Otherwise each token resolves to a genre (directly or through an
    /// alias) whose name, aliases and every descendant are included.
    /// Unknown tokens are kept verbatim and reported in `unresolved`.
    pub fn expand<S: AsRef<str>>(&self, tokens: &[S]) -> GenreExpansion {
        let normalized: Vec<String> = tokens
            .iter()
            .map(|t| normalize(t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();

        if normalized.is_empty() || normalized.iter().any(|t| t == ALL_GENRES) {
            return GenreExpansion {
                scope: GenreScope::All,
                unresolved: Vec::new(),
            };
        }

        let mut names = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut unresolved = Vec::new();

        for token in normalized {
            let genre = if self.lookup.is_genre(&token) {
                Some(token.clone())
            } else {
                self.lookup.genre_for_alias(&token)
            };

            match genre {
                Some(genre) => {
                    trace!("Genre token `{token}' resolved to `{genre}'");
                    // The token itself may be an alias the user typed.
                    names.insert(token);
                    self.collect_descendants(genre, &mut names, &mut visited);
                }
                None => {
                    names.insert(token.clone());
                    if !unresolved.contains(&token) {
                        unresolved.push(token);
                    }
                }
            }
        }

        debug!("Genre scope expanded to {} names", names.len());
        GenreExpansion {
            scope: GenreScope::Only(names),
            unresolved,
        }
    }

    /// Walk `root` and its descendants. `visited` guards against cycles and
    /// against re-walking subtrees shared by several tokens.
    fn collect_descendants(
        &self,
        root: String,
        names: &mut BTreeSet<String>,
        visited: &mut HashSet<String>,
    ) {
        let mut stack = vec![root];
        while let Some(genre) = stack.pop() {
            if !visited.insert(genre.clone()) {
                continue;
            }
            if self.include_aliases {
                names.extend(self.lookup.aliases(&genre));
            }
            stack.extend(
                self.lookup
                    .subgenres(&genre)
                    .into_iter()
                    .filter(|child| !visited.contains(child)),
            );
            names.insert(genre);
        }
    }
}
