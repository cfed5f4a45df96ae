//! Pure domain logic for checkpub.
//!
//! This crate implements the fuzzy path resolution at the heart of report
//! generation: a multi-key index over a repository tree snapshot, a
//! resolver that matches framework-reported paths against it, and the
//! format-policy flags parsed from the report's format string.
//!
//! No I/O happens here; everything is deterministic over its inputs.

use checkpub_types::TreeEntry;
use std::collections::{HashMap, HashSet};

// ============================================================================
// File Identity
// ============================================================================

/// Identity of one tree file, as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Repository path, forward-slash separated, as given by the tree.
    pub path: String,
    /// Bare filename (after the last separator).
    pub name: String,
    /// Content hash from the tree listing.
    pub sha: String,
    /// Whether the path is a member of the commit's changed-path set.
    pub in_commit: bool,
}

impl FileInfo {
    /// Build a file identity, extracting the bare name from the path.
    ///
    /// Both `/` and `\` count as separators: result paths can originate
    /// from a different OS than the repository host.
    pub fn new(path: &str, sha: &str, in_commit: bool) -> Self {
        let name = bare_name(path).to_string();
        Self {
            path: path.to_string(),
            name,
            sha: sha.to_string(),
            in_commit,
        }
    }
}

/// The substring after the last `/` or `\`, or the whole path if none.
fn bare_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(index) if index + 1 < path.len() => &path[index + 1..],
        Some(_) => path,
        None => path,
    }
}

/// Normalize `\` separators to `/` so key computation sees one alphabet.
fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

// ============================================================================
// Path Index
// ============================================================================

/// Multi-key lookup table over a tree snapshot.
///
/// Every entry is registered under its full path, its bare filename, every
/// suffix cut at each separator boundary, and its extension-stripped
/// filename. Frameworks report paths relative to their own source roots
/// (`src/main/java/...`) while the repository tree may be rooted elsewhere;
/// the suffix keys let the resolver find the longest common tail without
/// exact root alignment.
///
/// Last registration wins on key collision; no stronger guarantee than
/// "some matching entry" is made.
#[derive(Debug, Default)]
pub struct PathIndex {
    entries: Vec<FileInfo>,
    keys: HashMap<String, usize>,
}

impl PathIndex {
    /// Build the index from a tree listing and the commit path set.
    pub fn build(tree: &[TreeEntry], commit_paths: &HashSet<String>) -> Self {
        let mut index = PathIndex::default();
        for entry in tree {
            if entry.path.is_empty() {
                continue;
            }
            let in_commit = commit_paths.contains(&entry.path);
            let info = FileInfo::new(&entry.path, &entry.sha, in_commit);
            index.insert(info);
        }
        index
    }

    fn insert(&mut self, info: FileInfo) {
        let id = self.entries.len();
        let path = normalize(&info.path);

        self.register(info.path.clone(), id);
        if path != info.path {
            self.register(path.clone(), id);
        }
        self.register(info.name.clone(), id);

        // every suffix after each separator boundary
        let mut start = 0;
        while let Some(offset) = path[start..].find('/') {
            start += offset + 1;
            if start < path.len() {
                self.register(path[start..].to_string(), id);
            }
        }

        // the bare filename with its extension stripped
        let file_name = &path[start..];
        if let Some(dot) = file_name.find('.') {
            if dot > 0 {
                self.register(file_name[..dot].to_string(), id);
            }
        }

        self.entries.push(info);
    }

    fn register(&mut self, key: String, id: usize) {
        self.keys.insert(key, id);
    }

    /// Resolve a framework-reported path to a tree file.
    ///
    /// Tries the exact path first, then walks forward through separator
    /// boundaries trying each remaining suffix, then the final bare
    /// segment. Returns `None` when nothing in the tree matches.
    pub fn resolve(&self, raw_path: &str) -> Option<&FileInfo> {
        let path = normalize(raw_path);

        if let Some(info) = self.lookup(&path) {
            return Some(info);
        }

        let mut start = 0;
        while let Some(offset) = path[start..].find('/') {
            start += offset + 1;
            if start >= path.len() {
                break;
            }
            if let Some(info) = self.lookup(&path[start..]) {
                return Some(info);
            }
        }

        // covers zero-separator inputs and the final segment
        self.lookup(&path[start..])
    }

    fn lookup(&self, key: &str) -> Option<&FileInfo> {
        self.keys.get(key).map(|&id| &self.entries[id])
    }

    /// Number of indexed tree files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Format Policy
// ============================================================================

/// Independent formatting toggles parsed from the report's format string.
///
/// All suppressions default to off: show everything. Unknown tokens are
/// silently ignored so older publishers keep working against newer
/// adapters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format {
    /// Do not write failure/error text blocks for files outside the commit.
    pub no_details: bool,
    /// Suppress emoji in text blocks.
    pub no_emoji: bool,
    /// Drop notice-level results entirely.
    pub no_pass: bool,
    /// Annotate even files that are not part of the commit.
    pub always_annotate: bool,
    /// Never produce inline annotations.
    pub no_annotate: bool,
    /// Write text blocks for notice-level results too.
    pub pass_details: bool,
}

impl Format {
    /// Parse a comma-separated token list, case-insensitively.
    pub fn parse(value: &str) -> Format {
        let mut format = Format::default();
        if value.trim().is_empty() {
            return format;
        }
        for token in value.split(',') {
            match token.trim().to_lowercase().as_str() {
                "nodetails" => format.no_details = true,
                "noannotate" => format.no_annotate = true,
                "nonotice" | "nopass" => format.no_pass = true,
                "alwaysannotate" => format.always_annotate = true,
                "noemoji" => format.no_emoji = true,
                "alldetails" | "passdetails" => format.pass_details = true,
                _ => {
                    // ignored for forward compatibility
                }
            }
        }
        format
    }
}

// ============================================================================
// Tests
// ============================================================================
