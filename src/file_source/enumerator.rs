//! Sources of candidate file paths to feed the writer (§4.7). Directory
//! walking is delegated to the `ignore` crate, which already implements
//! gitignore-aware recursive traversal -- reimplementing that by hand would
//! just be a worse version of what the ecosystem provides.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub trait Enumerator: Send + Sync {
    fn enumerate(&self) -> Vec<PathBuf>;
}

/// Wraps an explicit, caller-supplied list of paths -- used for tests and
/// for callers that already have their own file discovery.
pub struct FixedListEnumerator {
    paths: Vec<PathBuf>,
}

impl FixedListEnumerator {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        FixedListEnumerator { paths: paths.into_iter().collect() }
    }
}

impl Enumerator for FixedListEnumerator {
    fn enumerate(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }
}

/// Recursively walks a directory tree, honoring `.gitignore`/`.ignore`
/// files the same way `ignore::WalkBuilder`'s other consumers do.
pub struct DirectoryEnumerator {
    root: PathBuf,
    follow_links: bool,
    respect_gitignore: bool,
}

impl DirectoryEnumerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryEnumerator {
            root: root.into(),
            follow_links: false,
            respect_gitignore: true,
        }
    }

    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }
}

impl Enumerator for DirectoryEnumerator {
    fn enumerate(&self) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .follow_links(self.follow_links)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(self.respect_gitignore);

        builder
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.into_path())
            .collect()
    }
}

/// A catalogue enumerator: a static manifest file listing paths one per
/// line, relative to its own directory. Used for indexing a fixed
/// distribution snapshot rather than walking a live tree.
pub struct CatalogueEnumerator {
    manifest_path: PathBuf,
}

impl CatalogueEnumerator {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        CatalogueEnumerator { manifest_path: manifest_path.into() }
    }
}

impl Enumerator for CatalogueEnumerator {
    fn enumerate(&self) -> Vec<PathBuf> {
        let Ok(contents) = std::fs::read_to_string(&self.manifest_path) else {
            return Vec::new();
        };
        let base: &Path = self.manifest_path.parent().unwrap_or_else(|| Path::new("."));
        contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| base.join(l))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_list_returns_exactly_what_was_given() {
        let enumerator = FixedListEnumerator::new([PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(enumerator.enumerate(), vec![PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn directory_enumerator_finds_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::write(dir.path().join("nested/b.txt"), "y").unwrap();

        let found = DirectoryEnumerator::new(dir.path()).enumerate();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn catalogue_enumerator_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("files.txt"), "a.rs\nsub/b.rs\n").unwrap();
        let found = CatalogueEnumerator::new(dir.path().join("files.txt")).enumerate();
        assert_eq!(found, vec![dir.path().join("a.rs"), dir.path().join("sub/b.rs")]);
    }
}
