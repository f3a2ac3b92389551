//! Composable file-path filters, applied after enumeration to decide which
//! discovered paths actually get indexed (§4.7).

use crate::core::utils::like_pattern_to_regex;
use regex::Regex;
use std::path::Path;

pub trait FileFilter: Send + Sync {
    fn accepts(&self, path: &Path) -> bool;
}

/// Accepts a path if it matches a VB `Like` wildcard pattern (`?`, `*`,
/// `#`, `[set]`).
pub struct WildcardFilter {
    pattern: Regex,
}

impl WildcardFilter {
    pub fn new(pattern: &str) -> crate::core::error::Result<Self> {
        Ok(WildcardFilter { pattern: like_pattern_to_regex(pattern)? })
    }
}

impl FileFilter for WildcardFilter {
    fn accepts(&self, path: &Path) -> bool {
        path.to_str().map(|s| self.pattern.is_match(s)).unwrap_or(false)
    }
}

pub struct RegexFilter {
    pattern: Regex,
}

impl RegexFilter {
    pub fn new(pattern: &str) -> crate::core::error::Result<Self> {
        Ok(RegexFilter { pattern: Regex::new(pattern)? })
    }
}

impl FileFilter for RegexFilter {
    fn accepts(&self, path: &Path) -> bool {
        path.to_str().map(|s| self.pattern.is_match(s)).unwrap_or(false)
    }
}

pub struct AndFilter {
    filters: Vec<Box<dyn FileFilter>>,
}

impl AndFilter {
    pub fn new(filters: Vec<Box<dyn FileFilter>>) -> Self {
        AndFilter { filters }
    }
}

impl FileFilter for AndFilter {
    fn accepts(&self, path: &Path) -> bool {
        self.filters.iter().all(|f| f.accepts(path))
    }
}

pub struct OrFilter {
    filters: Vec<Box<dyn FileFilter>>,
}

impl OrFilter {
    pub fn new(filters: Vec<Box<dyn FileFilter>>) -> Self {
        OrFilter { filters }
    }
}

impl FileFilter for OrFilter {
    fn accepts(&self, path: &Path) -> bool {
        self.filters.iter().any(|f| f.accepts(path))
    }
}

pub struct NotFilter {
    inner: Box<dyn FileFilter>,
}

impl NotFilter {
    pub fn new(inner: Box<dyn FileFilter>) -> Self {
        NotFilter { inner }
    }
}

impl FileFilter for NotFilter {
    fn accepts(&self, path: &Path) -> bool {
        !self.inner.accepts(path)
    }
}

/// Accepts every path; the default when the caller supplies no filter.
pub struct PassThroughFilter;

impl FileFilter for PassThroughFilter {
    fn accepts(&self, _path: &Path) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_filter_matches_extension() {
        let filter = WildcardFilter::new("*.rs").unwrap();
        assert!(filter.accepts(Path::new("src/main.rs")));
        assert!(!filter.accepts(Path::new("src/main.py")));
    }

    #[test]
    fn not_filter_inverts_inner_result() {
        let inner = WildcardFilter::new("*.rs").unwrap();
        let filter = NotFilter::new(Box::new(inner));
        assert!(!filter.accepts(Path::new("a.rs")));
        assert!(filter.accepts(Path::new("a.py")));
    }

    #[test]
    fn and_or_compose_filters() {
        let rs = Box::new(WildcardFilter::new("*.rs").unwrap());
        let py = Box::new(WildcardFilter::new("*.py").unwrap());
        let either: Vec<Box<dyn FileFilter>> = vec![rs, py];
        let or_filter = OrFilter::new(either);
        assert!(or_filter.accepts(Path::new("a.rs")));
        assert!(or_filter.accepts(Path::new("a.py")));
        assert!(!or_filter.accepts(Path::new("a.md")));
    }
}
