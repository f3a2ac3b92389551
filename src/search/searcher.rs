//! Evaluates a parsed [`Query`] against one field of the index and scores
//! the matches with tf-idf (§4.4, §9: BM25 dropped, only tf-idf remains in
//! scope). Boolean combinators operate over per-document match sets keyed
//! by `(segment_index, local_doc_id)`, since that pair is the only stable
//! document identity once more than one segment exists.

use crate::core::types::DocId;
use crate::core::utils::like_pattern_to_regex;
use crate::query::ast::Query;
use crate::reader::index_reader::IndexReader;
use crate::schema::schema::{self, SearchType};
use crate::search::highlighter;
use crate::search::results::{ScoredHit, SearchResults, TopKCollector};
use regex::RegexBuilder;
use std::collections::HashMap;

/// Bytes of surrounding source text kept on each side of a highlighted
/// match (§4.5); this engine has no per-highlighter configuration surface.
const CONTEXT_RADIUS: usize = 40;

/// One entry of a directory filter (§4.4): `pattern` is a VB `Like`
/// pattern matched against a document's containing directory, not its
/// full path. `recursive` widens the match to subdirectories; `exclusive`
/// turns the entry into a veto rather than an inclusion criterion.
#[derive(Debug, Clone)]
pub struct DirectoryFilter {
    pub pattern: String,
    pub recursive: bool,
    pub exclusive: bool,
}

impl DirectoryFilter {
    pub fn new(pattern: impl Into<String>, recursive: bool, exclusive: bool) -> Self {
        DirectoryFilter { pattern: pattern.into(), recursive, exclusive }
    }

    /// Appends a trailing separator when absent, then (if `recursive`) a
    /// trailing `*` so subdirectories of the pattern also match, exactly
    /// the normalization §4.4 describes.
    fn normalized_pattern(&self) -> String {
        let mut p = self.pattern.clone();
        if !p.ends_with('/') && !p.ends_with('\\') {
            p.push('/');
        }
        if self.recursive {
            p.push('*');
        }
        p
    }

    fn matches(&self, directory: &str) -> bool {
        match like_pattern_to_regex(&self.normalized_pattern()) {
            Ok(re) => re.is_match(directory),
            Err(_) => false,
        }
    }
}

/// Directory portion of `path`, with a trailing separator, for matching
/// against normalized [`DirectoryFilter`] patterns.
fn containing_directory(path: &str) -> String {
    let dir = match path.rfind(['/', '\\']) {
        Some(idx) => &path[..=idx],
        None => "",
    };
    dir.to_string()
}

/// §4.4's combination rule: included iff the set of non-exclusive entries
/// that match is non-empty (or no non-exclusive entries exist at all) AND
/// no exclusive entry matches. An empty filter list passes everything
/// (§8: "Directory filter with empty pattern list: all documents pass").
pub fn passes_directory_filters(path: &str, filters: &[DirectoryFilter]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let directory = containing_directory(path);
    let (inclusive, exclusive): (Vec<_>, Vec<_>) = filters.iter().partition(|f| !f.exclusive);
    let included = inclusive.is_empty() || inclusive.iter().any(|f| f.matches(&directory));
    let excluded = exclusive.iter().any(|f| f.matches(&directory));
    included && !excluded
}

#[derive(Debug, Clone, Default)]
struct DocMatch {
    positions: Vec<u32>,
    score: f32,
}

type MatchSet = HashMap<(usize, u32), DocMatch>;

pub struct Searcher<'a> {
    reader: &'a IndexReader,
}

impl<'a> Searcher<'a> {
    pub fn new(reader: &'a IndexReader) -> Self {
        Searcher { reader }
    }

    /// Runs `query` against `search_type`'s field (case-sensitive or its
    /// case-insensitive companion, per §4.4), optionally restricted by
    /// `directory_filters` (§4.4's `{pattern, recursive, exclusive}` list,
    /// combined per its inclusion/veto rule), and returns the top `limit`
    /// hits by tf-idf score alongside the total match count. Each hit's
    /// occurrences are computed by re-reading the matched document's text
    /// (the file at its stored path for Contents/Tags, the path string
    /// itself for Path) and scanning it for the query's literal terms --
    /// `Contents`/`Tags` aren't stored fields, so there is no indexed text
    /// to highlight against directly.
    pub fn search(
        &self,
        query: &Query,
        search_type: SearchType,
        case_sensitive: bool,
        directory_filters: &[DirectoryFilter],
        limit: usize,
    ) -> crate::core::error::Result<SearchResults> {
        let field = search_type.field_for(case_sensitive);
        let universe_size = self.universe_size(search_type);
        let matches = self.evaluate(query, field, universe_size, case_sensitive);

        let literal_terms = literal_terms(query);

        let mut collector = TopKCollector::new(limit);
        let mut total_hits = 0usize;
        for ((segment_index, doc_value), doc_match) in matches {
            let doc_id = DocId(doc_value);
            if self.reader.is_deleted(self.reader.segments()[segment_index].id, doc_id) {
                continue;
            }
            if !self.passes_directory_filter(segment_index, doc_id, directory_filters) {
                continue;
            }
            total_hits += 1;
            let occurrences = self.highlight(segment_index, doc_id, search_type, case_sensitive, &literal_terms);
            collector.offer(ScoredHit {
                segment_index,
                doc_id,
                score: doc_match.score,
                occurrences,
            });
        }
        Ok(SearchResults {
            hits: collector.into_sorted(),
            total_hits,
        })
    }

    /// Locates occurrences of `terms` within the matched document's text.
    /// `Path` searches highlight the in-memory path string; `Contents` and
    /// `Tags` searches re-read the source file from disk, since neither
    /// field is stored. A file that can no longer be read (moved, deleted
    /// since indexing) yields no occurrences rather than an error.
    fn highlight(
        &self,
        segment_index: usize,
        doc_id: DocId,
        search_type: SearchType,
        case_sensitive: bool,
        terms: &[String],
    ) -> Vec<crate::search::results::Occurrence> {
        if terms.is_empty() {
            return Vec::new();
        }
        let Some(doc) = self.reader.segments().get(segment_index).and_then(|s| s.document(doc_id)) else {
            return Vec::new();
        };
        let text = match search_type {
            SearchType::Path => doc.get(schema::PATH).and_then(|v| v.as_text()).map(str::to_string),
            SearchType::Contents | SearchType::Tags => doc
                .get(schema::PATH)
                .or_else(|| doc.get(schema::TAG_SOURCE_PATH))
                .and_then(|v| v.as_text())
                .and_then(|path| std::fs::read_to_string(path).ok()),
        };
        let Some(text) = text else { return Vec::new() };
        highlight_literal_terms(&text, terms, case_sensitive, CONTEXT_RADIUS)
    }

    fn passes_directory_filter(&self, segment_index: usize, doc_id: DocId, filters: &[DirectoryFilter]) -> bool {
        if filters.is_empty() {
            return true;
        }
        self.reader
            .segments()
            .get(segment_index)
            .and_then(|s| s.document(doc_id))
            .and_then(|d| d.get(schema::PATH))
            .and_then(|v| v.as_text())
            .map(|path| passes_directory_filters(path, filters))
            .unwrap_or(false)
    }

    /// `Path`, `Contents` and `Tags` postings are all recorded against the
    /// owning file's doc-id (tag documents carry no postings of their own),
    /// so every search type's tf-idf universe is the file population.
    fn universe_size(&self, _search_type: SearchType) -> usize {
        self.reader.files().len()
    }

    fn evaluate(&self, query: &Query, field: &str, universe_size: usize, case_sensitive: bool) -> MatchSet {
        match query {
            Query::Term(term) => self.term_matches(term, field, universe_size),
            Query::Phrase(words) => self.phrase_matches(words, field, universe_size),
            Query::And(parts) => {
                let mut sets = parts.iter().map(|p| self.evaluate(p, field, universe_size, case_sensitive));
                let first = sets.next().unwrap_or_default();
                sets.fold(first, |acc, next| intersect(acc, next))
            }
            Query::Or(parts) => parts
                .iter()
                .map(|p| self.evaluate(p, field, universe_size, case_sensitive))
                .fold(MatchSet::new(), union),
            Query::Not(inner) => {
                let excluded = self.evaluate(inner, field, universe_size, case_sensitive);
                let mut universe = self.field_universe();
                for key in excluded.keys() {
                    universe.remove(key);
                }
                universe
            }
            Query::Field(name, inner) => {
                // An unrecognized field name is a valid query that matches
                // nothing (§7: semantic field errors aren't parse errors).
                match schema::resolve_field_name(name, case_sensitive) {
                    Some(resolved) => self.evaluate(inner, resolved, universe_size, case_sensitive),
                    None => MatchSet::new(),
                }
            }
        }
    }

    /// Every live file document -- `Path`/`Extension`/`Contents*`/`Tags*`
    /// are all posted against the owning file's doc-id, so `NOT` always
    /// subtracts from the file population, regardless of which field is
    /// being searched.
    fn field_universe(&self) -> MatchSet {
        let mut universe = MatchSet::new();
        for (segment_index, segment) in self.reader.segments().iter().enumerate() {
            for doc in segment.documents() {
                if !doc.is_tag_document() && !self.reader.is_deleted(segment.id, doc.id) {
                    universe.insert((segment_index, doc.id.value()), DocMatch::default());
                }
            }
        }
        universe
    }

    /// Expands `term` (possibly a wildcard pattern) against `field_index`'s
    /// term dictionary. `term` is folded to lowercase first when `field` is
    /// one of the case-insensitive variants, since those postings are
    /// themselves indexed lowercase -- otherwise an uppercase query term
    /// would never match anything.
    fn matching_terms<'t>(&self, field_index: &'t crate::index::inverted::FieldIndex, field: &str, term: &str) -> Vec<String> {
        let term = if schema::is_case_insensitive_field(field) {
            term.to_lowercase()
        } else {
            term.to_string()
        };
        if !Query::contains_wildcard(&term) {
            return vec![term];
        }
        if let Some(prefix) = term.strip_suffix('*').filter(|p| !p.contains('*') && !p.contains('?')) {
            return field_index.terms_with_prefix(prefix).map(String::from).collect();
        }
        let pattern = crate::core::utils::glob_to_regex(&term);
        match pattern {
            Ok(regex) => field_index.terms_matching(&regex).map(String::from).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn term_matches(&self, term: &str, field: &str, universe_size: usize) -> MatchSet {
        let mut set = MatchSet::new();
        for (segment_index, segment) in self.reader.segments().iter().enumerate() {
            let Some(field_index) = segment.field(field) else { continue };
            for matched_term in self.matching_terms(field_index, field, term) {
                let Some(postings) = field_index.postings(&matched_term) else { continue };
                let df = postings.doc_freq().max(1);
                let idf = ((universe_size as f32 + 1.0) / df as f32).ln() + 1.0;
                for posting in postings.postings() {
                    if self.reader.is_deleted(segment.id, posting.doc_id) {
                        continue;
                    }
                    let entry = set.entry((segment_index, posting.doc_id.value())).or_default();
                    entry.positions.extend(posting.positions.iter().copied());
                    entry.score += posting.term_freq as f32 * idf;
                }
            }
        }
        set
    }

    fn phrase_matches(&self, words: &[String], field: &str, universe_size: usize) -> MatchSet {
        let mut set = MatchSet::new();
        let words: Vec<String> = if schema::is_case_insensitive_field(field) {
            words.iter().map(|w| w.to_lowercase()).collect()
        } else {
            words.to_vec()
        };
        let Some(first_word) = words.first() else { return set };
        for (segment_index, segment) in self.reader.segments().iter().enumerate() {
            let Some(field_index) = segment.field(field) else { continue };
            let Some(first_postings) = field_index.postings(first_word) else { continue };
            let df = first_postings.doc_freq().max(1);
            let idf = ((universe_size as f32 + 1.0) / df as f32).ln() + 1.0;

            for posting in first_postings.postings() {
                if self.reader.is_deleted(segment.id, posting.doc_id) {
                    continue;
                }
                let mut hits = Vec::new();
                for &start in &posting.positions {
                    let aligned = words.iter().enumerate().skip(1).all(|(offset, word)| {
                        field_index
                            .postings(word)
                            .and_then(|p| p.get(posting.doc_id))
                            .map(|p| p.positions.contains(&(start + offset as u32)))
                            .unwrap_or(false)
                    });
                    if aligned {
                        hits.push(start);
                    }
                }
                if !hits.is_empty() {
                    let entry = set.entry((segment_index, posting.doc_id.value())).or_default();
                    let tf = hits.len() as f32;
                    entry.positions.extend(hits);
                    entry.score += tf * idf * words.len() as f32;
                }
            }
        }
        set
    }
}

/// Flattens a query into the literal strings worth highlighting: each plain
/// term and each phrase joined back into one string. Wildcard terms and
/// negated subtrees are skipped -- there's no single literal substring a
/// wildcard matches, and highlighting what a query excluded would be
/// misleading.
fn literal_terms(query: &Query) -> Vec<String> {
    match query {
        Query::Term(term) if !Query::contains_wildcard(term) => vec![term.clone()],
        Query::Term(_) => Vec::new(),
        Query::Phrase(words) => vec![words.join(" ")],
        Query::And(parts) | Query::Or(parts) => parts.iter().flat_map(literal_terms).collect(),
        Query::Not(_) => Vec::new(),
        Query::Field(_, inner) => literal_terms(inner),
    }
}

/// Scans `text` for each of `terms` as a whole-word match and runs every
/// byte offset found through [`highlighter::highlight`] for line/column and
/// context. Occurrences end up sorted by position across all terms.
fn highlight_literal_terms(text: &str, terms: &[String], case_sensitive: bool, context_radius: usize) -> Vec<crate::search::results::Occurrence> {
    let mut spans = Vec::new();
    for term in terms {
        let pattern = format!(r"\b{}\b", regex::escape(term));
        let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(!case_sensitive).build() else { continue };
        spans.extend(re.find_iter(text).map(|m| (m.start(), m.end())));
    }
    spans.sort_unstable();
    spans.dedup();
    highlighter::highlight(text, &spans, context_radius)
}

fn intersect(mut a: MatchSet, b: MatchSet) -> MatchSet {
    a.retain(|key, _| b.contains_key(key));
    for (key, value) in &mut a {
        if let Some(other) = b.get(key) {
            value.score += other.score;
            value.positions.extend(other.positions.iter().copied());
        }
    }
    a
}

fn union(mut a: MatchSet, b: MatchSet) -> MatchSet {
    for (key, value) in b {
        let entry = a.entry(key).or_default();
        entry.score += value.score;
        entry.positions.extend(value.positions);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::IndexConfig;
    use crate::query::parser;
    use crate::storage::layout::IndexLayout;
    use crate::writer::index_writer::IndexWriter;
    use chrono::{TimeZone, Utc};

    fn build_index(dir: &std::path::Path) {
        let config = IndexConfig::default().with_storage_path(dir);
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut writer = IndexWriter::open_or_create(&config).unwrap();
        writer.add("/src/main.rs", now, 1, "fn main() { println(); }").unwrap();
        writer.add("/src/lib.rs", now, 1, "fn helper() { println(); }").unwrap();
        writer.add("/docs/readme.md", now, 1, "no code here").unwrap();
        writer.commit().unwrap();
    }

    #[test]
    fn and_query_requires_all_terms() {
        let dir = tempfile::tempdir().unwrap();
        build_index(dir.path());
        let layout = IndexLayout::new(dir.path());
        let reader = IndexReader::open(&layout).unwrap();
        let searcher = Searcher::new(&reader);

        let query = parser::parse("fn main").unwrap();
        let results = searcher
            .search(&query, SearchType::Contents, true, &[], 10)
            .unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.total_hits, 1);
    }

    #[test]
    fn or_query_matches_either_file() {
        let dir = tempfile::tempdir().unwrap();
        build_index(dir.path());
        let layout = IndexLayout::new(dir.path());
        let reader = IndexReader::open(&layout).unwrap();
        let searcher = Searcher::new(&reader);

        let query = parser::parse("main OR helper").unwrap();
        let results = searcher
            .search(&query, SearchType::Contents, true, &[], 10)
            .unwrap();
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.total_hits, 2);
    }

    #[test]
    fn directory_filter_restricts_to_matching_paths() {
        let dir = tempfile::tempdir().unwrap();
        build_index(dir.path());
        let layout = IndexLayout::new(dir.path());
        let reader = IndexReader::open(&layout).unwrap();
        let searcher = Searcher::new(&reader);

        let query = parser::parse("fn").unwrap();
        let results = searcher
            .search(&query, SearchType::Contents, true, &[DirectoryFilter::new("/docs", true, false)], 10)
            .unwrap();
        assert!(results.hits.is_empty());
    }

    #[test]
    fn phrase_query_requires_adjacent_terms() {
        let dir = tempfile::tempdir().unwrap();
        build_index(dir.path());
        let layout = IndexLayout::new(dir.path());
        let reader = IndexReader::open(&layout).unwrap();
        let searcher = Searcher::new(&reader);

        let query = parser::parse("\"fn main\"").unwrap();
        let results = searcher
            .search(&query, SearchType::Contents, true, &[], 10)
            .unwrap();
        assert_eq!(results.hits.len(), 1);

        let query = parser::parse("\"main fn\"").unwrap();
        let results = searcher
            .search(&query, SearchType::Contents, true, &[], 10)
            .unwrap();
        assert!(results.hits.is_empty());
    }

    #[test]
    fn field_scoped_term_overrides_the_search_type_field() {
        let dir = tempfile::tempdir().unwrap();
        build_index(dir.path());
        let layout = IndexLayout::new(dir.path());
        let reader = IndexReader::open(&layout).unwrap();
        let searcher = Searcher::new(&reader);

        // A `Contents` search scoped to `Path:` should match on the path
        // text, not the file contents, even though the outer search type
        // is `Contents`.
        let query = parser::parse("Path:lib").unwrap();
        let results = searcher
            .search(&query, SearchType::Contents, true, &[], 10)
            .unwrap();
        assert_eq!(results.hits.len(), 1);

        let unknown_field = parser::parse("NoSuchField:fn").unwrap();
        let empty = searcher
            .search(&unknown_field, SearchType::Contents, true, &[], 10)
            .unwrap();
        assert!(empty.hits.is_empty());
    }
}
