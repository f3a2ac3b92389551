//! Per-field term dictionaries and the inverted index that aggregates them.
//! Terms accumulate in a sorted `BTreeMap` while a segment is being built
//! (insertion order doesn't matter, lookup order does); on commit each
//! field's dictionary can be frozen into an `fst::Map` for compact prefix
//! and wildcard enumeration, mirroring the teacher's FST-backed term
//! dictionary design.

use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::posting::PostingList;
use fst::{IntoStreamer, Map, MapBuilder, Streamer};
use regex::Regex;
use std::collections::BTreeMap;
use std::collections::HashMap;

/// A fully-qualified term: which field it was indexed under, and its text
/// after analysis (already case-folded if the field is case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    pub field: String,
    pub text: String,
}

impl Term {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Term {
            field: field.into(),
            text: text.into(),
        }
    }
}

/// The term dictionary and postings for a single field.
#[derive(Default)]
pub struct FieldIndex {
    terms: BTreeMap<String, PostingList>,
}

impl FieldIndex {
    pub fn new() -> Self {
        FieldIndex { terms: BTreeMap::new() }
    }

    pub fn record(&mut self, term: &str, doc_id: DocId, position: u32) {
        self.terms
            .entry(term.to_string())
            .or_insert_with(PostingList::new)
            .record(doc_id, position);
    }

    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term)
    }

    pub fn doc_freq(&self, term: &str) -> usize {
        self.terms.get(term).map(|p| p.doc_freq()).unwrap_or(0)
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn remove_doc(&mut self, doc_id: DocId) {
        for postings in self.terms.values_mut() {
            postings.remove_doc(doc_id);
        }
    }

    /// Terms in `[prefix, prefix+maxchar)`, i.e. those starting with `prefix`.
    /// Backs trailing-wildcard queries (`foo*`).
    pub fn terms_with_prefix<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.terms
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.as_str())
    }

    /// Terms matching an arbitrary anchored regex. Used for leading-wildcard
    /// (`*foo`) and infix-wildcard (`f*o`) queries where a prefix range scan
    /// doesn't help -- §4.4 explicitly allows leading wildcards.
    pub fn terms_matching<'a>(&'a self, pattern: &Regex) -> impl Iterator<Item = &'a str> + 'a {
        self.terms
            .iter()
            .filter(move |(k, _)| pattern.is_match(k))
            .map(|(k, _)| k.as_str())
    }

    /// Freezes the sorted term set into an FST for compact storage and fast
    /// membership/prefix queries against a persisted segment. The FST maps
    /// each term to its ordinal position in `self.terms`' iteration order,
    /// which the caller uses to look up the matching `PostingList`.
    pub fn build_fst(&self) -> Result<Map<Vec<u8>>> {
        let mut builder = MapBuilder::memory();
        for (ordinal, term) in self.terms.keys().enumerate() {
            builder.insert(term, ordinal as u64)?;
        }
        Ok(Map::new(builder.into_inner()?)?)
    }

    pub fn encode_postings(&self) -> Vec<(String, Vec<u8>)> {
        self.terms
            .iter()
            .map(|(term, postings)| (term.clone(), postings.encode()))
            .collect()
    }

    /// Reconstructs a field's dictionary from the `(term, encoded postings)`
    /// pairs a persisted segment stores, decoding each posting list in full
    /// rather than replaying it token-by-token through `record`.
    pub fn from_encoded(entries: &[(String, Vec<u8>)]) -> Result<Self> {
        let mut terms = BTreeMap::new();
        for (term, bytes) in entries {
            terms.insert(term.clone(), PostingList::decode(bytes)?);
        }
        Ok(FieldIndex { terms })
    }
}

/// Aggregates a [`FieldIndex`] per indexed field. One instance backs a
/// single segment's in-progress term space.
pub struct InvertedIndex {
    fields: HashMap<String, FieldIndex>,
}

impl InvertedIndex {
    pub fn new(field_names: &[&str]) -> Self {
        let mut fields = HashMap::new();
        for &name in field_names {
            fields.insert(name.to_string(), FieldIndex::new());
        }
        InvertedIndex { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldIndex> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> &mut FieldIndex {
        self.fields.entry(name.to_string()).or_insert_with(FieldIndex::new)
    }

    pub fn remove_doc(&mut self, doc_id: DocId) {
        for field in self.fields.values_mut() {
            field.remove_doc(doc_id);
        }
    }

    pub fn clear(&mut self) {
        for field in self.fields.values_mut() {
            field.terms.clear();
        }
    }
}

/// Enumerates the terms an FST maps, in sorted order, pairing each with its
/// assigned ordinal. Used when reconstituting postings from a persisted
/// segment's FST + posting blob.
pub fn fst_terms(map: &Map<Vec<u8>>) -> Vec<(String, u64)> {
    let mut stream = map.stream();
    let mut out = Vec::new();
    while let Some((term, ordinal)) = stream.next() {
        out.push((String::from_utf8_lossy(term).into_owned(), ordinal));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_looks_up_postings() {
        let mut idx = FieldIndex::new();
        idx.record("fn", DocId(0), 0);
        idx.record("main", DocId(0), 1);
        idx.record("fn", DocId(1), 0);
        assert_eq!(idx.doc_freq("fn"), 2);
        assert_eq!(idx.doc_freq("main"), 1);
        assert_eq!(idx.doc_freq("missing"), 0);
    }

    #[test]
    fn prefix_scan_finds_matching_terms() {
        let mut idx = FieldIndex::new();
        for term in ["format", "for", "foreach", "fn", "format!"] {
            idx.record(term, DocId(0), 0);
        }
        let mut hits: Vec<&str> = idx.terms_with_prefix("for").collect();
        hits.sort();
        assert_eq!(hits, vec!["for", "foreach", "format", "format!"]);
    }

    #[test]
    fn regex_scan_finds_leading_wildcard_matches() {
        let mut idx = FieldIndex::new();
        for term in ["unwrap", "rewrap", "wrap", "wrapper"] {
            idx.record(term, DocId(0), 0);
        }
        let pattern = Regex::new("^.*wrap$").unwrap();
        let mut hits: Vec<&str> = idx.terms_matching(&pattern).collect();
        hits.sort();
        assert_eq!(hits, vec!["rewrap", "unwrap", "wrap"]);
    }

    #[test]
    fn fst_round_trips_term_set() {
        let mut idx = FieldIndex::new();
        idx.record("alpha", DocId(0), 0);
        idx.record("beta", DocId(0), 0);
        idx.record("gamma", DocId(0), 0);
        let map = idx.build_fst().unwrap();
        let terms = fst_terms(&map);
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].0, "alpha");
    }

    #[test]
    fn remove_doc_clears_postings_for_that_doc_everywhere() {
        let mut index = InvertedIndex::new(&["Contents"]);
        index.field_mut("Contents").record("fn", DocId(0), 0);
        index.field_mut("Contents").record("fn", DocId(1), 0);
        index.remove_doc(DocId(0));
        assert_eq!(index.field("Contents").unwrap().doc_freq("fn"), 1);
    }
}
