//! `IndexWriter`: the single-writer entry point for adding, updating and
//! removing files (§4.2). One mutable [`Segment`] accumulates documents; a
//! `commit` freezes and persists it and starts a fresh one. Four analysis
//! streams (Contents, ContentsCaseInsensitive, Tags, TagsCaseInsensitive)
//! run in parallel per file via `rayon::join`, with tag extraction routed
//! through a `crossbeam` channel so tag-document materialization doesn't
//! need to re-tokenize the file.

use crate::analysis::analyzer::AnalyzerRegistry;
use crate::analysis::tokenizer::{TagTokenizer, Tokenizer};
use crate::core::config::IndexConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document, FieldValue};
use crate::schema::schema::{self, FILE_FIELDS, TAG_FIELDS};
use crate::storage::file_lock::FileLock;
use crate::storage::layout::IndexLayout;
use crate::storage::segment::Segment;
use chrono::{DateTime, Utc};
use crossbeam::channel::bounded;
use roaring::RoaringBitmap;
use std::collections::HashMap;
use std::path::Path;

fn all_field_names() -> Vec<&'static str> {
    FILE_FIELDS
        .iter()
        .chain(TAG_FIELDS.iter())
        .map(|f| f.name)
        .collect()
}

/// Manifest of committed segments plus the global tombstone set, persisted
/// alongside them so a reader can reconstruct the live document set without
/// re-reading every segment body.
#[derive(Default, serde::Serialize, serde::Deserialize)]
pub struct Manifest {
    pub segment_ids: Vec<u64>,
    pub next_segment_id: u64,
    /// Per-segment tombstone bitmaps, keyed by segment id -- doc-ids are
    /// only dense within their own segment, so a single flat bitmap across
    /// segments would conflate unrelated documents that happen to share a
    /// local id.
    pub tombstones: Vec<(u64, Vec<u8>)>,
}

impl Manifest {
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let bytes = std::fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

pub struct IndexWriter {
    layout: IndexLayout,
    _lock: FileLock,
    analyzers: AnalyzerRegistry,
    tag_tokenizer: TagTokenizer,
    manifest: Manifest,
    tombstones: HashMap<u64, RoaringBitmap>,
    /// Path -> (segment id, doc id) for the live file document at that
    /// path, used by `update`/`remove` to find what to tombstone.
    path_index: HashMap<String, (u64, DocId)>,
    active_segment: Segment,
}

impl IndexWriter {
    pub fn open_or_create(config: &IndexConfig) -> Result<Self> {
        let layout = IndexLayout::new(config.storage_path.clone());
        layout.ensure_exists()?;
        let lock = FileLock::acquire(layout.root())?;
        let manifest = Manifest::load(&layout.manifest_path())?;

        let mut tombstones = HashMap::new();
        for (segment_id, bytes) in &manifest.tombstones {
            let bitmap = RoaringBitmap::deserialize_from(&bytes[..])
                .map_err(|e| Error::new(ErrorKind::Parse, e.to_string()))?;
            tombstones.insert(*segment_id, bitmap);
        }

        let fields = all_field_names();
        let field_refs: Vec<&str> = fields.clone();
        let mut path_index = HashMap::new();
        for &segment_id in &manifest.segment_ids {
            let segment = Segment::load(&layout.segment_path(segment_id), &field_refs)?;
            for doc in segment.documents() {
                if !doc.is_tag_document() {
                    if let Some(FieldValue::Text(path)) = doc.get(schema::PATH) {
                        path_index.insert(path.clone(), (segment_id, doc.id));
                    }
                }
            }
        }

        let next_segment_id = manifest.next_segment_id;
        let active_segment = Segment::new(next_segment_id, &field_refs);

        Ok(IndexWriter {
            layout,
            _lock: lock,
            analyzers: AnalyzerRegistry::with_defaults()?,
            tag_tokenizer: TagTokenizer::new()?,
            manifest,
            tombstones,
            path_index,
            active_segment,
        })
    }

    /// Adds a new file document, indexing `contents` under all four content
    /// analyzers and materializing one tag document per tag found in it.
    /// `path` must not already be live; use [`Self::update`] to replace one.
    pub fn add(&mut self, path: &str, modified: DateTime<Utc>, size: i64, contents: &str) -> Result<DocId> {
        self.add_with_tokenizer(path, modified, size, contents, None)
    }

    pub fn add_with_tokenizer(
        &mut self,
        path: &str,
        modified: DateTime<Utc>,
        size: i64,
        contents: &str,
        custom_tokenizer: Option<Box<dyn Tokenizer>>,
    ) -> Result<DocId> {
        if self.path_index.contains_key(path) {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("path already indexed: {}", path),
            ));
        }

        let registry = match custom_tokenizer {
            Some(tokenizer) => {
                std::borrow::Cow::Owned(AnalyzerRegistry::with_defaults()?.with_contents_tokenizer(tokenizer))
            }
            None => std::borrow::Cow::Borrowed(&self.analyzers),
        };

        let contents_analyzer = registry.require(schema::CONTENTS)?;
        let contents_ci_analyzer = registry.require(schema::CONTENTS_CI)?;
        let tags_ci_analyzer = registry.require(schema::TAGS_CI)?;
        let path_analyzer = registry.require(schema::PATH)?;
        let extension_analyzer = registry.require(schema::EXTENSION)?;
        let tag_tokenizer = self.tag_tokenizer.clone();

        let ((contents_tokens, contents_ci_tokens), (tag_tokens, tags_ci_tokens)) = rayon::join(
            || {
                rayon::join(
                    || contents_analyzer.analyze(contents),
                    || contents_ci_analyzer.analyze(contents),
                )
            },
            || {
                rayon::join(
                    || tokenize_tags_via_channel(&tag_tokenizer, contents),
                    || tags_ci_analyzer.analyze(contents),
                )
            },
        );

        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let doc_id = self.active_segment.allocate_doc_id();
        let mut doc = Document::new(doc_id);
        doc.set(schema::PATH, FieldValue::Text(path.to_string()));
        doc.set(schema::EXTENSION, FieldValue::Text(extension.clone()));
        doc.set(schema::MODIFIED, FieldValue::Timestamp(modified));
        doc.set(schema::SIZE, FieldValue::Number(size));
        self.active_segment.insert_document(doc);

        // `Path`/`Extension` are `analyzed-no-norms` per the schema (§3),
        // not just stored -- a file is only findable by exact path/extension
        // token if these fields are posted like any other analyzed field.
        let path_tokens = path_analyzer.analyze(path);
        for (ordinal, token) in path_tokens.iter().enumerate() {
            self.active_segment
                .index_mut()
                .field_mut(schema::PATH)
                .record(&token.text, doc_id, ordinal as u32);
        }
        let extension_tokens = extension_analyzer.analyze(&extension);
        for (ordinal, token) in extension_tokens.iter().enumerate() {
            self.active_segment
                .index_mut()
                .field_mut(schema::EXTENSION)
                .record(&token.text, doc_id, ordinal as u32);
        }

        // Posting positions are the token's ordinal index within its stream,
        // not its byte offset -- phrase adjacency checks compare consecutive
        // ordinals. Highlighting doesn't read these back at all; it re-scans
        // the original text for the matched terms instead (see
        // `search::searcher::Searcher::highlight_hits`).
        for (ordinal, token) in contents_tokens.iter().enumerate() {
            self.active_segment
                .index_mut()
                .field_mut(schema::CONTENTS)
                .record(&token.text, doc_id, ordinal as u32);
        }
        for (ordinal, token) in contents_ci_tokens.iter().enumerate() {
            self.active_segment
                .index_mut()
                .field_mut(schema::CONTENTS_CI)
                .record(&token.text, doc_id, ordinal as u32);
        }
        for (ordinal, token) in tag_tokens.iter().enumerate() {
            self.active_segment
                .index_mut()
                .field_mut(schema::TAGS)
                .record(&token.text, doc_id, ordinal as u32);
        }
        for (ordinal, token) in tags_ci_tokens.iter().enumerate() {
            self.active_segment
                .index_mut()
                .field_mut(schema::TAGS_CI)
                .record(&token.text, doc_id, ordinal as u32);
        }

        self.materialize_tags(path, &tag_tokens);

        self.path_index
            .insert(path.to_string(), (self.active_segment.id, doc_id));
        Ok(doc_id)
    }

    /// One tag document per link, not per token: a bare `+#Tag#+` with no
    /// link payload produces no tag document at all, and a tag carrying
    /// several links produces one document per link.
    fn materialize_tags(&mut self, path: &str, tag_tokens: &[crate::analysis::token::Token]) {
        use crate::analysis::token::TokenData;
        for token in tag_tokens {
            let Some(TokenData::TagLinks(links)) = &token.data else { continue };
            for link in links {
                let tag_doc_id = self.active_segment.allocate_doc_id();
                let mut tag_doc = Document::new(tag_doc_id);
                tag_doc.set(schema::TAG, FieldValue::Text(token.text.clone()));
                tag_doc.set(schema::TAG_SOURCE_PATH, FieldValue::Text(path.to_string()));
                tag_doc.set(schema::URL, FieldValue::Text(link.url.clone()));
                if let Some(caption) = &link.caption {
                    tag_doc.set(schema::CAPTION, FieldValue::Text(caption.clone()));
                }
                self.active_segment.insert_document(tag_doc);
            }
        }
    }

    /// Replaces the file at `path`: tombstones the old file document (tag
    /// documents sourced from it are left in place -- §9 keeps this as
    /// specified, not a bug) and adds the new content as a fresh document.
    pub fn update(&mut self, path: &str, modified: DateTime<Utc>, size: i64, contents: &str) -> Result<DocId> {
        self.remove(path)?;
        self.add(path, modified, size, contents)
    }

    /// Removes the file document at `path`. If it lives in the segment
    /// currently being built, it's dropped outright (nothing persisted it
    /// yet); otherwise it's tombstoned in the owning committed segment.
    /// Tag documents it produced remain queryable either way (§4.3/§9).
    pub fn remove(&mut self, path: &str) -> Result<()> {
        if let Some((segment_id, doc_id)) = self.path_index.remove(path) {
            if segment_id == self.active_segment.id {
                self.active_segment.remove_document(doc_id);
            } else {
                self.tombstones
                    .entry(segment_id)
                    .or_insert_with(RoaringBitmap::new)
                    .insert(doc_id.value());
            }
        }
        Ok(())
    }

    /// Drops every segment and starts over with an empty index.
    pub fn clear(&mut self) -> Result<()> {
        for &segment_id in &self.manifest.segment_ids {
            let _ = std::fs::remove_file(self.layout.segment_path(segment_id));
        }
        self.manifest.segment_ids.clear();
        self.tombstones.clear();
        self.path_index.clear();
        let fields = all_field_names();
        self.active_segment = Segment::new(self.manifest.next_segment_id, &fields);
        self.persist_manifest()
    }

    /// Freezes the active segment to disk (if non-empty) and starts a new
    /// one, then persists the manifest and tombstone set.
    pub fn commit(&mut self) -> Result<()> {
        let fields = all_field_names();
        let field_refs: Vec<&str> = fields.clone();

        if !self.active_segment.is_empty() {
            let path = self.layout.segment_path(self.active_segment.id);
            self.active_segment.save(&path, &field_refs)?;
            self.manifest.segment_ids.push(self.active_segment.id);
            self.manifest.next_segment_id = self.active_segment.id + 1;
            self.active_segment = Segment::new(self.manifest.next_segment_id, &field_refs);
        }
        self.persist_manifest()
    }

    fn persist_manifest(&mut self) -> Result<()> {
        let mut encoded = Vec::new();
        for (segment_id, bitmap) in &self.tombstones {
            let mut buf = Vec::new();
            bitmap
                .serialize_into(&mut buf)
                .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))?;
            encoded.push((*segment_id, buf));
        }
        self.manifest.tombstones = encoded;
        self.manifest.save(&self.layout.manifest_path())
    }

    /// Releases the write lock, consuming the writer. Any uncommitted
    /// documents in the active segment are discarded.
    pub fn dispose(self) {
        drop(self);
    }
}

fn tokenize_tags_via_channel(tokenizer: &TagTokenizer, text: &str) -> Vec<crate::analysis::token::Token> {
    let (tx, rx) = bounded(128);
    tokenizer.tokenize_notify(text, &tx);
    drop(tx);
    rx.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config(dir: &Path) -> IndexConfig {
        IndexConfig::default().with_storage_path(dir)
    }

    #[test]
    fn add_then_commit_persists_a_segment() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = IndexWriter::open_or_create(&config(dir.path())).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        writer.add("/src/main.rs", now, 42, "fn main() { println!(\"hi\"); }").unwrap();
        writer.commit().unwrap();
        assert_eq!(writer.manifest.segment_ids.len(), 1);
        assert!(dir.path().join("manifest.bin").exists());
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = IndexWriter::open_or_create(&config(dir.path())).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        writer.add("/src/main.rs", now, 1, "a").unwrap();
        assert!(writer.add("/src/main.rs", now, 1, "a").is_err());
    }

    #[test]
    fn remove_tombstones_file_but_not_its_tags() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = IndexWriter::open_or_create(&config(dir.path())).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        writer
            .add("/src/main.rs", now, 1, "// +#TODO#+[http://example.com/ticket] fix this")
            .unwrap();
        let tag_count_before = writer
            .active_segment
            .documents()
            .filter(|d| d.is_tag_document())
            .count();
        assert_eq!(tag_count_before, 1);
        writer.remove("/src/main.rs").unwrap();
        let tag_count_after = writer
            .active_segment
            .documents()
            .filter(|d| d.is_tag_document())
            .count();
        assert_eq!(tag_count_before, tag_count_after);
        assert!(!writer.path_index.contains_key("/src/main.rs"));
    }
}
