//! `IndexReader`: an immutable snapshot of every committed segment, used by
//! the searcher and by direct file/tag enumeration (§4.3). Readers never
//! see the writer's in-progress segment -- call `commit()` on the writer
//! first. Re-open to pick up later commits.

use crate::core::error::Result;
use crate::core::types::{DocId, Document};
use crate::schema::schema::{self, FILE_FIELDS, TAG_FIELDS};
use crate::storage::layout::IndexLayout;
use crate::storage::segment::Segment;
use crate::writer::index_writer::Manifest;
use roaring::RoaringBitmap;
use std::collections::HashMap;

fn all_field_names() -> Vec<&'static str> {
    FILE_FIELDS
        .iter()
        .chain(TAG_FIELDS.iter())
        .map(|f| f.name)
        .collect()
}

/// One URL/caption payload recorded by a single tag occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLinkInfo {
    pub url: String,
    pub caption: Option<String>,
}

/// Aggregated view of one tag name across the whole index: how often it
/// occurs, in how many distinct documents, and the links attached to each
/// occurrence (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub total_count: usize,
    pub document_count: usize,
    pub links: Vec<TagLinkInfo>,
}

/// A document identified by which segment it lives in plus its local id --
/// the only way to name a document uniquely once more than one segment
/// exists, since local ids restart at zero per segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalDocId {
    pub segment_index: usize,
    pub doc_id: DocId,
}

pub struct IndexReader {
    segments: Vec<Segment>,
    tombstones: HashMap<u64, RoaringBitmap>,
    /// Cumulative count of live file documents preceding each segment,
    /// used to binary-search from a dense file ordinal to its owning
    /// segment without scanning every document in between.
    file_run_starts: Vec<usize>,
}

impl IndexReader {
    pub fn open(layout: &IndexLayout) -> Result<Self> {
        let manifest = {
            let path = layout.manifest_path();
            if path.exists() {
                let bytes = std::fs::read(&path)?;
                bincode::deserialize::<Manifest>(&bytes)?
            } else {
                Manifest::default()
            }
        };

        let fields = all_field_names();
        let mut segments = Vec::new();
        for &segment_id in &manifest.segment_ids {
            segments.push(Segment::load(&layout.segment_path(segment_id), &fields)?);
        }

        let mut tombstones = HashMap::new();
        for (segment_id, bytes) in &manifest.tombstones {
            let bitmap = RoaringBitmap::deserialize_from(&bytes[..])
                .map_err(|e| crate::core::error::Error::new(crate::core::error::ErrorKind::Parse, e.to_string()))?;
            tombstones.insert(*segment_id, bitmap);
        }

        let mut file_run_starts = Vec::with_capacity(segments.len());
        let mut cumulative = 0;
        for segment in &segments {
            file_run_starts.push(cumulative);
            let deleted = tombstones.get(&segment.id);
            cumulative += segment
                .documents()
                .filter(|d| {
                    !d.is_tag_document() && !deleted.map(|b| b.contains(d.id.value())).unwrap_or(false)
                })
                .count();
        }

        Ok(IndexReader {
            segments,
            tombstones,
            file_run_starts,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_deleted(&self, segment_id: u64, doc_id: DocId) -> bool {
        self.tombstones
            .get(&segment_id)
            .map(|b| b.contains(doc_id.value()))
            .unwrap_or(false)
    }

    fn live_documents(&self) -> impl Iterator<Item = (usize, &Document)> {
        self.segments.iter().enumerate().flat_map(move |(idx, segment)| {
            let deleted = self.tombstones.get(&segment.id);
            segment.documents().filter_map(move |doc| {
                let removed = deleted.map(|b| b.contains(doc.id.value())).unwrap_or(false);
                if removed {
                    None
                } else {
                    Some((idx, doc))
                }
            })
        })
    }

    /// All live file documents (non-tombstoned, excluding tag documents).
    pub fn files(&self) -> Vec<&Document> {
        self.live_documents()
            .filter(|(_, d)| !d.is_tag_document())
            .map(|(_, d)| d)
            .collect()
    }

    /// Distinct lowercase extensions among live files, sorted.
    pub fn file_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .files()
            .into_iter()
            .filter_map(|d| d.get(schema::EXTENSION))
            .filter_map(|v| v.as_text())
            .map(|s| s.to_string())
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// All tag documents, regardless of whether their source file is still
    /// live (§4.3/§9: tag documents outlive the file they were found in).
    pub fn tags(&self) -> Vec<&Document> {
        self.segments
            .iter()
            .flat_map(|s| s.documents())
            .filter(|d| d.is_tag_document())
            .collect()
    }

    pub fn tag_document(&self, segment_index: usize, doc_id: DocId) -> Option<&Document> {
        self.segments
            .get(segment_index)
            .and_then(|s| s.document(doc_id))
            .filter(|d| d.is_tag_document())
    }

    /// Aggregates one [`TagInfo`] per distinct tag name across every live
    /// source document and every tag document (dead or alive -- tag
    /// documents outlive their source file), by walking the `Tags` term
    /// dictionary for counts and the tag documents for link payloads.
    pub fn tag_infos(&self) -> Vec<TagInfo> {
        let mut names: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Some(field_index) = segment.field(schema::TAGS) {
                names.extend(field_index.terms_with_prefix("").map(String::from));
            }
        }
        names.sort();
        names.dedup();
        names.into_iter().filter_map(|name| self.get_tag_info(&name)).collect()
    }

    /// `total_count` is the summed term frequency of `name` in the `Tags`
    /// field across every live source document; `document_count` is how
    /// many distinct live source documents contain it at all;  `links` come
    /// from every tag document recorded for `name`, regardless of whether
    /// its source file is still live.
    pub fn get_tag_info(&self, name: &str) -> Option<TagInfo> {
        let mut total_count = 0usize;
        let mut document_count = 0usize;
        for segment in &self.segments {
            let Some(field_index) = segment.field(schema::TAGS) else { continue };
            let Some(postings) = field_index.postings(name) else { continue };
            let deleted = self.tombstones.get(&segment.id);
            for posting in postings.postings() {
                if deleted.map(|b| b.contains(posting.doc_id.value())).unwrap_or(false) {
                    continue;
                }
                total_count += posting.term_freq as usize;
                document_count += 1;
            }
        }

        let links: Vec<TagLinkInfo> = self
            .tags()
            .into_iter()
            .filter(|d| d.get(schema::TAG).and_then(|v| v.as_text()) == Some(name))
            .filter_map(|d| {
                d.get(schema::URL).and_then(|v| v.as_text()).map(|url| TagLinkInfo {
                    url: url.to_string(),
                    caption: d.get(schema::CAPTION).and_then(|v| v.as_text()).map(String::from),
                })
            })
            .collect();

        if total_count == 0 && links.is_empty() {
            None
        } else {
            Some(TagInfo {
                name: name.to_string(),
                total_count,
                document_count,
                links,
            })
        }
    }

    /// Maps a dense file ordinal (0-based position among live files, in
    /// segment-then-insertion order) to the document at that position,
    /// locating the owning segment via binary search over
    /// [`Self::file_run_starts`] rather than a linear scan across segments.
    pub fn file_at(&self, ordinal: usize) -> Option<GlobalDocId> {
        if self.segments.is_empty() {
            return None;
        }
        // Rightmost segment whose run starts at or before `ordinal` --
        // `partition_point` rather than `binary_search` because segments
        // with zero live file documents produce duplicate start values,
        // and we want the last one among ties.
        let count_le = self.file_run_starts.partition_point(|&start| start <= ordinal);
        if count_le == 0 {
            return None;
        }
        let segment_index = count_le - 1;
        let local_ordinal = ordinal - self.file_run_starts[segment_index];
        let segment = &self.segments[segment_index];
        let deleted = self.tombstones.get(&segment.id);
        segment
            .documents()
            .filter(|d| !d.is_tag_document() && !deleted.map(|b| b.contains(d.id.value())).unwrap_or(false))
            .nth(local_ordinal)
            .map(|d| GlobalDocId {
                segment_index,
                doc_id: d.id,
            })
    }

    pub fn document(&self, global: GlobalDocId) -> Option<&Document> {
        self.segments.get(global.segment_index).and_then(|s| s.document(global.doc_id))
    }
}
