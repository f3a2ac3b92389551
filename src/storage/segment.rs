//! A segment is the unit of persistence: a batch of documents added between
//! commits, frozen into an immutable file once written. Readers mmap the
//! file and decode it lazily; the writer holds at most one mutable segment
//! (the one currently being built) at a time.

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};
use crate::index::inverted::{FieldIndex, InvertedIndex};
use crate::storage::compression::{CompressedBlock, CompressionType};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Segment files are framed as a leading 4-byte little-endian CRC32 of
/// everything that follows, then the bincode-serialized, block-compressed
/// body. The checksum catches truncated writes and bit-rot on read rather
/// than handing a zstd decoder or bincode garbage bytes.
const CHECKSUM_LEN: usize = 4;

#[derive(Serialize, Deserialize)]
struct SegmentOnDisk {
    id: u64,
    next_local_id: u32,
    documents: Vec<(u32, Document)>,
    fields: Vec<(String, Vec<(String, Vec<u8>)>)>,
}

/// A segment under construction: new documents are assigned increasing
/// local doc-ids and folded into `index` and `documents` until the writer
/// decides to commit it.
pub struct Segment {
    pub id: u64,
    documents: HashMap<u32, Document>,
    index: InvertedIndex,
    next_local_id: u32,
}

impl Segment {
    pub fn new(id: u64, field_names: &[&str]) -> Self {
        Segment {
            id,
            documents: HashMap::new(),
            index: InvertedIndex::new(field_names),
            next_local_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Reserves the next local doc-id for a new document; the caller fills
    /// in stored fields and indexed terms afterward.
    pub fn allocate_doc_id(&mut self) -> DocId {
        let id = DocId(self.next_local_id);
        self.next_local_id += 1;
        id
    }

    pub fn insert_document(&mut self, document: Document) {
        self.documents.insert(document.id.value(), document);
    }

    pub fn index_mut(&mut self) -> &mut InvertedIndex {
        &mut self.index
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(&id.value())
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn remove_document(&mut self, id: DocId) {
        self.documents.remove(&id.value());
        self.index.remove_doc(id);
    }

    pub fn field(&self, name: &str) -> Option<&FieldIndex> {
        self.index.field(name)
    }

    pub fn save(&self, path: &Path, field_names: &[&str]) -> Result<()> {
        let mut documents: Vec<(u32, Document)> = self
            .documents
            .iter()
            .map(|(id, doc)| (*id, doc.clone()))
            .collect();
        documents.sort_by_key(|(id, _)| *id);

        let mut fields = Vec::new();
        for &name in field_names {
            if let Some(field_index) = self.index.field(name) {
                fields.push((name.to_string(), field_index.encode_postings()));
            }
        }

        let on_disk = SegmentOnDisk {
            id: self.id,
            next_local_id: self.next_local_id,
            documents,
            fields,
        };
        let inner = bincode::serialize(&on_disk)?;
        let block = CompressedBlock::compress(&inner, CompressionType::Zstd)?;
        let framed = bincode::serialize(&block)?;
        let checksum = crc32fast::hash(&framed);

        let mut file = File::create(path)?;
        file.write_all(&checksum.to_le_bytes())?;
        file.write_all(&framed)?;
        Ok(())
    }

    pub fn load(path: &Path, field_names: &[&str]) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        if mmap.len() < CHECKSUM_LEN {
            return Err(Error::new(ErrorKind::InvalidState, "segment file truncated before checksum"));
        }
        let (checksum_bytes, body) = mmap.split_at(CHECKSUM_LEN);
        let expected = u32::from_le_bytes(checksum_bytes.try_into().unwrap());
        let actual = crc32fast::hash(body);
        if actual != expected {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!("segment checksum mismatch in {}: expected {:x}, got {:x}", path.display(), expected, actual),
            ));
        }

        let block: CompressedBlock = bincode::deserialize(body)?;
        let inner = block.decompress()?;
        let on_disk: SegmentOnDisk = bincode::deserialize(&inner)?;

        let mut index = InvertedIndex::new(field_names);
        for (name, entries) in &on_disk.fields {
            let field_index = FieldIndex::from_encoded(entries)?;
            *index.field_mut(name) = field_index;
        }

        let documents = on_disk.documents.into_iter().collect();
        Ok(Segment {
            id: on_disk.id,
            documents,
            index,
            next_local_id: on_disk.next_local_id,
        })
    }
}
