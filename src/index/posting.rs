//! In-memory and on-disk representation of a single term's posting list:
//! the doc-ids it occurs in, its per-document term frequency, and (for
//! fields with `TermVector::PositionsAndOffsets`) the token positions
//! themselves. Encoded form uses delta-encoding for the doc-id run and
//! vbyte for frequencies/positions, per §3's storage encoding.

use crate::core::error::Result;
use crate::core::types::DocId;
use crate::storage::compression::{DeltaEncoder, VByteEncoder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc_id: DocId) -> Self {
        Posting {
            doc_id,
            term_freq: 0,
            positions: Vec::new(),
        }
    }

    pub fn add_occurrence(&mut self, position: u32) {
        self.positions.push(position);
        self.term_freq += 1;
    }
}

/// The postings for one term in one field, kept sorted by `doc_id` so the
/// encoded form can delta-compress the doc-id run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList { postings: Vec::new() }
    }

    pub fn doc_freq(&self) -> usize {
        self.postings.len()
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|idx| &self.postings[idx])
    }

    /// Inserts or updates the posting for `doc_id`, keeping the list sorted.
    /// Called once per document per term during index construction; a
    /// document is never indexed twice for the same term within a single
    /// writer pass, so this always inserts rather than merges.
    pub fn record(&mut self, doc_id: DocId, position: u32) {
        match self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(idx) => self.postings[idx].add_occurrence(position),
            Err(idx) => {
                let mut posting = Posting::new(doc_id);
                posting.add_occurrence(position);
                self.postings.insert(idx, posting);
            }
        }
    }

    pub fn remove_doc(&mut self, doc_id: DocId) {
        if let Ok(idx) = self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            self.postings.remove(idx);
        }
    }

    /// Encodes the list as: delta-encoded doc-ids, vbyte-encoded term
    /// frequencies, vbyte-encoded per-posting position counts, then the
    /// delta-encoded positions themselves (positions are monotonic within a
    /// document since the tokenizer emits them in order).
    pub fn encode(&self) -> Vec<u8> {
        let doc_ids: Vec<u32> = self.postings.iter().map(|p| p.doc_id.value()).collect();
        let mut out = Vec::new();
        VByteEncoder::encode_u32(&mut out, doc_ids.len() as u32);
        out.extend(DeltaEncoder::encode_u32_list(&doc_ids));
        for posting in &self.postings {
            VByteEncoder::encode_u32(&mut out, posting.term_freq);
            out.extend(DeltaEncoder::encode_u32_list(&posting.positions));
        }
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let (count, consumed) = VByteEncoder::decode_u32(&data[pos..])?;
        pos += consumed;

        let (doc_ids, id_bytes) = DeltaEncoder::decode_u32_list_n(&data[pos..], count as usize)?;
        pos += id_bytes;

        let mut postings = Vec::with_capacity(count as usize);
        for &doc_id in &doc_ids {
            let (term_freq, consumed) = VByteEncoder::decode_u32(&data[pos..])?;
            pos += consumed;
            let (positions, consumed) = decode_position_block(&data[pos..], term_freq as usize)?;
            pos += consumed;
            postings.push(Posting {
                doc_id: DocId(doc_id),
                term_freq,
                positions,
            });
        }
        Ok(PostingList { postings })
    }
}

fn decode_position_block(data: &[u8], count: usize) -> Result<(Vec<u32>, usize)> {
    if count == 0 {
        return Ok((Vec::new(), 0));
    }
    let first = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let mut positions = vec![first];
    let mut pos = 4;
    let mut prev = first;
    for _ in 1..count {
        let (value, consumed) = VByteEncoder::decode_u32(&data[pos..])?;
        pos += consumed;
        prev = prev.wrapping_add(value);
        positions.push(prev);
    }
    Ok((positions, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_finds_postings() {
        let mut list = PostingList::new();
        list.record(DocId(3), 0);
        list.record(DocId(3), 5);
        list.record(DocId(1), 2);
        assert_eq!(list.doc_freq(), 2);
        let p = list.get(DocId(3)).unwrap();
        assert_eq!(p.term_freq, 2);
        assert_eq!(p.positions, vec![0, 5]);
    }

    #[test]
    fn encode_decode_round_trips() {
        let mut list = PostingList::new();
        list.record(DocId(1), 0);
        list.record(DocId(1), 10);
        list.record(DocId(4), 3);
        list.record(DocId(9), 0);
        list.record(DocId(9), 1);
        list.record(DocId(9), 2);

        let encoded = list.encode();
        let decoded = PostingList::decode(&encoded).unwrap();
        assert_eq!(decoded.postings(), list.postings());
    }

    #[test]
    fn remove_doc_drops_posting() {
        let mut list = PostingList::new();
        list.record(DocId(1), 0);
        list.record(DocId(2), 0);
        list.remove_doc(DocId(1));
        assert_eq!(list.doc_freq(), 1);
        assert!(list.get(DocId(1)).is_none());
    }
}
