use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque document identifier, dense within a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

/// Value of a *stored* field. Indexed-but-not-stored fields (Contents*, Tags*)
/// never appear here -- their analyzed text lives only in posting lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// A stored document: either a file document (`Path`, `Extension`, `Modified`,
/// `Size`) or a tag document (`Tag`, `TagSourcePath`, `Url`, `Caption`). The
/// populations are disjoint and distinguished by which fields are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: HashMap<String, FieldValue>,
}

impl Document {
    pub fn new(id: DocId) -> Self {
        Document {
            id,
            fields: HashMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn is_tag_document(&self) -> bool {
        self.fields.contains_key(crate::schema::schema::TAG)
    }
}
