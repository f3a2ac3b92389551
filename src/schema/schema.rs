//! The fixed index schema of §3. Unlike the teacher's `SchemaWithAnalyzer`
//! (an arbitrary, caller-built list of fields) this schema is closed: file
//! documents and tag documents each carry exactly the fields below, and the
//! field/analyzer bindings are not configurable beyond the custom-tokenizer
//! substitution point in `AnalyzerRegistry::with_contents_tokenizer`.

pub const PATH: &str = "Path";
pub const EXTENSION: &str = "Extension";
pub const MODIFIED: &str = "Modified";
pub const SIZE: &str = "Size";
pub const CONTENTS: &str = "Contents";
pub const CONTENTS_CI: &str = "ContentsCaseInsensitive";
pub const TAGS: &str = "Tags";
pub const TAGS_CI: &str = "TagsCaseInsensitive";

pub const TAG: &str = "Tag";
pub const TAG_SOURCE_PATH: &str = "TagSourcePath";
pub const URL: &str = "Url";
pub const CAPTION: &str = "Caption";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    None,
    Stored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexing {
    None,
    Analyzed,
    AnalyzedNoNorms,
    NotAnalyzedNoNorms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermVector {
    None,
    PositionsAndOffsets,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub storage: Storage,
    pub indexing: Indexing,
    pub termvector: TermVector,
}

/// The field table of §3, verbatim.
pub const FILE_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: PATH,
        storage: Storage::Stored,
        indexing: Indexing::AnalyzedNoNorms,
        termvector: TermVector::None,
    },
    FieldDescriptor {
        name: EXTENSION,
        storage: Storage::Stored,
        indexing: Indexing::AnalyzedNoNorms,
        termvector: TermVector::None,
    },
    FieldDescriptor {
        name: MODIFIED,
        storage: Storage::Stored,
        indexing: Indexing::NotAnalyzedNoNorms,
        termvector: TermVector::None,
    },
    FieldDescriptor {
        name: SIZE,
        storage: Storage::Stored,
        indexing: Indexing::NotAnalyzedNoNorms,
        termvector: TermVector::None,
    },
    FieldDescriptor {
        name: CONTENTS,
        storage: Storage::None,
        indexing: Indexing::Analyzed,
        termvector: TermVector::PositionsAndOffsets,
    },
    FieldDescriptor {
        name: CONTENTS_CI,
        storage: Storage::None,
        indexing: Indexing::Analyzed,
        termvector: TermVector::PositionsAndOffsets,
    },
    FieldDescriptor {
        name: TAGS,
        storage: Storage::None,
        indexing: Indexing::Analyzed,
        termvector: TermVector::PositionsAndOffsets,
    },
    FieldDescriptor {
        name: TAGS_CI,
        storage: Storage::None,
        indexing: Indexing::Analyzed,
        termvector: TermVector::PositionsAndOffsets,
    },
];

pub const TAG_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: TAG,
        storage: Storage::None,
        indexing: Indexing::NotAnalyzedNoNorms,
        termvector: TermVector::None,
    },
    FieldDescriptor {
        name: TAG_SOURCE_PATH,
        storage: Storage::None,
        indexing: Indexing::NotAnalyzedNoNorms,
        termvector: TermVector::None,
    },
    FieldDescriptor {
        name: URL,
        storage: Storage::Stored,
        indexing: Indexing::None,
        termvector: TermVector::None,
    },
    FieldDescriptor {
        name: CAPTION,
        storage: Storage::Stored,
        indexing: Indexing::None,
        termvector: TermVector::None,
    },
];

/// Search-type identifiers of §6: select the parser/analyzer triple used by
/// the query parser, searcher and highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Path,
    Contents,
    Tags,
}

impl SearchType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Path" => Some(SearchType::Path),
            "Contents" => Some(SearchType::Contents),
            "Tags" => Some(SearchType::Tags),
            _ => None,
        }
    }

    /// The field searched when `case_sensitive` is true.
    pub fn field(&self) -> &'static str {
        match self {
            SearchType::Path => PATH,
            SearchType::Contents => CONTENTS,
            SearchType::Tags => TAGS,
        }
    }

    /// The case-insensitive companion field. `Path` is always searched
    /// case-insensitively (§4.4), so it has no separate companion -- both
    /// modes resolve to the same field.
    pub fn field_case_insensitive(&self) -> &'static str {
        match self {
            SearchType::Path => PATH,
            SearchType::Contents => CONTENTS_CI,
            SearchType::Tags => TAGS_CI,
        }
    }

    pub fn field_for(&self, case_sensitive: bool) -> &'static str {
        if case_sensitive {
            self.field()
        } else {
            self.field_case_insensitive()
        }
    }
}

/// Resolves a `field:term` prefix (§4.4) to the schema field it should be
/// matched against. Matching is case-insensitive on the field name itself
/// (`path:`, `Path:`, `PATH:` are equivalent) since the query grammar
/// treats it as a keyword, not indexed text. Returns `None` for a name that
/// names no searchable field, which the searcher treats as "matches
/// nothing" rather than a parse error -- the query was syntactically valid.
pub fn resolve_field_name(name: &str, case_sensitive: bool) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "path" => Some(PATH),
        "extension" => Some(EXTENSION),
        "contents" => Some(if case_sensitive { CONTENTS } else { CONTENTS_CI }),
        "tags" => Some(if case_sensitive { TAGS } else { TAGS_CI }),
        _ => None,
    }
}

/// Whether `field`'s postings are indexed lowercase, so a term being looked
/// up against it must itself be folded first. `Path` is always one of these
/// (its analyzer lowercases unconditionally, independent of `case_sensitive`).
pub fn is_case_insensitive_field(field: &str) -> bool {
    matches!(field, PATH | CONTENTS_CI | TAGS_CI)
}
