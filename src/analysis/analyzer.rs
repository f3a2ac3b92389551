use crate::analysis::filter::{LowercaseFilter, TokenFilter};
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{
    PathSplitterTokenizer, SeparatorOnlyTokenizer, TagTokenizer, Tokenizer, WhitespaceSeparatorTokenizer,
};
use crate::core::error::{Error, ErrorKind, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Case-folding mode a field's analyzer runs in. `Path` is always folded to
/// lowercase by its tokenizer directly and does not use this enum; every
/// other field binds one [`Analyzer`] per mode (`Contents`/`ContentsCaseInsensitive`,
/// `Tags`/`TagsCaseInsensitive`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Sensitive,
    Insensitive,
}

/// A tokenizer plus an optional chain of token filters. This is the
/// tokenizer->analyzer adapter of §4.6: filters applied in order turn a raw
/// [`Token`] stream into the `(term_text, start_offset, end_offset)` triples
/// the writer and searcher consume -- `token.text` is the term text after
/// filtering, `token.position`/`token.end()` are the offsets.
pub struct Analyzer {
    pub name: String,
    tokenizer: Box<dyn Tokenizer>,
    filters: Vec<Box<dyn TokenFilter>>,
}

impl Analyzer {
    pub fn new(name: impl Into<String>, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            name: name.into(),
            tokenizer,
            filters: Vec::new(),
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);
        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }
        tokens
    }

    /// The `Path` analyzer: splits on `:/\.` and lowercases each segment.
    pub fn path() -> Self {
        Analyzer::new("path", Box::new(PathSplitterTokenizer))
    }

    /// The `Extension` analyzer: whitespace+separator tokenizer, lowercased.
    pub fn extension() -> Self {
        Analyzer::new(
            "extension",
            Box::new(WhitespaceSeparatorTokenizer::new([], false)),
        )
        .add_filter(Box::new(LowercaseFilter))
    }

    /// `Contents`/`ContentsCaseInsensitive`: a separator-only tokenizer over
    /// common source-code punctuation, case-folded per `mode`.
    pub fn contents(mode: CaseMode) -> Self {
        let separators = [
            ' ', '\t', '\r', '\n', '.', ',', ';', ':', '(', ')', '{', '}', '[', ']', '<', '>',
            '"', '\'', '=', '+', '-', '*', '/', '%', '!', '&', '|', '^', '~',
        ];
        let analyzer = Analyzer::new(
            "contents",
            Box::new(SeparatorOnlyTokenizer::new(separators, false, true)),
        );
        match mode {
            CaseMode::Sensitive => analyzer,
            CaseMode::Insensitive => analyzer.add_filter(Box::new(LowercaseFilter)),
        }
    }

    /// `Tags`/`TagsCaseInsensitive`: the tag tokenizer, case-folded per `mode`.
    pub fn tags(mode: CaseMode) -> Result<Self> {
        let analyzer = Analyzer::new("tags", Box::new(TagTokenizer::new()?));
        Ok(match mode {
            CaseMode::Sensitive => analyzer,
            CaseMode::Insensitive => analyzer.add_filter(Box::new(LowercaseFilter)),
        })
    }
}

/// Maps schema field names to their bound analyzer, mirroring the teacher's
/// `AnalyzerRegistry` but populated once from the fixed schema of §3 rather
/// than from a mutable runtime registry.
#[derive(Clone)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn with_defaults() -> Result<Self> {
        let mut analyzers = HashMap::new();
        analyzers.insert(
            crate::schema::schema::PATH.to_string(),
            Arc::new(Analyzer::path()),
        );
        analyzers.insert(
            crate::schema::schema::EXTENSION.to_string(),
            Arc::new(Analyzer::extension()),
        );
        analyzers.insert(
            crate::schema::schema::CONTENTS.to_string(),
            Arc::new(Analyzer::contents(CaseMode::Sensitive)),
        );
        analyzers.insert(
            crate::schema::schema::CONTENTS_CI.to_string(),
            Arc::new(Analyzer::contents(CaseMode::Insensitive)),
        );
        analyzers.insert(
            crate::schema::schema::TAGS.to_string(),
            Arc::new(Analyzer::tags(CaseMode::Sensitive)?),
        );
        analyzers.insert(
            crate::schema::schema::TAGS_CI.to_string(),
            Arc::new(Analyzer::tags(CaseMode::Insensitive)?),
        );
        Ok(AnalyzerRegistry { analyzers })
    }

    pub fn get(&self, field: &str) -> Option<Arc<Analyzer>> {
        self.analyzers.get(field).cloned()
    }

    /// Substitutes a caller-supplied tokenizer for both `Contents*` fields,
    /// as `IndexWriter::add`/`update` do when given a custom tokenizer
    /// (§4.2 "per-field analyzer binding").
    pub fn with_contents_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        let sensitive = Analyzer::new("contents", tokenizer.clone_box());
        let insensitive =
            Analyzer::new("contents_ci", tokenizer).add_filter(Box::new(LowercaseFilter));
        self.analyzers
            .insert(crate::schema::schema::CONTENTS.to_string(), Arc::new(sensitive));
        self.analyzers.insert(
            crate::schema::schema::CONTENTS_CI.to_string(),
            Arc::new(insensitive),
        );
        self
    }

    pub fn require(&self, field: &str) -> Result<Arc<Analyzer>> {
        self.get(field)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("no analyzer for field '{}'", field)))
    }
}
