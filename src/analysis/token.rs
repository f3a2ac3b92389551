use serde::{Deserialize, Serialize};

/// A single tag URL/caption pair, carried as a token's payload by the tag
/// tokenizer (§4.1, §4.2 of the tag subsystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagLink {
    pub url: String,
    pub caption: Option<String>,
}

/// Opaque per-token payload. Only the tag tokenizer populates this; every
/// other tokenizer leaves it `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenData {
    TagLinks(Vec<TagLink>),
}

/// Immutable token record produced by a [`crate::analysis::tokenizer::Tokenizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub token_type: TokenType,
    /// Byte offset into the original text where this token begins.
    pub position: usize,
    /// Byte length of the original text span (may differ from `text.len()`
    /// once an analyzer has case-folded `text`).
    pub length: usize,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub data: Option<TokenData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    NonWhitespace,
    Whitespace,
    Separator,
    Tag,
}

impl Token {
    pub fn new(text: String, token_type: TokenType, position: usize, length: usize) -> Self {
        Token {
            text,
            token_type,
            position,
            length,
            line: None,
            column: None,
            data: None,
        }
    }

    pub fn with_line_column(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_data(mut self, data: TokenData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn end(&self) -> usize {
        self.position + self.length
    }
}
