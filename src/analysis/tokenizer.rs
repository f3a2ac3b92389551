use crate::analysis::token::{TagLink, Token, TokenData, TokenType};
use crate::core::error::{Error, ErrorKind, Result};
use regex::Regex;
use std::collections::HashSet;

/// A tokenizer accepts an input string and produces a finite sequence of
/// tokens. Tokenizers hold no reference to any particular input -- they are
/// restartable by being invoked anew on a fresh string, and are cheap to
/// clone so an [`crate::analysis::analyzer::Analyzer`] can share one across
/// many documents.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;

    fn clone_box(&self) -> Box<dyn Tokenizer>;
}

impl Clone for Box<dyn Tokenizer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// `{Init, Whitespace, NonWhitespace}` state machine. Whitespace closes a
/// non-whitespace run; a separator closes any open run and, if configured,
/// is itself emitted as a one-character token.
#[derive(Clone)]
pub struct WhitespaceSeparatorTokenizer {
    pub separators: HashSet<char>,
    pub emit_separators_as_tokens: bool,
}

impl WhitespaceSeparatorTokenizer {
    pub fn new(separators: impl IntoIterator<Item = char>, emit_separators_as_tokens: bool) -> Self {
        WhitespaceSeparatorTokenizer {
            separators: separators.into_iter().collect(),
            emit_separators_as_tokens,
        }
    }
}

impl Tokenizer for WhitespaceSeparatorTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut run_start: Option<usize> = None;

        let close_run = |tokens: &mut Vec<Token>, run_start: &mut Option<usize>, end: usize| {
            if let Some(start) = run_start.take() {
                tokens.push(Token::new(
                    text[start..end].to_string(),
                    TokenType::NonWhitespace,
                    start,
                    end - start,
                ));
            }
        };

        for (idx, ch) in text.char_indices() {
            if self.separators.contains(&ch) {
                close_run(&mut tokens, &mut run_start, idx);
                if self.emit_separators_as_tokens {
                    tokens.push(Token::new(
                        ch.to_string(),
                        TokenType::Separator,
                        idx,
                        ch.len_utf8(),
                    ));
                }
            } else if ch.is_whitespace() {
                close_run(&mut tokens, &mut run_start, idx);
            } else if run_start.is_none() {
                run_start = Some(idx);
            }
        }
        close_run(&mut tokens, &mut run_start, text.len());

        tokens
    }

    fn name(&self) -> &str {
        "whitespace_separator"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

/// Like [`WhitespaceSeparatorTokenizer`], but whitespace is accumulated into
/// the run instead of closing it -- only a separator (or end of input)
/// closes a token. `trim_tokens` then strips leading/trailing whitespace
/// from each emitted token and shifts its `position` accordingly.
#[derive(Clone)]
pub struct SeparatorOnlyTokenizer {
    pub separators: HashSet<char>,
    pub emit_separators_as_tokens: bool,
    pub trim_tokens: bool,
}

impl SeparatorOnlyTokenizer {
    pub fn new(
        separators: impl IntoIterator<Item = char>,
        emit_separators_as_tokens: bool,
        trim_tokens: bool,
    ) -> Self {
        SeparatorOnlyTokenizer {
            separators: separators.into_iter().collect(),
            emit_separators_as_tokens,
            trim_tokens,
        }
    }

    fn trim(&self, text: &str, position: usize) -> (String, usize) {
        if !self.trim_tokens {
            return (text.to_string(), position);
        }
        let leading: usize = text
            .char_indices()
            .take_while(|(_, c)| c.is_whitespace())
            .map(|(_, c)| c.len_utf8())
            .sum();
        let trimmed_start = text[leading..].trim_end();
        (trimmed_start.to_string(), position + leading)
    }
}

impl Tokenizer for SeparatorOnlyTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut run_start: Option<usize> = None;

        for (idx, ch) in text.char_indices() {
            if self.separators.contains(&ch) {
                if let Some(start) = run_start.take() {
                    let (trimmed, pos) = self.trim(&text[start..idx], start);
                    let len = trimmed.len();
                    tokens.push(Token::new(trimmed, TokenType::NonWhitespace, pos, len));
                }
                if self.emit_separators_as_tokens {
                    tokens.push(Token::new(
                        ch.to_string(),
                        TokenType::Separator,
                        idx,
                        ch.len_utf8(),
                    ));
                }
            } else if run_start.is_none() {
                run_start = Some(idx);
            }
        }
        if let Some(start) = run_start {
            let (trimmed, pos) = self.trim(&text[start..], start);
            let len = trimmed.len();
            tokens.push(Token::new(trimmed, TokenType::NonWhitespace, pos, len));
        }

        tokens
    }

    fn name(&self) -> &str {
        "separator_only"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

/// One `{token_type, pattern}` rule of a [`RegexTokenizer`].
#[derive(Clone)]
pub struct RegexRule {
    pub token_type: String,
    pub pattern: String,
}

/// Combines an ordered list of rules into a single alternation; whichever
/// rule's capture group matches first (in rule order) determines the token
/// type for that match.
#[derive(Clone)]
pub struct RegexTokenizer {
    rules: Vec<String>,
    combined: Regex,
}

impl RegexTokenizer {
    pub fn new(rules: Vec<RegexRule>, case_sensitive: bool) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "regex tokenizer needs at least one rule",
            ));
        }
        let mut combined = String::new();
        if !case_sensitive {
            combined.push_str("(?i)");
        }
        let mut names = Vec::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if i > 0 {
                combined.push('|');
            }
            combined.push_str(&format!("(?P<g{}>{})", i, rule.pattern));
            names.push(rule.token_type.clone());
        }
        let combined = Regex::new(&combined)?;
        Ok(RegexTokenizer { rules: names, combined })
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for caps in self.combined.captures_iter(text) {
            for (i, _type_name) in self.rules.iter().enumerate() {
                if let Some(m) = caps.name(&format!("g{}", i)) {
                    tokens.push(Token::new(
                        m.as_str().to_string(),
                        TokenType::NonWhitespace,
                        m.start(),
                        m.len(),
                    ));
                    break;
                }
            }
        }
        tokens
    }

    fn name(&self) -> &str {
        "regex"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

/// Splits a path on `:/\.` and lowercases each segment. Used exclusively by
/// the `Path` field's analyzer (§3).
#[derive(Clone, Default)]
pub struct PathSplitterTokenizer;

impl Tokenizer for PathSplitterTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let separators: HashSet<char> = [':', '/', '\\', '.'].into_iter().collect();
        let mut tokens = Vec::new();
        let mut run_start: Option<usize> = None;

        for (idx, ch) in text.char_indices() {
            if separators.contains(&ch) {
                if let Some(start) = run_start.take() {
                    tokens.push(Token::new(
                        text[start..idx].to_lowercase(),
                        TokenType::NonWhitespace,
                        start,
                        idx - start,
                    ));
                }
            } else if run_start.is_none() {
                run_start = Some(idx);
            }
        }
        if let Some(start) = run_start {
            tokens.push(Token::new(
                text[start..].to_lowercase(),
                TokenType::NonWhitespace,
                start,
                text.len() - start,
            ));
        }
        tokens
    }

    fn name(&self) -> &str {
        "path_splitter"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

/// `NAME ::= [_A-Za-z][A-Za-z_0-9.]*`. Recognizes `+#<NAME>#+` markers
/// optionally followed by one or more `[<url>](<<caption>>)?` groups. The
/// regex crate cannot return every repetition of a repeated capture group,
/// so each match's trailing link groups are consumed with a second,
/// position-anchored regex run over the remaining slice.
#[derive(Clone)]
pub struct TagTokenizer {
    header: Regex,
    link: Regex,
}

impl TagTokenizer {
    pub fn new() -> Result<Self> {
        Ok(TagTokenizer {
            header: Regex::new(r"\+#([_A-Za-z][A-Za-z_0-9.]*)#\+")?,
            link: Regex::new(r"^\[([^\]]*)\](?:<([^>]*)>)?")?,
        })
    }

    fn tag_tokens(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for caps in self.header.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let name = caps.get(1).unwrap();

            let mut pos = whole.end();
            let mut links = Vec::new();
            while let Some(lm) = self.link.captures(&text[pos..]) {
                let url = lm.get(1).unwrap().as_str().to_string();
                let caption = lm.get(2).map(|c| c.as_str().to_string());
                links.push(TagLink { url, caption });
                pos += lm.get(0).unwrap().end();
            }

            let mut token = Token::new(
                name.as_str().to_string(),
                TokenType::Tag,
                name.start(),
                name.len(),
            );
            if !links.is_empty() {
                token = token.with_data(TokenData::TagLinks(links));
            }
            tokens.push(token);
        }
        tokens
    }

    /// Tokenizes `text`, sending each tag token down `sender` as it is
    /// found instead of only returning them -- the notification channel the
    /// writer's tag-collection protocol relies on (§4.2) to materialize tag
    /// documents without re-tokenizing the file.
    pub fn tokenize_notify(&self, text: &str, sender: &crossbeam::channel::Sender<Token>) {
        for token in self.tag_tokens(text) {
            let _ = sender.send(token);
        }
    }
}

impl Tokenizer for TagTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        self.tag_tokens(text)
    }

    fn name(&self) -> &str {
        "tag"
    }

    fn clone_box(&self) -> Box<dyn Tokenizer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_separator_splits_runs() {
        let t = WhitespaceSeparatorTokenizer::new([',', ';'], true);
        let tokens = t.tokenize("foo, bar;baz");
        let texts: Vec<&str> = tokens.iter().map(|tok| tok.text.as_str()).collect();
        assert_eq!(texts, vec!["foo", ",", "bar", ";", "baz"]);
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[2].position, 5);
    }

    #[test]
    fn separator_only_accumulates_whitespace() {
        let t = SeparatorOnlyTokenizer::new([','], false, true);
        let tokens = t.tokenize("  hello world , next");
        assert_eq!(tokens[0].text, "hello world");
        assert_eq!(tokens[0].position, 2);
        assert_eq!(tokens[1].text, "next");
    }

    #[test]
    fn path_splitter_lowercases_segments() {
        let t = PathSplitterTokenizer;
        let tokens = t.tokenize("C:/Src/Main.rs");
        let texts: Vec<&str> = tokens.iter().map(|tok| tok.text.as_str()).collect();
        assert_eq!(texts, vec!["c", "src", "main", "rs"]);
    }

    #[test]
    fn tag_tokenizer_extracts_links() {
        let t = TagTokenizer::new().unwrap();
        let text = "// +#Parser#+[http://x/p]<Parser docs>[http://y]";
        let tokens = t.tokenize(text);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "Parser");
        match &tokens[0].data {
            Some(TokenData::TagLinks(links)) => {
                assert_eq!(links.len(), 2);
                assert_eq!(links[0].url, "http://x/p");
                assert_eq!(links[0].caption.as_deref(), Some("Parser docs"));
                assert_eq!(links[1].url, "http://y");
                assert_eq!(links[1].caption, None);
            }
            _ => panic!("expected tag links"),
        }
    }

    #[test]
    fn tag_tokenizer_allows_bare_tags() {
        let t = TagTokenizer::new().unwrap();
        let tokens = t.tokenize("see +#TODO#+ later");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "TODO");
        assert!(tokens[0].data.is_none());
    }
}
