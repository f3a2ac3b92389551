//! Small standalone helpers shared across the query, search and highlight
//! layers: the line-offset table used to turn byte offsets into line/column
//! pairs, and the VB-style `Like` wildcard matcher used by directory filters
//! and file-source wildcard filters.

use regex::Regex;

/// Maps byte offsets in a text to 0-based line numbers. Built once per
/// document and reused for every occurrence the highlighter records.
pub struct LineOffsetTable {
    /// Byte offset of the first character of each line. `starts[0] == 0`.
    starts: Vec<usize>,
}

impl LineOffsetTable {
    /// Scans for `\n`, `\r` and `\r\n`, treating all three as line
    /// terminators and recording the offset immediately after each one.
    pub fn build(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut starts = vec![0usize];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' => {
                    let next = if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        i + 2
                    } else {
                        i + 1
                    };
                    starts.push(next);
                    i = next;
                }
                b'\n' => {
                    starts.push(i + 1);
                    i += 1;
                }
                _ => i += 1,
            }
        }
        LineOffsetTable { starts }
    }

    /// 0-based line index containing `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        }
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.starts[line]
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Column of `offset` within its line.
    pub fn column_of(&self, offset: usize) -> usize {
        let line = self.line_of(offset);
        offset - self.line_start(line)
    }
}

/// Translates a VB-style `Like` pattern (`?`, `*`, `#`, `[set]`, `[!set]`)
/// into an anchored regular expression. Plain `regex::escape` plus a
/// `*`/`?` substitution (the teacher's approach for simple wildcard
/// queries) cannot express `#` or character sets, so directory filters and
/// file-source wildcard filters go through this richer translation instead.
pub fn like_pattern_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '?' => out.push('.'),
            '*' => out.push_str(".*"),
            '#' => out.push_str("[0-9]"),
            '[' => {
                out.push('[');
                if let Some('!') = chars.peek() {
                    chars.next();
                    out.push('^');
                }
                for c2 in chars.by_ref() {
                    if c2 == ']' {
                        break;
                    }
                    if c2 == '\\' || c2 == '^' {
                        out.push('\\');
                    }
                    out.push(c2);
                }
                out.push(']');
            }
            _ => {
                for escaped in regex::escape(&c.to_string()).chars() {
                    out.push(escaped);
                }
            }
        }
    }
    out.push('$');
    Regex::new(&out)
}

/// Translates a plain glob (`*`, `?` only) into an anchored regular
/// expression, for the simpler wildcard-term matching used when expanding
/// query wildcards against the term dictionary.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => {
                for escaped in regex::escape(&c.to_string()).chars() {
                    out.push(escaped);
                }
            }
        }
    }
    out.push('$');
    Regex::new(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_table_basic() {
        let table = LineOffsetTable::build("Hello world\nfoo bar");
        assert_eq!(table.line_of(0), 0);
        assert_eq!(table.line_of(6), 0);
        assert_eq!(table.line_of(12), 1);
        assert_eq!(table.column_of(12), 0);
        assert_eq!(table.column_of(16), 4);
    }

    #[test]
    fn line_table_handles_crlf() {
        let table = LineOffsetTable::build("a\r\nb\rc\nd");
        assert_eq!(table.line_count(), 4);
        assert_eq!(table.line_of(3), 1);
        assert_eq!(table.line_of(5), 2);
        assert_eq!(table.line_of(7), 3);
    }

    #[test]
    fn like_pattern_matches_sets_and_digits() {
        let re = like_pattern_to_regex("file#.[tT]xt").unwrap();
        assert!(re.is_match("file1.txt"));
        assert!(re.is_match("file2.Txt"));
        assert!(!re.is_match("filea.txt"));
    }

    #[test]
    fn glob_matches_star_and_question() {
        let re = glob_to_regex("*.rs").unwrap();
        assert!(re.is_match("main.rs"));
        assert!(!re.is_match("main.rs.bak"));
        let re2 = glob_to_regex("a?c").unwrap();
        assert!(re2.is_match("abc"));
        assert!(!re2.is_match("ac"));
    }
}
