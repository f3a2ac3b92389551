//! Maps matched term byte-positions back to line/column coordinates and a
//! surrounding snippet of source text (§4.5). Since `Contents`/`Tags` are
//! not stored fields (§3), highlighting re-reads the original text -- the
//! caller supplies it, typically by reading the file at its stored `Path`.

use crate::core::utils::LineOffsetTable;
use crate::search::results::Occurrence;

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Builds one [`Occurrence`] per `(match_start, match_end)` byte span in
/// `matches`, each carrying its own position plus a `context_radius`-byte
/// window of `text` centered on the match.
pub fn highlight(text: &str, matches: &[(usize, usize)], context_radius: usize) -> Vec<Occurrence> {
    let table = LineOffsetTable::build(text);
    let mut occurrences: Vec<Occurrence> = matches
        .iter()
        .map(|&(match_start, match_end)| {
            let match_start = match_start.min(text.len());
            let match_end = match_end.min(text.len()).max(match_start);
            let line = table.line_of(match_start);
            let column = table.column_of(match_start);
            let start = floor_char_boundary(text, match_start.saturating_sub(context_radius));
            let end = ceil_char_boundary(text, (match_end + context_radius).min(text.len()));
            Occurrence {
                line: line as u32,
                column: column as u32,
                match_start,
                match_end,
                start,
                end,
                context: text[start..end].to_string(),
            }
        })
        .collect();
    occurrences.sort_by_key(|o| o.match_start);
    occurrences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_correct_line_and_column() {
        let text = "fn main() {\n    println!(\"hi\");\n}\n";
        let pos = text.find("println").unwrap();
        let occ = highlight(text, &[(pos, pos + "println".len())], 5);
        assert_eq!(occ[0].line, 1);
        assert_eq!(occ[0].column, 4);
        assert_eq!(&text[occ[0].match_start..occ[0].match_end], "println");
    }

    #[test]
    fn context_window_respects_char_boundaries() {
        let text = "café con leche";
        let pos = text.find("con").unwrap();
        let occ = highlight(text, &[(pos, pos + "con".len())], 3);
        assert!(occ[0].context.is_char_boundary(0));
        assert!(text[occ[0].start..occ[0].end].contains("con"));
    }
}
