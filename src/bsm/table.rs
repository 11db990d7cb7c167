//! GFM pipe-table helpers: cell
//! splitting and separator-row validation, factored out of the main driver
//! so the `header -> separatorPending -> rows` transitions in `mod.rs` stay
//! readable.

use crate::model::TableAlignment;

/// Split a table row into cells, honouring `\|` escapes and stripping one
/// leading/trailing unescaped `|` if present.
pub(super) fn split_cells(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.trim().chars().collect();
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if chars.get(i + 1) == Some(&'|') => {
                current.push('|');
                i += 2;
            }
            '|' => {
                cells.push(std::mem::take(&mut current));
                i += 1;
            }
            c => {
                current.push(c);
                i += 1;
            }
        }
    }
    cells.push(current);

    // One leading/trailing empty cell corresponds to a leading/trailing
    // `|` delimiter rather than real content.
    if cells.first().is_some_and(|c| c.trim().is_empty()) && chars.first() == Some(&'|') {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.trim().is_empty()) && chars.last() == Some(&'|') {
        cells.pop();
    }

    cells.into_iter().map(|c| c.trim().to_string()).collect()
}

/// Whether every cell of a candidate separator row matches `:?-{3,}:?` and
/// nothing else. A shorter run than 3 dashes
/// is tolerated here (we accept `-` as a degenerate single-dash separator,
/// consistent with widely deployed GFM renderers) but every cell must be
/// made up exclusively of `-` with optional flanking `:`.
pub(super) fn parse_separator(line: &str) -> Option<Vec<TableAlignment>> {
    let cells = split_cells(line);
    if cells.is_empty() {
        return None;
    }
    let mut alignments = Vec::with_capacity(cells.len());
    for cell in &cells {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return None;
        }
        let left = trimmed.starts_with(':');
        let right = trimmed.ends_with(':');
        let dashes = trimmed.trim_start_matches(':').trim_end_matches(':');
        if dashes.is_empty() || !dashes.chars().all(|c| c == '-') {
            return None;
        }
        alignments.push(match (left, right) {
            (true, true) => TableAlignment::Center,
            (true, false) => TableAlignment::Left,
            (false, true) => TableAlignment::Right,
            (false, false) => TableAlignment::None,
        });
    }
    Some(alignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_row() {
        assert_eq!(split_cells("| a | b |"), vec!["a", "b"]);
    }

    #[test]
    fn honours_escaped_pipe() {
        assert_eq!(split_cells(r"| a\|b | c |"), vec!["a|b", "c"]);
    }

    #[test]
    fn strips_only_one_leading_trailing_pipe() {
        assert_eq!(split_cells("a | b"), vec!["a", "b"]);
    }

    #[test]
    fn separator_alignments() {
        assert_eq!(
            parse_separator("| --- | :--- | ---: | :---: |"),
            Some(vec![
                TableAlignment::None,
                TableAlignment::Left,
                TableAlignment::Right,
                TableAlignment::Center,
            ])
        );
    }

    #[test]
    fn non_separator_rejected() {
        assert_eq!(parse_separator("| a | b |"), None);
    }
}
