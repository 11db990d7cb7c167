//! Line classification: the detector
//! table tried, in order, against a line whose currently-open container
//! prefixes (blockquote markers, list indentation) have already been
//! stripped by the caller.

/// What a line looks like once the detector table has run over it.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum LineClass {
    DisplayMathOpen {
        /// `true` for `$$`, `false` for `\[`.
        dollar: bool,
        content_after: String,
    },
    FencedOpen {
        fence_char: char,
        fence_len: usize,
        info: Option<String>,
    },
    AtxHeading {
        level: u8,
        content: String,
    },
    ListItem {
        ordered: bool,
        index: Option<u64>,
        marker_indent: usize,
        task: Option<bool>,
        rest: String,
    },
    TableCandidate,
    HorizontalRule,
    FootnoteDefinition {
        id: String,
        rest: String,
    },
    OpaqueOpen,
    Paragraph,
}

/// Number of leading ASCII spaces, capped detection at `max` for the
/// "indentation <= 3 spaces" rule CommonMark-subset detectors require.
fn leading_spaces(chars: &[char]) -> usize {
    chars.iter().take_while(|&&c| c == ' ').count()
}

pub(super) fn classify_line(chars: &[char]) -> LineClass {
    let indent = leading_spaces(chars);
    let rest = &chars[indent.min(chars.len())..];

    if indent <= 3 {
        if let Some(c) = try_display_math_open(rest) {
            return c;
        }
        if let Some(c) = try_fenced_open(rest) {
            return c;
        }
        if let Some(c) = try_atx_heading(rest) {
            return c;
        }
    }

    if let Some(c) = try_list_item(chars, indent) {
        return c;
    }

    if indent <= 3 {
        if let Some(c) = try_table_candidate(rest) {
            return c;
        }
        if let Some(c) = try_horizontal_rule(rest) {
            return c;
        }
        if let Some(c) = try_footnote_definition(rest) {
            return c;
        }
        if let Some(c) = try_opaque_open(rest) {
            return c;
        }
    }

    LineClass::Paragraph
}

fn chars_to_string(chars: &[char]) -> String {
    chars.iter().collect()
}

fn try_display_math_open(rest: &[char]) -> Option<LineClass> {
    if rest.starts_with(&['$', '$']) {
        return Some(LineClass::DisplayMathOpen {
            dollar: true,
            content_after: chars_to_string(&rest[2..]),
        });
    }
    if rest.starts_with(&['\\', '[']) {
        return Some(LineClass::DisplayMathOpen {
            dollar: false,
            content_after: chars_to_string(&rest[2..]),
        });
    }
    None
}

fn try_fenced_open(rest: &[char]) -> Option<LineClass> {
    let c = *rest.first()?;
    if c != '`' && c != '~' {
        return None;
    }
    let len = rest.iter().take_while(|&&x| x == c).count();
    if len < 3 {
        return None;
    }
    // Backtick fences cannot contain a backtick in the info string.
    let info_chars = &rest[len..];
    if c == '`' && info_chars.contains(&'`') {
        return None;
    }
    let info: String = info_chars.iter().collect::<String>().trim().to_string();
    Some(LineClass::FencedOpen {
        fence_char: c,
        fence_len: len,
        info: if info.is_empty() { None } else { Some(info) },
    })
}

fn try_atx_heading(rest: &[char]) -> Option<LineClass> {
    let hashes = rest.iter().take_while(|&&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match rest.get(hashes) {
        None => {
            // A line of bare hashes with nothing after is a valid (empty)
            // ATX heading per CommonMark.
            return Some(LineClass::AtxHeading {
                level: hashes as u8,
                content: String::new(),
            });
        }
        Some(&c) if c == ' ' || c == '\t' => {}
        _ => return None,
    }
    let mut content: String = rest[hashes..].iter().collect();
    content = content.trim().to_string();
    // Strip a trailing run of '#' that itself is preceded by whitespace
    //.
    if let Some(stripped) = strip_trailing_hashes(&content) {
        content = stripped;
    }
    Some(LineClass::AtxHeading {
        level: hashes as u8,
        content,
    })
}

fn strip_trailing_hashes(content: &str) -> Option<String> {
    let trimmed_end = content.trim_end();
    let hash_run = trimmed_end.chars().rev().take_while(|&c| c == '#').count();
    if hash_run == 0 {
        return None;
    }
    let boundary = trimmed_end.len() - hash_run;
    let before = &trimmed_end[..boundary];
    if before.is_empty() || before.ends_with(' ') || before.ends_with('\t') {
        Some(before.trim_end().to_string())
    } else {
        None
    }
}

fn try_list_item(chars: &[char], indent: usize) -> Option<LineClass> {
    if indent > 3 {
        // Deep indentation outside an open list is just a paragraph in this
        // subset: there is no indented-code-block kind.
        return None;
    }
    let rest = &chars[indent..];
    let first = *rest.first()?;

    if matches!(first, '-' | '*' | '+') {
        let hr_shaped = matches!(first, '-' | '*') && is_thematic_break_shaped(rest, first);
        if rest.get(1) == Some(&' ') && !hr_shaped {
            let (task, content_start) = try_task_marker(rest, 2);
            return Some(LineClass::ListItem {
                ordered: false,
                index: None,
                marker_indent: indent,
                task,
                rest: chars_to_string(&rest[content_start..]),
            });
        }
        return None;
    }

    if first.is_ascii_digit() {
        let digit_len = rest.iter().take_while(|c| c.is_ascii_digit()).count();
        if digit_len == 0 || digit_len > 9 {
            return None;
        }
        if rest.get(digit_len) != Some(&'.') || rest.get(digit_len + 1) != Some(&' ') {
            return None;
        }
        let index: u64 = chars_to_string(&rest[..digit_len]).parse().ok()?;
        let (task, content_start) = try_task_marker(rest, digit_len + 2);
        return Some(LineClass::ListItem {
            ordered: true,
            index: Some(index),
            marker_indent: indent,
            task,
            rest: chars_to_string(&rest[content_start..]),
        });
    }

    None
}

/// `[ ]`/`[x]`/`[X]` immediately followed by a space, right after the list
/// marker. Returns the task state (if any)
/// and the content start offset (relative to `rest`).
fn try_task_marker(rest: &[char], after_marker: usize) -> (Option<bool>, usize) {
    let window = &rest[after_marker.min(rest.len())..];
    if window.len() >= 4 && window[0] == '[' && matches!(window[1], ' ' | 'x' | 'X') && window[2] == ']' && window[3] == ' ' {
        let checked = window[1] != ' ';
        return (Some(checked), after_marker + 4);
    }
    (None, after_marker)
}

/// Whether `rest` is shaped like a thematic break built from `marker`
/// (three or more of `marker`, nothing else but spaces/tabs). `-`/`*` are
/// ambiguous between a bullet list item and a horizontal rule; CommonMark
/// resolves the ambiguity in favour of the thematic break when the whole
/// line has this shape, so `try_list_item` defers to `try_horizontal_rule`
/// here rather than claiming the line itself.
fn is_thematic_break_shaped(rest: &[char], marker: char) -> bool {
    let count = rest.iter().filter(|&&c| c == marker).count();
    count >= 3 && rest.iter().all(|&c| c == marker || c == ' ' || c == '\t')
}

fn try_table_candidate(rest: &[char]) -> Option<LineClass> {
    if rest.first() != Some(&'|') {
        return None;
    }
    let pipe_count = rest.iter().filter(|&&c| c == '|').count();
    if pipe_count >= 2 { Some(LineClass::TableCandidate) } else { None }
}

fn try_horizontal_rule(rest: &[char]) -> Option<LineClass> {
    let candidates = ['-', '*', '_'];
    for c in candidates {
        let count = rest.iter().filter(|&&x| x == c).count();
        let rest_is_only_marker_and_spaces = rest.iter().all(|&x| x == c || x == ' ' || x == '\t');
        if count >= 3 && rest_is_only_marker_and_spaces && !rest.is_empty() {
            return Some(LineClass::HorizontalRule);
        }
    }
    None
}

fn try_footnote_definition(rest: &[char]) -> Option<LineClass> {
    if rest.first() != Some(&'[') || rest.get(1) != Some(&'^') {
        return None;
    }
    let close = rest.iter().position(|&c| c == ']')?;
    if close < 3 {
        // need at least one id char between `^` and `]`
        return None;
    }
    if rest.get(close + 1) != Some(&':') {
        return None;
    }
    let id: String = rest[2..close].iter().collect();
    let content_start = close + 2;
    let content_start = content_start + rest[content_start..].iter().take_while(|&&c| c == ' ').count();
    Some(LineClass::FootnoteDefinition {
        id,
        rest: chars_to_string(&rest[content_start.min(rest.len())..]),
    })
}

fn try_opaque_open(rest: &[char]) -> Option<LineClass> {
    if rest.len() >= 3 && rest[0] == ':' && rest[1] == ':' && rest[2] == ':' {
        Some(LineClass::OpaqueOpen)
    } else {
        None
    }
}
