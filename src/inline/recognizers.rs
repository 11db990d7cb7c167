//! One short predicate + recogniser pair per construct.

use super::delimiters::{find_balanced_paren_end, find_matching_bracket, find_run_of_length, is_word_char, run_length};
use super::{parse_fully, Ctx, Recognized};
use crate::model::InlineRun;
use crate::style::StyleFlags;

pub(super) fn recognize(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    let recognisers: [fn(&[char], usize, &Ctx) -> Recognized; 10] = [
        escape,
        code_span,
        image,
        footnote_ref,
        link,
        autolink,
        emphasis,
        strikethrough,
        inline_math,
        safe_html,
    ];
    for r in recognisers {
        match r(chars, pos, ctx) {
            Recognized::None => continue,
            other => return other,
        }
    }
    Recognized::None
}

// 1. Backslash escape.
fn escape(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] != '\\' {
        return Recognized::None;
    }
    if pos + 1 >= chars.len() {
        return if ctx.at_end {
            Recognized::Match {
                runs: vec![InlineRun::plain("\\")],
                consumed: 1,
            }
        } else {
            Recognized::NeedMore
        };
    }
    let next = chars[pos + 1];
    if next.is_ascii_punctuation() {
        Recognized::Match {
            runs: vec![InlineRun::plain(next.to_string())],
            consumed: 2,
        }
    } else {
        Recognized::None
    }
}

// 2. Code span.
fn code_span(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] != '`' {
        return Recognized::None;
    }
    let n = run_length(chars, pos, '`');
    match find_run_of_length(chars, pos + n, '`', n) {
        Some(close) => {
            let mut content: String = chars[pos + n..close].iter().collect();
            if content.len() > 1 && content.starts_with(' ') && content.ends_with(' ') && content.trim() != "" {
                content = content[1..content.len() - 1].to_string();
            }
            Recognized::Match {
                runs: vec![InlineRun::styled(content, StyleFlags::CODE)],
                consumed: close + n - pos,
            }
        }
        None => {
            if ctx.at_end {
                let literal: String = chars[pos..pos + n].iter().collect();
                Recognized::Match {
                    runs: vec![InlineRun::plain(literal)],
                    consumed: n,
                }
            } else {
                Recognized::NeedMore
            }
        }
    }
}

/// Shared bracket-then-paren parse for `[label](url "title")` and
/// `![alt](src "title")`.
struct BracketLinkParse {
    label: String,
    url: String,
    title: Option<String>,
    consumed: usize,
}

fn parse_bracket_link(chars: &[char], bracket_open: usize) -> Result<Option<BracketLinkParse>, ()> {
    // Err(()) means "ran out of buffer, could still complete" (NeedMore).
    // Ok(None) means "definitely not a link/image here".
    let label_close = match find_matching_bracket(chars, bracket_open) {
        Some(idx) => idx,
        None => return Err(()),
    };
    if label_close + 1 >= chars.len() {
        return Err(());
    }
    if chars[label_close + 1] != '(' {
        return Ok(None);
    }
    let paren_open = label_close + 1;
    let paren_close = match find_balanced_paren_end(chars, paren_open) {
        Some(idx) => idx,
        None => return Err(()),
    };

    let label: String = chars[bracket_open + 1..label_close].iter().collect();
    let inner: String = chars[paren_open + 1..paren_close].iter().collect();
    let (url, title) = split_url_title(&inner);

    Ok(Some(BracketLinkParse {
        label,
        url,
        title,
        consumed: paren_close + 1 - bracket_open,
    }))
}

/// Split `src optional-"title"` on the last run of whitespace that precedes
/// a double-quoted title.
fn split_url_title(inner: &str) -> (String, Option<String>) {
    let trimmed = inner.trim();
    if trimmed.ends_with('"') {
        if let Some(ws_pos) = trimmed.rfind(char::is_whitespace) {
            let (url_part, title_part) = trimmed.split_at(ws_pos);
            let title_part = title_part.trim_start();
            if title_part.len() >= 2 && title_part.starts_with('"') {
                let title = &title_part[1..title_part.len() - 1];
                return (url_part.trim_end().to_string(), Some(title.to_string()));
            }
        }
    }
    (trimmed.to_string(), None)
}

// 3. Image.
fn image(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] != '!' {
        return Recognized::None;
    }
    if pos + 1 >= chars.len() {
        return if ctx.at_end { Recognized::None } else { Recognized::NeedMore };
    }
    if chars[pos + 1] != '[' {
        return Recognized::None;
    }
    match parse_bracket_link(chars, pos + 1) {
        Err(()) => {
            if ctx.at_end {
                Recognized::None
            } else {
                Recognized::NeedMore
            }
        }
        Ok(None) => Recognized::None,
        Ok(Some(parsed)) => Recognized::Match {
            runs: vec![InlineRun::image(parsed.label, parsed.url, parsed.title)],
            consumed: parsed.consumed + 1,
        },
    }
}

// 4. Link.
fn link(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] != '[' {
        return Recognized::None;
    }
    match parse_bracket_link(chars, pos) {
        Err(()) => {
            if ctx.at_end {
                Recognized::None
            } else {
                Recognized::NeedMore
            }
        }
        Ok(None) => Recognized::None,
        Ok(Some(parsed)) => {
            let mut runs = parse_fully(&parsed.label, ctx.safe_tags);
            if runs.is_empty() {
                runs.push(InlineRun::plain(""));
            }
            for run in &mut runs {
                run.style |= StyleFlags::LINK;
                run.link_url = Some(parsed.url.clone());
            }
            Recognized::Match {
                runs,
                consumed: parsed.consumed,
            }
        }
    }
}

// Inline footnote reference: `[^id]`. Emitted as a link-style run whose
// `linkURL` is the sentinel `footnote:id` (spec §9 open question);
// downstream decides what, if anything, to do with it.
fn footnote_ref(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] != '[' || chars.get(pos + 1) != Some(&'^') {
        return Recognized::None;
    }
    let id_start = pos + 2;
    let mut k = id_start;
    while k < chars.len() && chars[k] != ']' && !chars[k].is_whitespace() {
        k += 1;
    }
    if k >= chars.len() {
        return if ctx.at_end { Recognized::None } else { Recognized::NeedMore };
    }
    if chars[k] != ']' || k == id_start {
        return Recognized::None;
    }
    let id: String = chars[id_start..k].iter().collect();
    let label = format!("[^{id}]");
    Recognized::Match {
        runs: vec![InlineRun::link(label, StyleFlags::NONE, format!("footnote:{id}"))],
        consumed: k + 1 - pos,
    }
}

// 5. Autolink: `<scheme:...>`, bare `http(s)://`, bare `www.`.
fn autolink(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] == '<' {
        return angle_autolink(chars, pos, ctx);
    }
    bare_autolink(chars, pos, ctx)
}

fn angle_autolink(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    // `<scheme:...>` where scheme is alphabetic then alnum/+/-/.
    let mut k = pos + 1;
    if k >= chars.len() || !chars[k].is_ascii_alphabetic() {
        return Recognized::None;
    }
    k += 1;
    while k < chars.len() && (chars[k].is_ascii_alphanumeric() || matches!(chars[k], '+' | '-' | '.')) {
        k += 1;
    }
    if k >= chars.len() || chars[k] != ':' {
        return Recognized::None;
    }
    k += 1;
    let content_start = pos + 1;
    loop {
        if k >= chars.len() {
            return if ctx.at_end { Recognized::None } else { Recognized::NeedMore };
        }
        match chars[k] {
            '>' => {
                let content: String = chars[content_start..k].iter().collect();
                return Recognized::Match {
                    runs: vec![InlineRun::link(content.clone(), StyleFlags::NONE, content)],
                    consumed: k + 1 - pos,
                };
            }
            c if c.is_whitespace() => return Recognized::None,
            _ => k += 1,
        }
    }
}

const BARE_PREFIXES: [&str; 3] = ["https://", "http://", "www."];

fn bare_autolink(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    let prefix = BARE_PREFIXES.iter().find(|p| matches_at(chars, pos, p));
    let Some(prefix) = prefix else {
        return Recognized::None;
    };

    let mut k = pos + prefix.chars().count();
    loop {
        if k >= chars.len() {
            if !ctx.at_end {
                return Recognized::NeedMore;
            }
            break;
        }
        if chars[k].is_whitespace() || chars[k] == '<' {
            break;
        }
        k += 1;
    }

    // Trim trailing punctuation not matched by an unbalanced opener inside
    // the URL.
    let mut end = k;
    while end > pos + prefix.chars().count() {
        let c = chars[end - 1];
        if ".,;:!?)".contains(c) {
            if c == ')' && has_unbalanced_open_paren(chars, pos, end - 1) {
                break;
            }
            end -= 1;
        } else {
            break;
        }
    }

    if end <= pos {
        return Recognized::None;
    }

    let matched: String = chars[pos..end].iter().collect();
    let url = if let Some(rest) = matched.strip_prefix("www.") {
        format!("https://{rest}")
    } else {
        matched.clone()
    };

    Recognized::Match {
        runs: vec![InlineRun::link(matched, StyleFlags::NONE, url)],
        consumed: end - pos,
    }
}

fn matches_at(chars: &[char], pos: usize, pattern: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    if pos + pat.len() > chars.len() {
        return false;
    }
    chars[pos..pos + pat.len()] == pat[..]
}

fn has_unbalanced_open_paren(chars: &[char], start: usize, before: usize) -> bool {
    let mut depth = 0i32;
    for &c in &chars[start..before] {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth > 0
}

// 6. Emphasis.
fn emphasis(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    let c = chars[pos];
    if c != '*' && c != '_' {
        return Recognized::None;
    }
    let run = run_length(chars, pos, c);
    let (target_len, style) = if run >= 3 {
        (3, StyleFlags::BOLD | StyleFlags::ITALIC)
    } else if run == 2 {
        (2, StyleFlags::BOLD)
    } else {
        (1, StyleFlags::ITALIC)
    };

    if !is_valid_opener(chars, pos, target_len, c) {
        return Recognized::None;
    }

    let search_from = pos + target_len;
    let mut k = search_from;
    loop {
        match find_run_of_length(chars, k, c, target_len) {
            Some(close) if is_valid_closer(chars, close, target_len, c) => {
                let inner: String = chars[search_from..close].iter().collect();
                let mut runs = parse_fully(&inner, ctx.safe_tags);
                for r in &mut runs {
                    r.style |= style;
                }
                if runs.is_empty() {
                    runs.push(InlineRun::styled("", style));
                }
                return Recognized::Match {
                    runs,
                    consumed: close + target_len - pos,
                };
            }
            Some(close) => {
                k = close + target_len;
            }
            None => {
                return if ctx.at_end {
                    let literal: String = chars[pos..pos + target_len].iter().collect();
                    Recognized::Match {
                        runs: vec![InlineRun::plain(literal)],
                        consumed: target_len,
                    }
                } else {
                    Recognized::NeedMore
                };
            }
        }
    }
}

fn is_valid_opener(chars: &[char], pos: usize, len: usize, delim: char) -> bool {
    let next = chars.get(pos + len);
    let Some(&next) = next else { return false };
    if next.is_whitespace() {
        return false;
    }
    if delim == '_' {
        let prev = if pos > 0 { Some(chars[pos - 1]) } else { None };
        if prev.is_some_and(is_word_char) {
            return false;
        }
    }
    true
}

fn is_valid_closer(chars: &[char], close: usize, len: usize, delim: char) -> bool {
    if close == 0 {
        return false;
    }
    let prev = chars[close - 1];
    if prev.is_whitespace() {
        return false;
    }
    if delim == '_' {
        let next = chars.get(close + len);
        if next.is_some_and(|&c| is_word_char(c)) {
            return false;
        }
    }
    true
}

// 7. Strikethrough.
fn strikethrough(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] != '~' {
        return Recognized::None;
    }
    let run = run_length(chars, pos, '~');
    if run != 2 {
        // A leading run of >= 3 is reserved for fenced-code opening at the
        // block level; inline content never
        // treats it as strikethrough.
        return Recognized::None;
    }
    match find_run_of_length(chars, pos + 2, '~', 2) {
        Some(close) => {
            let inner: String = chars[pos + 2..close].iter().collect();
            let mut runs = parse_fully(&inner, ctx.safe_tags);
            for r in &mut runs {
                r.style |= StyleFlags::STRIKETHROUGH;
            }
            if runs.is_empty() {
                runs.push(InlineRun::styled("", StyleFlags::STRIKETHROUGH));
            }
            Recognized::Match {
                runs,
                consumed: close + 2 - pos,
            }
        }
        None => {
            if ctx.at_end {
                Recognized::Match {
                    runs: vec![InlineRun::plain("~~")],
                    consumed: 2,
                }
            } else {
                Recognized::NeedMore
            }
        }
    }
}

// 8. Inline math.
fn inline_math(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] == '\\' && chars.get(pos + 1) == Some(&'(') {
        return paren_math(chars, pos, ctx);
    }
    if chars[pos] != '$' {
        return Recognized::None;
    }
    let prev_digit = pos > 0 && chars[pos - 1].is_ascii_digit();
    if prev_digit {
        return Recognized::None;
    }
    let mut k = pos + 1;
    loop {
        if k >= chars.len() {
            return if ctx.at_end { Recognized::None } else { Recognized::NeedMore };
        }
        if chars[k] == '$' {
            let next_digit = chars.get(k + 1).is_some_and(|c| c.is_ascii_digit());
            if !next_digit {
                let tex: String = chars[pos + 1..k].iter().collect();
                return Recognized::Match {
                    runs: vec![InlineRun::math(tex, false)],
                    consumed: k + 1 - pos,
                };
            }
            return Recognized::None;
        }
        k += 1;
    }
}

fn paren_math(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    let mut k = pos + 2;
    loop {
        if k + 1 >= chars.len() {
            return if ctx.at_end { Recognized::None } else { Recognized::NeedMore };
        }
        if chars[k] == '\\' && chars[k + 1] == ')' {
            let tex: String = chars[pos + 2..k].iter().collect();
            return Recognized::Match {
                runs: vec![InlineRun::math(tex, false)],
                consumed: k + 2 - pos,
            };
        }
        k += 1;
    }
}

// 9. Safe HTML subset.
fn safe_html(chars: &[char], pos: usize, ctx: &Ctx) -> Recognized {
    if chars[pos] != '<' {
        return Recognized::None;
    }
    if ctx.safe_tags.br && matches_case_insensitive(chars, pos, "<br>")
        || matches_case_insensitive(chars, pos, "<br/>")
        || matches_case_insensitive(chars, pos, "<br />")
    {
        for candidate in ["<br />", "<br/>", "<br>"] {
            if ctx.safe_tags.br && matches_case_insensitive(chars, pos, candidate) {
                return Recognized::Match {
                    runs: vec![InlineRun::plain("\n")],
                    consumed: candidate.chars().count(),
                };
            }
        }
    }

    for (tag, enabled, style) in [
        ("kbd", ctx.safe_tags.kbd, StyleFlags::KEYBOARD),
        ("sup", ctx.safe_tags.sup, StyleFlags::SUPERSCRIPT),
        ("sub", ctx.safe_tags.sub, StyleFlags::SUBSCRIPT),
    ] {
        if !enabled {
            continue;
        }
        let open = format!("<{tag}>");
        if !matches_case_insensitive(chars, pos, &open) {
            continue;
        }
        let content_start = pos + open.chars().count();
        let close = format!("</{tag}>");
        match find_literal(chars, content_start, &close) {
            Some(close_pos) => {
                let content: String = chars[content_start..close_pos].iter().collect();
                return Recognized::Match {
                    runs: vec![InlineRun::styled(content, style)],
                    consumed: close_pos + close.chars().count() - pos,
                };
            }
            None => {
                return if ctx.at_end {
                    Recognized::None
                } else {
                    Recognized::NeedMore
                };
            }
        }
    }

    Recognized::None
}

fn matches_case_insensitive(chars: &[char], pos: usize, pattern: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    if pos + pat.len() > chars.len() {
        return false;
    }
    chars[pos..pos + pat.len()]
        .iter()
        .zip(pat.iter())
        .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

fn find_literal(chars: &[char], from: usize, pattern: &str) -> Option<usize> {
    let pat: Vec<char> = pattern.chars().collect();
    if pat.is_empty() || from + pat.len() > chars.len() {
        return None;
    }
    (from..=chars.len() - pat.len()).find(|&k| {
        chars[k..k + pat.len()]
            .iter()
            .zip(pat.iter())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    })
}
