//! The inline parser: an append-only, total parser over the
//! text inside one open inline-capable block.
//!
//! The parser never errors. Streaming
//! works by retaining, in `pending`, any suffix from the last unresolved
//! opening delimiter onward; `append` returns only runs that resolved
//! entirely within the text seen so far, and `finish` flushes `pending` as
//! literal text.

mod delimiters;
mod recognizers;
#[cfg(test)]
mod tests;

use crate::config::SafeInlineTags;
use crate::model::InlineRun;

/// Outcome of trying one recogniser at a given position.
pub(crate) enum Recognized {
    /// This recogniser does not apply here; try the next one.
    None,
    /// The construct started here but has not resolved yet; the caller
    /// should stop scanning and hold everything from this position.
    NeedMore,
    /// The construct resolved; emit `runs` and advance by `consumed` chars.
    Match { runs: Vec<InlineRun>, consumed: usize },
}

/// Context threaded through the recognisers for one scan pass.
pub(crate) struct Ctx {
    pub(crate) safe_tags: SafeInlineTags,
    pub(crate) at_end: bool,
}

pub struct InlineParser {
    pending: String,
    safe_tags: SafeInlineTags,
}

impl InlineParser {
    pub fn new(safe_tags: SafeInlineTags) -> Self {
        InlineParser {
            pending: String::new(),
            safe_tags,
        }
    }

    /// Consume more text for this block, returning the runs that resolved.
    pub fn append(&mut self, text: &str) -> Vec<InlineRun> {
        self.pending.push_str(text);
        self.scan(false)
    }

    /// Force any unresolved opening delimiter to be emitted as literal text.
    pub fn finish(&mut self) -> Vec<InlineRun> {
        self.scan(true)
    }

    fn scan(&mut self, at_end: bool) -> Vec<InlineRun> {
        let chars: Vec<char> = self.pending.chars().collect();
        let ctx = Ctx {
            safe_tags: self.safe_tags,
            at_end,
        };

        let mut runs = Vec::new();
        let mut plain_acc = String::new();
        let mut pos = 0usize;

        while pos < chars.len() {
            match recognizers::recognize(&chars, pos, &ctx) {
                Recognized::None => {
                    plain_acc.push(chars[pos]);
                    pos += 1;
                }
                Recognized::Match { runs: matched, consumed } => {
                    flush_plain(&mut plain_acc, &mut runs);
                    runs.extend(matched);
                    pos += consumed.max(1);
                }
                Recognized::NeedMore => {
                    flush_plain(&mut plain_acc, &mut runs);
                    self.pending = chars[pos..].iter().collect();
                    return runs;
                }
            }
        }

        flush_plain(&mut plain_acc, &mut runs);
        self.pending.clear();
        runs
    }
}

fn flush_plain(plain_acc: &mut String, runs: &mut Vec<InlineRun>) {
    if !plain_acc.is_empty() {
        runs.push(InlineRun::plain(std::mem::take(plain_acc)));
    }
}

/// Fully parse a self-contained span of text (used for link labels and the
/// contents of emphasis/strikethrough/math delimiters, which are complete by
/// the time the enclosing construct resolves).
pub(crate) fn parse_fully(text: &str, safe_tags: SafeInlineTags) -> Vec<InlineRun> {
    let mut parser = InlineParser::new(safe_tags);
    let mut runs = parser.append(text);
    runs.extend(parser.finish());
    runs
}
