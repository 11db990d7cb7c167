//! The replacement engine: two independent streaming
//! machines — longest-first literal substitution and `:shortcode:` emoji
//! expansion — interposed between the block state machine and the inline
//! parser for every inline-capable block.
//!
//! Invariant: for every byte fed, either that byte (possibly replaced) is
//! eventually emitted, or `finish` flushes it. No byte is dropped.


use crate::config::ReplacementConfig;
use std::collections::HashSet;
use std::rc::Rc;

/// A `ReplacementConfig` plus its precomputed prefix set, shared (via `Rc`)
/// across every per-block `ReplacementEngine` so the prefix set is computed
/// once per tokenizer rather than once per block.
#[derive(Debug)]
pub struct CompiledReplacementTable {
    config: ReplacementConfig,
    prefix_set: HashSet<String>,
}

impl CompiledReplacementTable {
    pub fn compile(config: ReplacementConfig) -> Self {
        let prefix_set = config.prefix_set();
        CompiledReplacementTable { config, prefix_set }
    }

    fn is_proper_prefix(&self, s: &str) -> bool {
        self.prefix_set.contains(s)
    }

    fn is_exact_pattern(&self, s: &str) -> Option<&str> {
        self.config.literal_replacements.get(s).map(String::as_str)
    }

    fn could_start(&self, s: &str) -> bool {
        self.is_proper_prefix(s) || self.config.literal_replacements.contains_key(s)
    }

    fn shortcode_emoji(&self, name: &str) -> Option<&str> {
        self.config.emoji_shortcodes.get(name).map(String::as_str)
    }

    fn max_shortcode_len(&self) -> usize {
        self.config.max_shortcode_len
    }
}

#[derive(Debug, Clone)]
enum ShortcodeState {
    Idle,
    Pending,
    Collecting(String),
}

/// Per-block streaming state for the replacement engine. Cheap to create:
/// construction only clones an `Rc`.
pub struct ReplacementEngine {
    table: Rc<CompiledReplacementTable>,
    literal_buf: String,
    shortcode_state: ShortcodeState,
}

impl ReplacementEngine {
    pub fn new(table: Rc<CompiledReplacementTable>) -> Self {
        ReplacementEngine {
            table,
            literal_buf: String::new(),
            shortcode_state: ShortcodeState::Idle,
        }
    }

    /// Feed more text, returning everything that can be emitted now.
    pub fn process(&mut self, text: &str) -> String {
        let literal_out = self.process_literal(text);
        self.process_shortcode(&literal_out)
    }

    /// Flush all held-back state as literal text.
    pub fn finish(&mut self) -> String {
        let literal_tail = self.flush_literal();
        let mut out = self.process_shortcode(&literal_tail);
        out.push_str(&self.flush_shortcode());
        out
    }

    fn process_literal(&mut self, text: &str) -> String {
        let mut out = String::new();
        for c in text.chars() {
            let mut candidate = self.literal_buf.clone();
            candidate.push(c);

            if self.table.is_proper_prefix(&candidate) {
                self.literal_buf = candidate;
                continue;
            }
            if let Some(replacement) = self.table.is_exact_pattern(&candidate) {
                out.push_str(replacement);
                self.literal_buf.clear();
                continue;
            }

            // `candidate` cannot extend or complete a pattern: resolve
            // whatever was held in `literal_buf` first.
            if !self.literal_buf.is_empty() {
                self.emit_buf(&mut out);
            }

            let single = c.to_string();
            if self.table.could_start(&single) {
                self.literal_buf = single;
            } else {
                out.push(c);
            }
        }
        out
    }

    fn emit_buf(&mut self, out: &mut String) {
        if let Some(replacement) = self.table.is_exact_pattern(&self.literal_buf) {
            out.push_str(replacement);
        } else {
            out.push_str(&self.literal_buf);
        }
        self.literal_buf.clear();
    }

    fn flush_literal(&mut self) -> String {
        // A buffer only survives to `finish` because it was still an open
        // question whether it would extend into a longer pattern; with no
        // more input coming, it is never substituted and goes out verbatim.
        let out = std::mem::take(&mut self.literal_buf);
        out
    }

    fn process_shortcode(&mut self, text: &str) -> String {
        let mut out = String::new();
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            match &mut self.shortcode_state {
                ShortcodeState::Idle => {
                    if ch == ':' {
                        self.shortcode_state = ShortcodeState::Pending;
                    } else {
                        out.push(ch);
                    }
                    i += 1;
                }
                ShortcodeState::Pending => {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        self.shortcode_state = ShortcodeState::Collecting(ch.to_string());
                        i += 1;
                    } else {
                        out.push(':');
                        self.shortcode_state = ShortcodeState::Idle;
                        // retry `ch` in Idle state
                    }
                }
                ShortcodeState::Collecting(buf) => {
                    if ch == ':' {
                        if let Some(emoji) = self.table.shortcode_emoji(buf) {
                            out.push_str(emoji);
                        } else {
                            out.push(':');
                            out.push_str(buf);
                            out.push(':');
                        }
                        self.shortcode_state = ShortcodeState::Idle;
                        i += 1;
                    } else if ch.is_ascii_alphanumeric() || ch == '_' {
                        buf.push(ch);
                        if buf.len() > self.table.max_shortcode_len() {
                            out.push(':');
                            out.push_str(buf);
                            self.shortcode_state = ShortcodeState::Idle;
                        }
                        i += 1;
                    } else {
                        out.push(':');
                        out.push_str(buf);
                        self.shortcode_state = ShortcodeState::Idle;
                        // retry `ch` in Idle state
                    }
                }
            }
        }
        out
    }

    fn flush_shortcode(&mut self) -> String {
        let mut out = String::new();
        match std::mem::replace(&mut self.shortcode_state, ShortcodeState::Idle) {
            ShortcodeState::Idle => {}
            ShortcodeState::Pending => out.push(':'),
            ShortcodeState::Collecting(buf) => {
                out.push(':');
                out.push_str(&buf);
            }
        }
        out
    }
}
