//! The block state machine: a line-oriented parser that
//! classifies each line, opens and closes blocks, and drives the inline
//! parser for inline-capable kinds.
//!
//! `Tokenizer` owns a per-line buffer and a stack of currently open block
//! contexts.

mod classify;
mod table;
#[cfg(test)]
mod tests;

use crate::config::TokenizerConfig;
use crate::ids::{BlockId, IdCounter};
use crate::inline::InlineParser;
use crate::model::{BlockEvent, BlockKind, ChunkResult, InlineRun, OpenBlockState, TableAlignment, TaskState};
use crate::replacement::{CompiledReplacementTable, ReplacementEngine};
use classify::{classify_line, LineClass};
use std::rc::Rc;

/// Per-block inline-processing state shared by every inline-capable kind
/// (paragraph, heading, list item, footnote definition).
struct InlineLeaf {
    replacement: ReplacementEngine,
    inline: InlineParser,
    /// Set once the first line has been fed; gates the soft-break space
    /// injected before subsequent lines.
    started: bool,
    /// Whether the previous line ended in a hard break. A line ending
    /// produces exactly one break, never both — if the previous line already
    /// emitted a hard break `"\n"` run, no soft-break space is injected
    /// before this line.
    prev_hard_break: bool,
}

impl InlineLeaf {
    fn new(table: Rc<CompiledReplacementTable>, safe_tags: crate::config::SafeInlineTags) -> Self {
        InlineLeaf {
            replacement: ReplacementEngine::new(table),
            inline: InlineParser::new(safe_tags),
            started: false,
            prev_hard_break: false,
        }
    }

    /// Feed one line's worth of content (already de-prefixed), applying the
    /// trailing-whitespace rule: a single trailing space is dropped, two or
    /// more produce a hard line break emitted as a dedicated `"\n"` run. A
    /// soft break from the previous line is injected as a literal leading
    /// space, unless the previous line already ended in a hard break.
    fn feed_line(&mut self, text: &str, is_final_partial_line: bool) -> Vec<InlineRun> {
        let soft_break_prefix = if self.started && !self.prev_hard_break { " " } else { "" };
        self.started = true;

        let (body, hard_break) = if is_final_partial_line {
            (text, false)
        } else {
            strip_trailing_space_rule(text)
        };
        self.prev_hard_break = hard_break;

        let mut fed = String::with_capacity(soft_break_prefix.len() + body.len());
        fed.push_str(soft_break_prefix);
        fed.push_str(body);

        let replaced = self.replacement.process(&fed);
        let mut runs = self.inline.append(&replaced);
        if hard_break {
            runs.extend(self.inline.finish());
            runs.push(InlineRun::plain("\n"));
        }
        runs
    }

    fn finish(&mut self) -> Vec<InlineRun> {
        let tail = self.replacement.finish();
        let mut runs = self.inline.append(&tail);
        runs.extend(self.inline.finish());
        runs
    }
}

/// Returns `(content_without_trailing_space, hard_break)`.
fn strip_trailing_space_rule(line: &str) -> (&str, bool) {
    let trimmed = line.trim_end_matches(' ');
    let trailing = line.len() - trimmed.len();
    (trimmed, trailing >= 2)
}

enum FenceKind {
    Backtick,
    Tilde,
    /// `$$ ... $$`
    DollarBlock,
    /// `\[ ... \]`
    BracketBlock,
}

struct FencedContent {
    kind: FenceKind,
    fence_len: usize,
    /// Leading whitespace width of the opening fence line, stripped from
    /// every content line.
    strip_indent: usize,
    is_math: bool,
}

impl FencedContent {
    fn is_closer(&self, raw_line: &str) -> bool {
        let trimmed = raw_line.trim();
        match self.kind {
            FenceKind::Backtick => {
                trimmed.chars().all(|c| c == '`') && trimmed.chars().count() >= self.fence_len
            }
            FenceKind::Tilde => trimmed.chars().all(|c| c == '~') && trimmed.chars().count() >= self.fence_len,
            FenceKind::DollarBlock => trimmed == "$$",
            FenceKind::BracketBlock => trimmed == "\\]",
        }
    }
}

enum TablePhase {
    /// Header confirmed; accumulating data rows.
    Rows,
}

struct TableContent {
    phase: TablePhase,
    alignments: Vec<TableAlignment>,
}

/// A table candidate that has not yet seen its separator line: no id has
/// been allocated and no events have been emitted for it.
struct PendingTableCandidate {
    parent_id: Option<BlockId>,
    depth: usize,
    first_line_raw: String,
}

struct UnknownContent {
    lines: Vec<String>,
}

enum Content {
    InlineLeaf(InlineLeaf),
    /// Blockquote: a pure container, carries no text of its own.
    Blockquote,
    /// List item: both an inline leaf (its own text) and a container for
    /// nested lists.
    ListItem { leaf: InlineLeaf, marker_indent: usize },
    Fenced(FencedContent),
    Table(TableContent),
    Unknown(UnknownContent),
}

impl Content {
    fn is_inline_leaf(&self) -> bool {
        matches!(self, Content::InlineLeaf(_) | Content::ListItem { .. })
    }
}

struct OpenBlock {
    id: BlockId,
    kind: BlockKind,
    parent_id: Option<BlockId>,
    depth: usize,
    content: Content,
}

/// The block state machine. Total and infallible: every
/// input line is classified into one of the specified kinds, malformed or
/// ambiguous constructs degrade to `unknown` rather than erroring.
pub struct Tokenizer {
    config: TokenizerConfig,
    replacement_table: Rc<CompiledReplacementTable>,
    ids: IdCounter,
    stack: Vec<OpenBlock>,
    line_buf: String,
    pending_cr: bool,
    footnote_counter: u64,
    pending_table: Option<PendingTableCandidate>,
    /// Count of characters already emitted in the current, still-open line
    /// buffer — used to trim already-processed look-behind.
    emitted_in_line: usize,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        let replacement_table = Rc::new(CompiledReplacementTable::compile(config.replacement.clone()));
        Tokenizer {
            config,
            replacement_table,
            ids: IdCounter::new(),
            stack: Vec::new(),
            line_buf: String::new(),
            pending_cr: false,
            footnote_counter: 0,
            pending_table: None,
            emitted_in_line: 0,
        }
    }

    /// Consume more input, returning the events and open-block snapshot
    /// produced so far.
    pub fn feed(&mut self, chunk: &str) -> ChunkResult {
        let mut events = Vec::new();
        for ch in chunk.chars() {
            self.feed_char(ch, &mut events);
        }
        self.enforce_look_behind();
        ChunkResult {
            events,
            open_blocks: self.open_block_states(),
        }
    }

    /// Force every unresolved construct to resolve and every open block to
    /// close.
    pub fn finish(&mut self) -> ChunkResult {
        let mut events = Vec::new();
        if !self.line_buf.is_empty() {
            let line = std::mem::take(&mut self.line_buf);
            self.process_line(&line, &mut events, true);
        }
        if let Some(pending) = self.pending_table.take() {
            self.degrade_pending_table(pending, None, &mut events);
        }
        self.close_all(&mut events);
        ChunkResult {
            events,
            open_blocks: Vec::new(),
        }
    }

    fn feed_char(&mut self, ch: char, events: &mut Vec<BlockEvent>) {
        if self.pending_cr {
            self.pending_cr = false;
            if ch == '\n' {
                return;
            }
        }
        match ch {
            '\r' => {
                self.pending_cr = true;
                self.end_line(events);
            }
            '\n' => self.end_line(events),
            _ => self.line_buf.push(ch),
        }
    }

    fn end_line(&mut self, events: &mut Vec<BlockEvent>) {
        let line = std::mem::take(&mut self.line_buf);
        self.emitted_in_line = 0;
        self.process_line(&line, events, false);
    }

    fn enforce_look_behind(&mut self) {
        let budget = self.config.max_look_behind + self.config.slack();
        if self.line_buf.chars().count() > budget {
            let drop = self.line_buf.chars().count() - self.config.max_look_behind;
            log::warn!(
                "unterminated line exceeded look-behind budget ({budget} chars); dropping {drop} leading chars"
            );
            self.line_buf = self.line_buf.chars().skip(drop).collect();
        }
    }

    fn next_id(&mut self) -> BlockId {
        self.ids.next_id()
    }

    fn safe_tags(&self) -> crate::config::SafeInlineTags {
        self.config.safe_inline_tags
    }

    fn new_leaf(&self) -> InlineLeaf {
        InlineLeaf::new(self.replacement_table.clone(), self.safe_tags())
    }

    fn current_parent(&self) -> (Option<BlockId>, usize) {
        match self.stack.last() {
            Some(top) => (Some(top.id), top.depth + 1),
            None => (None, 0),
        }
    }

    // ---- main per-line dispatch -------------------------------------------------

    fn process_line(&mut self, raw_line: &str, events: &mut Vec<BlockEvent>, is_partial_final: bool) {
        if let Some(top) = self.stack.last() {
            if matches!(top.content, Content::Fenced(_)) {
                self.handle_fenced_line(raw_line, events);
                return;
            }
        }

        let chars: Vec<char> = raw_line.chars().collect();
        let (cursor, blank) = self.peel_containers(&chars, events);
        let remainder: String = chars[cursor..].iter().collect();

        if self.pending_table.is_some() {
            self.handle_pending_table_line(&remainder, raw_line, events);
            return;
        }

        if let Some(top) = self.stack.last() {
            if matches!(top.content, Content::Table(_)) {
                self.handle_table_row(&remainder, blank, events);
                return;
            }
            if matches!(top.content, Content::Unknown(_)) {
                self.handle_unknown_line(&remainder, blank, events);
                return;
            }
        }

        if blank {
            self.close_all(events);
            return;
        }

        if let Some(top) = self.stack.last() {
            if top.content.is_inline_leaf() {
                let rest = &chars[cursor..];
                let class = classify_line(rest);
                // A blockquote marker always opens (or deepens) a blockquote,
                // even though `classify_line` itself has no notion of `>` —
                // that detection lives in `peel_containers`/
                // `try_open_blockquotes`, so it must win here too rather than
                // being swallowed as paragraph-continuation text.
                if matches!(class, LineClass::Paragraph) && !starts_with_blockquote_marker(rest) {
                    self.append_inline_continuation(&remainder, events, is_partial_final);
                    return;
                }
            }
        }

        self.classify_and_open(&remainder, events);
    }

    /// Strip blockquote `>` markers and confirm list-item indentation for
    /// every currently open container, closing any that this line does not
    /// continue. Returns the char cursor into `chars` after every matched
    /// container prefix, and whether the remainder is blank.
    fn peel_containers(&mut self, chars: &[char], events: &mut Vec<BlockEvent>) -> (usize, bool) {
        let mut cursor = 0usize;
        let mut stack_idx = 0usize;
        let mut close_from: Option<usize> = None;

        while stack_idx < self.stack.len() {
            match &self.stack[stack_idx].content {
                Content::Blockquote => {
                    let indent = count_leading_spaces(chars, cursor, 3);
                    let marker_at = cursor + indent;
                    if marker_at < chars.len() && chars[marker_at] == '>' {
                        cursor = marker_at + 1;
                        if chars.get(cursor) == Some(&' ') {
                            cursor += 1;
                        }
                        stack_idx += 1;
                        continue;
                    }
                    let rest_blank = chars[cursor..].iter().all(|c| c.is_whitespace());
                    let lazy_ok = !rest_blank && self.innermost_below_is_paragraph(stack_idx);
                    if lazy_ok {
                        break;
                    }
                    close_from = Some(stack_idx);
                    break;
                }
                Content::ListItem { marker_indent, .. } => {
                    let local = *marker_indent;
                    let cur_indent = count_leading_spaces(chars, cursor, usize::MAX);
                    let rest_blank = chars[cursor + cur_indent..].iter().all(|c| c.is_whitespace());
                    if rest_blank {
                        // A blank line is handled by the caller (closes
                        // everything); stop peeling here.
                        break;
                    }
                    if cur_indent >= local + 2 {
                        let consumed = (local + 2).min(cur_indent);
                        cursor += consumed;
                        stack_idx += 1;
                        continue;
                    }
                    close_from = Some(stack_idx);
                    break;
                }
                _ => break,
            }
        }

        if let Some(idx) = close_from {
            self.close_from(idx, events);
        }

        let remainder_blank = chars[cursor..].iter().all(|c| c.is_whitespace());
        (cursor, remainder_blank)
    }

    fn innermost_below_is_paragraph(&self, idx: usize) -> bool {
        self.stack
            .get(idx + 1)
            .is_some_and(|b| matches!(b.content, Content::InlineLeaf(_)))
            && idx + 2 == self.stack.len()
    }

    // ---- classification & opening ----------------------------------------------

    fn classify_and_open(&mut self, remainder: &str, events: &mut Vec<BlockEvent>) {
        let chars: Vec<char> = remainder.chars().collect();

        // A plain paragraph cannot have children: close it before either
        // opening a nested blockquote level or classifying what follows.
        // A still-open list item, by contrast, stays open here — reaching
        // this point with a `ListItem` on top means `peel_containers`
        // already confirmed the new content nests inside it.
        self.close_paragraph_leaf(events);

        // New blockquote levels can open here too: a line may introduce a
        // blockquote where none was open (or nest deeper than what
        // `peel_containers` matched against pre-existing contexts).
        if let Some(rest) = self.try_open_blockquotes(&chars, events) {
            self.classify_and_open(&rest, events);
            return;
        }

        let class = classify_line(&chars);
        log::trace!("line classified as {class:?}");
        match class {
            LineClass::DisplayMathOpen { dollar, content_after } => {
                self.open_display_math(dollar, &content_after, events);
            }
            LineClass::FencedOpen {
                fence_char,
                fence_len,
                info,
            } => {
                self.open_fenced(fence_char, fence_len, info, remainder, events);
            }
            LineClass::AtxHeading { level, content } => {
                self.emit_heading(level, &content, events);
            }
            LineClass::ListItem {
                ordered,
                index,
                marker_indent,
                task,
                rest,
            } => {
                self.open_list_item(ordered, index, marker_indent, task, &rest, events);
            }
            LineClass::TableCandidate => {
                let (parent_id, depth) = self.current_parent();
                self.pending_table = Some(PendingTableCandidate {
                    parent_id,
                    depth,
                    first_line_raw: remainder.to_string(),
                });
            }
            LineClass::HorizontalRule => {
                let id = self.next_id();
                let (parent_id, depth) = self.current_parent();
                events.push(BlockEvent::BlockStart {
                    id,
                    kind: BlockKind::HorizontalRule,
                    parent_id,
                    depth,
                });
                events.push(BlockEvent::BlockEnd { id });
            }
            LineClass::FootnoteDefinition { id: fid, rest } => {
                self.footnote_counter += 1;
                let index = self.footnote_counter;
                let id = self.next_id();
                let (parent_id, depth) = self.current_parent();
                let kind = BlockKind::FootnoteDefinition { id: fid, index };
                events.push(BlockEvent::BlockStart {
                    id,
                    kind: kind.clone(),
                    parent_id,
                    depth,
                });
                let mut leaf = self.new_leaf();
                let runs = leaf.feed_line(&rest, false);
                self.stack.push(OpenBlock {
                    id,
                    kind,
                    parent_id,
                    depth,
                    content: Content::ListItem { leaf, marker_indent: 0 },
                });
                if !runs.is_empty() {
                    events.push(BlockEvent::BlockAppendInline { id, runs });
                }
            }
            LineClass::OpaqueOpen => {
                let id = self.next_id();
                let (parent_id, depth) = self.current_parent();
                events.push(BlockEvent::BlockStart {
                    id,
                    kind: BlockKind::Unknown,
                    parent_id,
                    depth,
                });
                self.stack.push(OpenBlock {
                    id,
                    kind: BlockKind::Unknown,
                    parent_id,
                    depth,
                    content: Content::Unknown(UnknownContent { lines: Vec::new() }),
                });
            }
            LineClass::Paragraph => {
                self.open_paragraph(remainder, events);
            }
        }
    }

    fn try_open_blockquotes(&mut self, chars: &[char], events: &mut Vec<BlockEvent>) -> Option<String> {
        let indent = count_leading_spaces(chars, 0, 3);
        if chars.get(indent) != Some(&'>') {
            return None;
        }
        let mut cursor = indent + 1;
        if chars.get(cursor) == Some(&' ') {
            cursor += 1;
        }
        let id = self.next_id();
        let (parent_id, depth) = self.current_parent();
        events.push(BlockEvent::BlockStart {
            id,
            kind: BlockKind::Blockquote,
            parent_id,
            depth,
        });
        self.stack.push(OpenBlock {
            id,
            kind: BlockKind::Blockquote,
            parent_id,
            depth,
            content: Content::Blockquote,
        });
        Some(chars[cursor..].iter().collect())
    }

    fn open_paragraph(&mut self, content: &str, events: &mut Vec<BlockEvent>) {
        let id = self.next_id();
        let (parent_id, depth) = self.current_parent();
        log::debug!("block {id} started: paragraph (parent={parent_id:?}, depth={depth})");
        events.push(BlockEvent::BlockStart {
            id,
            kind: BlockKind::Paragraph,
            parent_id,
            depth,
        });
        let mut leaf = self.new_leaf();
        let runs = leaf.feed_line(content, false);
        self.stack.push(OpenBlock {
            id,
            kind: BlockKind::Paragraph,
            parent_id,
            depth,
            content: Content::InlineLeaf(leaf),
        });
        if !runs.is_empty() {
            events.push(BlockEvent::BlockAppendInline { id, runs });
        }
    }

    fn open_list_item(
        &mut self,
        ordered: bool,
        index: Option<u64>,
        marker_indent: usize,
        task: Option<bool>,
        rest: &str,
        events: &mut Vec<BlockEvent>,
    ) {
        let id = self.next_id();
        let (parent_id, depth) = self.current_parent();
        let kind = BlockKind::ListItem {
            ordered,
            index,
            task: task.map(|checked| TaskState { checked }),
        };
        log::debug!("block {id} started: list item (ordered={ordered}, depth={depth})");
        events.push(BlockEvent::BlockStart {
            id,
            kind: kind.clone(),
            parent_id,
            depth,
        });
        let mut leaf = self.new_leaf();
        let runs = leaf.feed_line(rest, false);
        self.stack.push(OpenBlock {
            id,
            kind,
            parent_id,
            depth,
            content: Content::ListItem { leaf, marker_indent },
        });
        if !runs.is_empty() {
            events.push(BlockEvent::BlockAppendInline { id, runs });
        }
    }

    fn emit_heading(&mut self, level: u8, content: &str, events: &mut Vec<BlockEvent>) {
        let id = self.next_id();
        let (parent_id, depth) = self.current_parent();
        log::debug!("block {id} started: heading level {level} (depth={depth})");
        events.push(BlockEvent::BlockStart {
            id,
            kind: BlockKind::Heading { level },
            parent_id,
            depth,
        });
        let runs = crate::inline::parse_fully(content, self.safe_tags());
        if !runs.is_empty() {
            events.push(BlockEvent::BlockAppendInline { id, runs });
        }
        events.push(BlockEvent::BlockEnd { id });
    }

    fn open_display_math(&mut self, dollar: bool, content_after: &str, events: &mut Vec<BlockEvent>) {
        let close_marker: &str = if dollar { "$$" } else { "\\]" };
        if let Some(close_pos) = content_after.find(close_marker) {
            // Opens and closes on the same line.
            let id = self.next_id();
            let (parent_id, depth) = self.current_parent();
            events.push(BlockEvent::BlockStart {
                id,
                kind: BlockKind::Math { display: true },
                parent_id,
                depth,
            });
            let text = &content_after[..close_pos];
            if !text.is_empty() {
                events.push(BlockEvent::BlockAppendMath {
                    id,
                    text_chunk: text.to_string(),
                });
            }
            events.push(BlockEvent::BlockEnd { id });
            return;
        }

        let id = self.next_id();
        let (parent_id, depth) = self.current_parent();
        events.push(BlockEvent::BlockStart {
            id,
            kind: BlockKind::Math { display: true },
            parent_id,
            depth,
        });
        self.stack.push(OpenBlock {
            id,
            kind: BlockKind::Math { display: true },
            parent_id,
            depth,
            content: Content::Fenced(FencedContent {
                kind: if dollar { FenceKind::DollarBlock } else { FenceKind::BracketBlock },
                fence_len: 0,
                strip_indent: 0,
                is_math: true,
            }),
        });
        if !content_after.is_empty() {
            events.push(BlockEvent::BlockAppendMath {
                id,
                text_chunk: content_after.to_string(),
            });
        }
    }

    fn open_fenced(&mut self, fence_char: char, fence_len: usize, info: Option<String>, raw_line: &str, events: &mut Vec<BlockEvent>) {
        let strip_indent = raw_line.chars().take_while(|&c| c == ' ').count();
        let is_math = info
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("math") || s.eq_ignore_ascii_case("latex"))
            .unwrap_or(false);
        let kind = if is_math {
            BlockKind::Math { display: true }
        } else {
            BlockKind::FencedCode { language: info }
        };
        let id = self.next_id();
        let (parent_id, depth) = self.current_parent();
        log::debug!("block {id} started: fenced block, fence_char={fence_char:?}, len={fence_len}");
        events.push(BlockEvent::BlockStart {
            id,
            kind: kind.clone(),
            parent_id,
            depth,
        });
        self.stack.push(OpenBlock {
            id,
            kind,
            parent_id,
            depth,
            content: Content::Fenced(FencedContent {
                kind: if fence_char == '`' { FenceKind::Backtick } else { FenceKind::Tilde },
                fence_len,
                strip_indent,
                is_math,
            }),
        });
    }

    // ---- continuing already-open blocks -----------------------------------------

    fn append_inline_continuation(&mut self, remainder: &str, events: &mut Vec<BlockEvent>, is_partial_final: bool) {
        let top = self.stack.last_mut().expect("checked by caller");
        let id = top.id;
        let runs = match &mut top.content {
            Content::InlineLeaf(leaf) => leaf.feed_line(remainder, is_partial_final),
            Content::ListItem { leaf, .. } => leaf.feed_line(remainder, is_partial_final),
            _ => unreachable!("caller only calls this for inline-leaf tops"),
        };
        if !runs.is_empty() {
            events.push(BlockEvent::BlockAppendInline { id, runs });
        }
    }

    fn handle_fenced_line(&mut self, raw_line: &str, events: &mut Vec<BlockEvent>) {
        let top = self.stack.last().expect("checked by caller");
        let Content::Fenced(fenced) = &top.content else {
            unreachable!()
        };
        if fenced.is_closer(raw_line) {
            let id = top.id;
            self.stack.pop();
            events.push(BlockEvent::BlockEnd { id });
            return;
        }

        let strip = fenced.strip_indent;
        let is_math = fenced.is_math;
        let content: String = {
            let skip = raw_line.chars().take(strip).all(|c| c == ' ');
            if skip {
                raw_line.chars().skip(strip.min(raw_line.chars().count())).collect()
            } else {
                raw_line.trim_start_matches(' ').to_string()
            }
        };
        let id = top.id;
        let mut chunk = content;
        chunk.push('\n');
        if is_math {
            events.push(BlockEvent::BlockAppendMath { id, text_chunk: chunk });
        } else {
            events.push(BlockEvent::BlockAppendFencedCode { id, text_chunk: chunk });
        }
    }

    fn handle_pending_table_line(&mut self, remainder: &str, _raw_line: &str, events: &mut Vec<BlockEvent>) {
        let pending = self.pending_table.take().expect("checked by caller");
        if let Some(alignments) = table::parse_separator(remainder) {
            let id = self.next_id();
            log::debug!("table candidate confirmed as block {id} ({} columns)", alignments.len());
            events.push(BlockEvent::BlockStart {
                id,
                kind: BlockKind::Table,
                parent_id: pending.parent_id,
                depth: pending.depth,
            });
            let header_cells: Vec<Vec<InlineRun>> = table::split_cells(&pending.first_line_raw)
                .iter()
                .map(|c| crate::inline::parse_fully(c, self.safe_tags()))
                .collect();
            events.push(BlockEvent::TableHeaderCandidate {
                id,
                cells: header_cells,
            });
            events.push(BlockEvent::TableHeaderConfirmed {
                id,
                alignments: alignments.clone(),
            });
            self.stack.push(OpenBlock {
                id,
                kind: BlockKind::Table,
                parent_id: pending.parent_id,
                depth: pending.depth,
                content: Content::Table(TableContent {
                    phase: TablePhase::Rows,
                    alignments,
                }),
            });
        } else {
            self.degrade_pending_table(pending, Some(remainder), events);
        }
    }

    fn degrade_pending_table(&mut self, pending: PendingTableCandidate, second_line: Option<&str>, events: &mut Vec<BlockEvent>) {
        let id = self.next_id();
        log::debug!("table candidate degraded to unknown block {id}: no valid separator line");
        events.push(BlockEvent::BlockStart {
            id,
            kind: BlockKind::Unknown,
            parent_id: pending.parent_id,
            depth: pending.depth,
        });
        let mut text = pending.first_line_raw.clone();
        text.push('\n');
        let mut lines = vec![pending.first_line_raw];
        if let Some(line) = second_line {
            if !line.trim().is_empty() {
                text.push_str(line);
                text.push('\n');
                lines.push(line.to_string());
            } else {
                events.push(BlockEvent::BlockAppendInline {
                    id,
                    runs: vec![InlineRun::plain(text)],
                });
                events.push(BlockEvent::BlockEnd { id });
                return;
            }
        }
        events.push(BlockEvent::BlockAppendInline {
            id,
            runs: vec![InlineRun::plain(text)],
        });
        self.stack.push(OpenBlock {
            id,
            kind: BlockKind::Unknown,
            parent_id: pending.parent_id,
            depth: pending.depth,
            content: Content::Unknown(UnknownContent { lines }),
        });
    }

    fn handle_table_row(&mut self, remainder: &str, blank: bool, events: &mut Vec<BlockEvent>) {
        if blank {
            self.close_leaf_if_open(events);
            return;
        }
        let top = self.stack.last().expect("checked by caller");
        let id = top.id;
        let cells: Vec<Vec<InlineRun>> = table::split_cells(remainder)
            .iter()
            .map(|c| crate::inline::parse_fully(c, self.safe_tags()))
            .collect();
        events.push(BlockEvent::TableAppendRow { id, cells });
    }

    fn handle_unknown_line(&mut self, remainder: &str, blank: bool, events: &mut Vec<BlockEvent>) {
        if blank {
            self.close_leaf_if_open(events);
            return;
        }
        let top = self.stack.last_mut().expect("checked by caller");
        let id = top.id;
        let Content::Unknown(unknown) = &mut top.content else {
            unreachable!()
        };
        unknown.lines.push(remainder.to_string());
        let mut text = remainder.to_string();
        text.push('\n');
        events.push(BlockEvent::BlockAppendInline {
            id,
            runs: vec![InlineRun::plain(text)],
        });
    }

    // ---- closing -----------------------------------------------------------------

    fn close_leaf_if_open(&mut self, events: &mut Vec<BlockEvent>) {
        self.close_all(events);
    }

    /// Close the stack top only if it is a bare paragraph leaf. Unlike
    /// `close_leaf_if_open`, this leaves an open `ListItem` (or any
    /// container) alone — `peel_containers` has already decided those stay
    /// open when new content nests inside them.
    fn close_paragraph_leaf(&mut self, events: &mut Vec<BlockEvent>) {
        if matches!(self.stack.last().map(|b| &b.content), Some(Content::InlineLeaf(_))) {
            self.pop_one(events);
        }
    }

    fn close_from(&mut self, idx: usize, events: &mut Vec<BlockEvent>) {
        while self.stack.len() > idx {
            self.pop_one(events);
        }
    }

    fn close_all(&mut self, events: &mut Vec<BlockEvent>) {
        while !self.stack.is_empty() {
            self.pop_one(events);
        }
    }

    fn pop_one(&mut self, events: &mut Vec<BlockEvent>) {
        let Some(mut top) = self.stack.pop() else { return };
        log::debug!("block {} closed (kind={:?})", top.id, top.kind);
        match &mut top.content {
            Content::InlineLeaf(leaf) => {
                let runs = leaf.finish();
                if !runs.is_empty() {
                    events.push(BlockEvent::BlockAppendInline { id: top.id, runs });
                }
            }
            Content::ListItem { leaf, .. } => {
                let runs = leaf.finish();
                if !runs.is_empty() {
                    events.push(BlockEvent::BlockAppendInline { id: top.id, runs });
                }
            }
            Content::Fenced(_) | Content::Blockquote | Content::Table(_) | Content::Unknown(_) => {}
        }
        let _ = top.kind;
        events.push(BlockEvent::BlockEnd { id: top.id });
    }

    fn open_block_states(&self) -> Vec<OpenBlockState> {
        self.stack
            .iter()
            .map(|b| OpenBlockState {
                id: b.id,
                kind: b.kind.clone(),
                parent_id: b.parent_id,
                depth: b.depth,
            })
            .collect()
    }
}

fn count_leading_spaces(chars: &[char], from: usize, max: usize) -> usize {
    let mut n = 0;
    while from + n < chars.len() && chars[from + n] == ' ' && n < max {
        n += 1;
    }
    n
}

fn starts_with_blockquote_marker(chars: &[char]) -> bool {
    let indent = count_leading_spaces(chars, 0, 3);
    chars.get(indent) == Some(&'>')
}
