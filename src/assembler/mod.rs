//! The block assembler: applies the tokenizer's ordered
//! events to a store of `BlockSnapshot`s, coalesces adjacent equivalent
//! inline runs at the append seam, evicts closed blocks beyond a retention
//! window, and emits a minimal `AssemblerDiff` per batch.
//!
//! Block tree without pointers: the store is a flat,
//! append-ordered `Vec<BlockSnapshot>` plus an `id -> index` map, exactly as
//! the design notes describe — parent/child relationships are recorded as
//! `BlockId`s resolved through that map, never as owned references. This
//! sidesteps cyclic ownership and gives O(1) neighbour access from a
//! `BlockId` alone.


use crate::config::AssemblerConfig;
use crate::ids::BlockId;
use crate::model::{BlockEvent, BlockKind, ChunkResult, InlineRun, TableAlignment};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;

/// The assembler's view of an open or closed GFM table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSnapshot {
    /// Set once a `tableHeaderCandidate` event lands; provisional until
    /// `headerConfirmed` is also set (the tokenizer never emits a candidate
    /// that it goes on to retract, so in practice these always arrive
    /// together — see `PendingTableCandidate` in `bsm`).
    pub header_cells: Option<Vec<Vec<InlineRun>>>,
    pub alignments: Option<Vec<TableAlignment>>,
    pub rows: Vec<Vec<Vec<InlineRun>>>,
}

/// A block's accumulated state as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSnapshot {
    pub id: BlockId,
    pub kind: BlockKind,
    pub inline_runs: Option<Vec<InlineRun>>,
    pub code_text: Option<String>,
    pub math_text: Option<String>,
    pub table: Option<TableSnapshot>,
    pub is_closed: bool,
    pub parent_id: Option<BlockId>,
    pub depth: usize,
    pub child_ids: Vec<BlockId>,
}

impl BlockSnapshot {
    fn new(id: BlockId, kind: BlockKind, parent_id: Option<BlockId>, depth: usize) -> Self {
        BlockSnapshot {
            id,
            kind,
            inline_runs: None,
            code_text: None,
            math_text: None,
            table: None,
            is_closed: false,
            parent_id,
            depth,
            child_ids: Vec::new(),
        }
    }

    /// Approximate textual byte footprint, used only to evaluate the
    /// assembler's byte-based retention cap.
    /// Deliberately approximate: an estimate cheap enough to recompute on
    /// every retention check, not an exact accounting of `InlineRun`
    /// payloads.
    fn approx_byte_size(&self) -> usize {
        let mut size = 0usize;
        if let Some(runs) = &self.inline_runs {
            size += runs.iter().map(|r| r.text.len()).sum::<usize>();
        }
        size += self.code_text.as_ref().map_or(0, String::len);
        size += self.math_text.as_ref().map_or(0, String::len);
        if let Some(table) = &self.table {
            if let Some(header) = &table.header_cells {
                size += cells_byte_size(header);
            }
            for row in &table.rows {
                size += cells_byte_size(row);
            }
        }
        size
    }
}

fn cells_byte_size(cells: &[Vec<InlineRun>]) -> usize {
    cells
        .iter()
        .flat_map(|cell| cell.iter())
        .map(|run| run.text.len())
        .sum()
}

/// One entry in an `AssemblerDiff`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Change {
    BlockStarted {
        id: BlockId,
        kind: BlockKind,
        /// Index among this block's siblings (its parent's children, or the
        /// root list) at the moment it was inserted.
        position: usize,
    },
    RunsAppended {
        id: BlockId,
        runs: Vec<InlineRun>,
    },
    CodeAppended {
        id: BlockId,
        chunk: String,
    },
    MathAppended {
        id: BlockId,
        chunk: String,
    },
    TableHeaderConfirmed {
        id: BlockId,
    },
    TableRowAppended {
        id: BlockId,
        row: Vec<Vec<InlineRun>>,
    },
    BlockEnded {
        id: BlockId,
    },
    /// A contiguous range of block ids evicted by the retention window.
    /// Half-open, `start..end`.
    BlocksDiscarded {
        range: Range<u64>,
    },
}

/// The result of one `Assembler::apply` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssemblerDiff {
    pub document_version: u64,
    pub changes: Vec<Change>,
}

/// Applies tokenizer events to an ordered block store.
///
/// Single-writer, multiple-reader by contract: nothing here
/// is internally synchronized, a host that shares one `Assembler` across
/// threads is expected to serialize access the same way it would serialize
/// access to the `Tokenizer` (see crate docs). `block`/`blocks` return
/// borrows rather than clones — a caller that needs a consistent view
/// across several blocks should take its borrow once and read every block
/// it needs from that single borrow, rather than re-borrowing between reads.
pub struct Assembler {
    config: AssemblerConfig,
    blocks: Vec<BlockSnapshot>,
    position_of: HashMap<BlockId, usize>,
    /// Ids of root-level (`parent_id.is_none()`) blocks, in document order;
    /// only these are ever evicted by the retention window.
    roots: Vec<BlockId>,
    document_version: u64,
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Assembler {
            config,
            blocks: Vec::new(),
            position_of: HashMap::new(),
            roots: Vec::new(),
            document_version: 0,
        }
    }

    pub fn document_version(&self) -> u64 {
        self.document_version
    }

    pub fn block(&self, id: BlockId) -> Option<&BlockSnapshot> {
        self.position_of.get(&id).map(|&idx| &self.blocks[idx])
    }

    pub fn blocks(&self) -> &[BlockSnapshot] {
        &self.blocks
    }

    fn block_mut(&mut self, id: BlockId) -> Option<&mut BlockSnapshot> {
        let idx = *self.position_of.get(&id)?;
        Some(&mut self.blocks[idx])
    }

    /// Apply every event produced by one `Tokenizer::feed`/`finish` call, in
    /// order, and return the resulting diff.
    pub fn apply(&mut self, result: ChunkResult) -> AssemblerDiff {
        let mut changes = Vec::new();
        for event in result.events {
            self.apply_event(event, &mut changes);
        }
        self.enforce_retention(&mut changes);

        if changes.is_empty() {
            return AssemblerDiff {
                document_version: self.document_version,
                changes,
            };
        }
        self.document_version += 1;
        log::debug!(
            "assembler applied batch: {} changes, document_version={}",
            changes.len(),
            self.document_version
        );
        AssemblerDiff {
            document_version: self.document_version,
            changes,
        }
    }

    fn apply_event(&mut self, event: BlockEvent, changes: &mut Vec<Change>) {
        match event {
            BlockEvent::BlockStart { id, kind, parent_id, depth } => {
                self.handle_block_start(id, kind, parent_id, depth, changes);
            }
            BlockEvent::BlockAppendInline { id, runs } => {
                self.handle_append_inline(id, runs, changes);
            }
            BlockEvent::BlockAppendFencedCode { id, text_chunk } => {
                let Some(block) = self.block_mut(id) else {
                    warn_unknown_id("blockAppendFencedCode", id);
                    return;
                };
                block.code_text.get_or_insert_with(String::new).push_str(&text_chunk);
                changes.push(Change::CodeAppended { id, chunk: text_chunk });
            }
            BlockEvent::BlockAppendMath { id, text_chunk } => {
                let Some(block) = self.block_mut(id) else {
                    warn_unknown_id("blockAppendMath", id);
                    return;
                };
                block.math_text.get_or_insert_with(String::new).push_str(&text_chunk);
                changes.push(Change::MathAppended { id, chunk: text_chunk });
            }
            BlockEvent::TableHeaderCandidate { id, cells } => {
                let Some(block) = self.block_mut(id) else {
                    warn_unknown_id("tableHeaderCandidate", id);
                    return;
                };
                block.table.get_or_insert_with(TableSnapshot::default).header_cells = Some(cells);
                // No Change: provisional until tableHeaderConfirmed.
            }
            BlockEvent::TableHeaderConfirmed { id, alignments } => {
                let Some(block) = self.block_mut(id) else {
                    warn_unknown_id("tableHeaderConfirmed", id);
                    return;
                };
                block.table.get_or_insert_with(TableSnapshot::default).alignments = Some(alignments);
                changes.push(Change::TableHeaderConfirmed { id });
            }
            BlockEvent::TableAppendRow { id, cells } => {
                let Some(block) = self.block_mut(id) else {
                    warn_unknown_id("tableAppendRow", id);
                    return;
                };
                block.table.get_or_insert_with(TableSnapshot::default).rows.push(cells.clone());
                changes.push(Change::TableRowAppended { id, row: cells });
            }
            BlockEvent::BlockEnd { id } => {
                let Some(block) = self.block_mut(id) else {
                    warn_orphan_block_end(id);
                    return;
                };
                block.is_closed = true;
                changes.push(Change::BlockEnded { id });
                log::debug!("block {id} closed");
            }
        }
    }

    fn handle_block_start(
        &mut self,
        id: BlockId,
        kind: BlockKind,
        parent_id: Option<BlockId>,
        depth: usize,
        changes: &mut Vec<Change>,
    ) {
        let position = match parent_id {
            Some(pid) => match self.block_mut(pid) {
                Some(parent) => {
                    let pos = parent.child_ids.len();
                    parent.child_ids.push(id);
                    pos
                }
                None => {
                    log::warn!("blockStart {id} named unknown parent {pid}; treating as root");
                    self.roots.push(id);
                    self.roots.len() - 1
                }
            },
            None => {
                self.roots.push(id);
                self.roots.len() - 1
            }
        };

        log::debug!("block {id} started: {kind:?} (parent={parent_id:?}, depth={depth})");
        let snapshot = BlockSnapshot::new(id, kind.clone(), parent_id, depth);
        self.position_of.insert(id, self.blocks.len());
        self.blocks.push(snapshot);
        changes.push(Change::BlockStarted { id, kind, position });
    }

    fn handle_append_inline(&mut self, id: BlockId, runs: Vec<InlineRun>, changes: &mut Vec<Change>) {
        let Some(block) = self.block_mut(id) else {
            warn_unknown_id("blockAppendInline", id);
            return;
        };
        let existing = block.inline_runs.get_or_insert_with(Vec::new);
        // Coalesce at the seam only — bounded, O(1) amortised per appended
        // run: never rescan runs already settled
        // from a previous batch.
        for run in runs.iter().cloned() {
            match existing.last_mut() {
                Some(last) if last.coalescible_with(&run) => last.text.push_str(&run.text),
                _ => existing.push(run),
            }
        }
        changes.push(Change::RunsAppended { id, runs });
    }

    /// Evict leading closed root blocks (and their descendants) beyond the
    /// configured count/byte caps, emitting one `BlocksDiscarded` change per
    /// `apply` call if anything was evicted.
    fn enforce_retention(&mut self, changes: &mut Vec<Change>) {
        if self.config.retention_blocks.is_none() && self.config.retention_bytes.is_none() {
            return;
        }

        let closed_prefix_len = self
            .roots
            .iter()
            .take_while(|id| self.block(**id).is_some_and(|b| b.is_closed))
            .count();
        if closed_prefix_len == 0 {
            return;
        }

        let mut evict_count = 0usize;
        loop {
            let remaining_closed = closed_prefix_len - evict_count;
            let exceeds_count = self.config.retention_blocks.is_some_and(|cap| remaining_closed > cap);
            let exceeds_bytes = self.config.retention_bytes.is_some_and(|cap| {
                let total: usize = self.roots[evict_count..closed_prefix_len]
                    .iter()
                    .map(|id| self.subtree_byte_size(*id))
                    .sum();
                total > cap
            });
            if !exceeds_count && !exceeds_bytes {
                break;
            }
            evict_count += 1;
            if evict_count >= closed_prefix_len {
                break;
            }
        }

        if evict_count == 0 {
            return;
        }

        let evicted_roots: Vec<BlockId> = self.roots.drain(0..evict_count).collect();
        let mut discarded_ids: Vec<u64> = Vec::new();
        for root in &evicted_roots {
            self.collect_subtree_ids(*root, &mut discarded_ids);
        }
        let min_id = *discarded_ids.iter().min().expect("non-empty eviction");
        let max_id = *discarded_ids.iter().max().expect("non-empty eviction");

        let discarded: std::collections::HashSet<u64> = discarded_ids.into_iter().collect();
        self.blocks.retain(|b| !discarded.contains(&b.id.get()));
        self.position_of.clear();
        for (idx, block) in self.blocks.iter().enumerate() {
            self.position_of.insert(block.id, idx);
        }

        log::debug!("assembler discarded blocks {min_id}..{}", max_id + 1);
        changes.push(Change::BlocksDiscarded {
            range: min_id..(max_id + 1),
        });
    }

    fn subtree_byte_size(&self, id: BlockId) -> usize {
        let Some(block) = self.block(id) else { return 0 };
        let own = block.approx_byte_size();
        let children: usize = block.child_ids.iter().map(|c| self.subtree_byte_size(*c)).sum();
        own + children
    }

    fn collect_subtree_ids(&self, id: BlockId, out: &mut Vec<u64>) {
        out.push(id.get());
        if let Some(block) = self.block(id) {
            for child in block.child_ids.clone() {
                self.collect_subtree_ids(child, out);
            }
        }
    }
}

/// An event referenced a block id the assembler has no record of. Indicates
/// a tokenizer/host bug rather than malformed user input — logged and
/// ignored, never panics; the assembler stays total over its own event
/// stream.
fn warn_unknown_id(event_name: &str, id: BlockId) {
    log::warn!("{event_name} referenced unknown block id {id}; ignoring");
}

fn warn_orphan_block_end(id: BlockId) {
    log::warn!("blockEnd with no matching blockStart for id {id}; ignoring");
}
