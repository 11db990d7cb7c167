//! Shared data model: block kinds, inline runs, and the tokenizer's event
//! stream.
//!
//! The event stream is a closed enum rather than a trait object hierarchy:
//! events are dense, frequently matched by the assembler, and never
//! extended by a downstream consumer.

use crate::ids::BlockId;
use crate::style::StyleFlags;
use serde::{Deserialize, Serialize};

/// An image payload on an `InlineRun`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub source: String,
    pub title: Option<String>,
}

/// A math payload on an `InlineRun`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathPayload {
    pub tex: String,
    pub display: bool,
}

/// A contiguous span of inline text sharing one style/payload combination.
///
/// Invariants: `style.contains(LINK) <=> link_url.is_some()`,
/// `style.contains(IMAGE) <=> image.is_some()` (and then `text` holds the alt
/// text), `style.contains(MATH) <=> math.is_some()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineRun {
    pub text: String,
    pub style: StyleFlags,
    pub link_url: Option<String>,
    pub image: Option<ImagePayload>,
    pub math: Option<MathPayload>,
}

impl InlineRun {
    pub fn plain(text: impl Into<String>) -> Self {
        InlineRun {
            text: text.into(),
            style: StyleFlags::NONE,
            link_url: None,
            image: None,
            math: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: StyleFlags) -> Self {
        InlineRun {
            text: text.into(),
            style,
            link_url: None,
            image: None,
            math: None,
        }
    }

    pub fn link(text: impl Into<String>, style: StyleFlags, url: impl Into<String>) -> Self {
        InlineRun {
            text: text.into(),
            style: style | StyleFlags::LINK,
            link_url: Some(url.into()),
            image: None,
            math: None,
        }
    }

    pub fn image(alt: impl Into<String>, source: impl Into<String>, title: Option<String>) -> Self {
        InlineRun {
            text: alt.into(),
            style: StyleFlags::IMAGE,
            link_url: None,
            image: Some(ImagePayload {
                source: source.into(),
                title,
            }),
            math: None,
        }
    }

    pub fn math(tex: impl Into<String>, display: bool) -> Self {
        InlineRun {
            text: String::new(),
            style: StyleFlags::MATH,
            link_url: None,
            image: None,
            math: Some(MathPayload {
                tex: tex.into(),
                display,
            }),
        }
    }

    /// Two runs are coalescible iff style, link, image and math payloads all
    /// match.
    pub fn coalescible_with(&self, other: &InlineRun) -> bool {
        self.style == other.style && self.link_url == other.link_url && self.image == other.image && self.math == other.math
    }
}

/// Task-list checkbox state attached to a `listItem` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub checked: bool,
}

/// The structural kind of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    ListItem {
        ordered: bool,
        index: Option<u64>,
        task: Option<TaskState>,
    },
    Blockquote,
    FencedCode { language: Option<String> },
    Math { display: bool },
    Table,
    HorizontalRule,
    FootnoteDefinition { id: String, index: u64 },
    Unknown,
}

impl BlockKind {
    /// Whether this kind carries inline-parsed text (as opposed to verbatim
    /// text, or no text at all).
    pub fn is_inline_capable(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph
                | BlockKind::Heading { .. }
                | BlockKind::ListItem { .. }
                | BlockKind::FootnoteDefinition { .. }
        )
    }
}

/// Column alignment of a GFM table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableAlignment {
    Left,
    Center,
    Right,
    None,
}

/// One entry in the bottom-up stack of currently open blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenBlockState {
    pub id: BlockId,
    pub kind: BlockKind,
    pub parent_id: Option<BlockId>,
    pub depth: usize,
}

/// An incremental event emitted by the block state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockEvent {
    BlockStart {
        id: BlockId,
        kind: BlockKind,
        parent_id: Option<BlockId>,
        depth: usize,
    },
    BlockAppendInline {
        id: BlockId,
        runs: Vec<InlineRun>,
    },
    BlockAppendFencedCode {
        id: BlockId,
        text_chunk: String,
    },
    BlockAppendMath {
        id: BlockId,
        text_chunk: String,
    },
    TableHeaderCandidate {
        id: BlockId,
        cells: Vec<Vec<InlineRun>>,
    },
    TableHeaderConfirmed {
        id: BlockId,
        alignments: Vec<TableAlignment>,
    },
    TableAppendRow {
        id: BlockId,
        cells: Vec<Vec<InlineRun>>,
    },
    BlockEnd {
        id: BlockId,
    },
}

impl BlockEvent {
    /// The block id this event refers to.
    pub fn block_id(&self) -> BlockId {
        match self {
            BlockEvent::BlockStart { id, .. }
            | BlockEvent::BlockAppendInline { id, .. }
            | BlockEvent::BlockAppendFencedCode { id, .. }
            | BlockEvent::BlockAppendMath { id, .. }
            | BlockEvent::TableHeaderCandidate { id, .. }
            | BlockEvent::TableHeaderConfirmed { id, .. }
            | BlockEvent::TableAppendRow { id, .. }
            | BlockEvent::BlockEnd { id } => *id,
        }
    }
}

/// The result of one `feed`/`finish` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkResult {
    pub events: Vec<BlockEvent>,
    /// Full bottom-up stack of still-open blocks after this chunk, outermost
    /// first.
    pub open_blocks: Vec<OpenBlockState>,
}
