use super::*;
use crate::config::TokenizerConfig;
use crate::style::StyleFlags;

fn tokenizer() -> Tokenizer {
    Tokenizer::new(TokenizerConfig::default())
}

/// Feed a whole document as one chunk and collect `finish`'s events after it.
fn run_whole(input: &str) -> Vec<BlockEvent> {
    let mut t = tokenizer();
    let mut events = t.feed(input).events;
    events.extend(t.finish().events);
    events
}

/// Feed a document split at the given char boundaries (each a separate
/// `feed` call), then `finish`.
fn run_chunked(input: &str, splits: &[usize]) -> Vec<BlockEvent> {
    let chars: Vec<char> = input.chars().collect();
    let mut t = tokenizer();
    let mut events = Vec::new();
    let mut start = 0;
    for &split in splits {
        let chunk: String = chars[start..split].iter().collect();
        events.extend(t.feed(&chunk).events);
        start = split;
    }
    let tail: String = chars[start..].iter().collect();
    events.extend(t.feed(&tail).events);
    events.extend(t.finish().events);
    events
}

fn heading_events(level: u8, text: &str, id: BlockId) -> Vec<BlockEvent> {
    vec![
        BlockEvent::BlockStart {
            id,
            kind: BlockKind::Heading { level },
            parent_id: None,
            depth: 0,
        },
        BlockEvent::BlockAppendInline {
            id,
            runs: vec![InlineRun::plain(text)],
        },
        BlockEvent::BlockEnd { id },
    ]
}

#[test]
fn simple_paragraph_single_chunk() {
    let events = run_whole("Hello world\n");
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id: BlockId::from(0u64),
                kind: BlockKind::Paragraph,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id: BlockId::from(0u64),
                runs: vec![InlineRun::plain("Hello world")],
            },
            BlockEvent::BlockEnd { id: BlockId::from(0u64) },
        ]
    );
}

#[test]
fn paragraph_unterminated_line_closed_by_finish() {
    // No trailing newline: the final partial line only surfaces at `finish`.
    let events = run_whole("no newline at all");
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id: BlockId::from(0u64),
                kind: BlockKind::Paragraph,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id: BlockId::from(0u64),
                runs: vec![InlineRun::plain("no newline at all")],
            },
            BlockEvent::BlockEnd { id: BlockId::from(0u64) },
        ]
    );
}

#[test]
fn atx_heading_with_level() {
    let events = run_whole("### Section Title\n");
    assert_eq!(events, heading_events(3, "Section Title", BlockId::from(0u64)));
}

#[test]
fn fenced_code_with_language_emits_chunks() {
    let events = run_whole("```rust\nfn main() {}\n```\n");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::FencedCode {
                    language: Some("rust".to_string())
                },
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendFencedCode {
                id,
                text_chunk: "fn main() {}\n".to_string(),
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn unclosed_fence_is_closed_by_finish() {
    let events = run_whole("```\ncode line\n");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::FencedCode { language: None },
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendFencedCode {
                id,
                text_chunk: "code line\n".to_string(),
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn fence_info_math_keyword_opens_math_block() {
    let mut t = tokenizer();
    let result = t.feed("```math\nx^2\n```\n");
    match &result.events[0] {
        BlockEvent::BlockStart { kind: BlockKind::Math { display: true }, .. } => {}
        other => panic!("expected a math block start, got {other:?}"),
    }
}

#[test]
fn gfm_table_confirms_on_valid_separator() {
    let events = run_whole("| a | b |\n| --- | --- |\n| 1 | 2 |\n");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::Table,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::TableHeaderCandidate {
                id,
                cells: vec![vec![InlineRun::plain("a")], vec![InlineRun::plain("b")]],
            },
            BlockEvent::TableHeaderConfirmed {
                id,
                alignments: vec![TableAlignment::None, TableAlignment::None],
            },
            BlockEvent::TableAppendRow {
                id,
                cells: vec![vec![InlineRun::plain("1")], vec![InlineRun::plain("2")]],
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn table_candidate_degrades_to_unknown_without_separator() {
    let events = run_whole("| a | b |\njust some text\n");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::Unknown,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::plain("| a | b |\njust some text\n")],
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn table_candidate_with_no_second_line_degrades_at_finish() {
    let events = run_whole("| only one line |");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::Unknown,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::plain("| only one line |\n")],
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn hard_break_emits_dedicated_newline_run() {
    let events = run_whole("line one  \nline two\n");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::Paragraph,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::plain("line one"), InlineRun::plain("\n")],
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::plain("line two")],
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn single_trailing_space_is_dropped_not_a_break() {
    let events = run_whole("line one \nline two\n");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::Paragraph,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::plain("line one")],
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::plain(" line two")],
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn horizontal_rule_is_a_self_closing_block() {
    let events = run_whole("---\n");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::HorizontalRule,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn blank_line_terminates_open_paragraph() {
    let mut t = tokenizer();
    let first = t.feed("para text\n\n").events;
    let id = BlockId::from(0u64);
    assert_eq!(
        first,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::Paragraph,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::plain("para text")],
            },
            BlockEvent::BlockEnd { id },
        ]
    );
    assert!(t.finish().events.is_empty());
}

#[test]
fn nested_list_item_opens_as_child_not_sibling() {
    let events = run_whole("- outer\n  - inner\n");
    let outer = BlockId::from(0u64);
    let inner = BlockId::from(1u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id: outer,
                kind: BlockKind::ListItem {
                    ordered: false,
                    index: None,
                    task: None,
                },
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id: outer,
                runs: vec![InlineRun::plain("outer")],
            },
            BlockEvent::BlockStart {
                id: inner,
                kind: BlockKind::ListItem {
                    ordered: false,
                    index: None,
                    task: None,
                },
                parent_id: Some(outer),
                depth: 1,
            },
            BlockEvent::BlockAppendInline {
                id: inner,
                runs: vec![InlineRun::plain("inner")],
            },
            BlockEvent::BlockEnd { id: inner },
            BlockEvent::BlockEnd { id: outer },
        ]
    );
}

#[test]
fn sibling_list_items_at_same_indent_do_not_nest() {
    let events = run_whole("- one\n- two\n");
    let first = BlockId::from(0u64);
    let second = BlockId::from(1u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id: first,
                kind: BlockKind::ListItem {
                    ordered: false,
                    index: None,
                    task: None,
                },
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id: first,
                runs: vec![InlineRun::plain("one")],
            },
            BlockEvent::BlockEnd { id: first },
            BlockEvent::BlockStart {
                id: second,
                kind: BlockKind::ListItem {
                    ordered: false,
                    index: None,
                    task: None,
                },
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id: second,
                runs: vec![InlineRun::plain("two")],
            },
            BlockEvent::BlockEnd { id: second },
        ]
    );
}

#[test]
fn task_list_item_carries_checked_state() {
    let events = run_whole("- [x] done\n");
    match &events[0] {
        BlockEvent::BlockStart {
            kind: BlockKind::ListItem { task: Some(TaskState { checked: true }), .. },
            ..
        } => {}
        other => panic!("expected a checked task item, got {other:?}"),
    }
}

#[test]
fn blockquote_wraps_its_paragraph() {
    let events = run_whole("> quoted text\n");
    let bq = BlockId::from(0u64);
    let para = BlockId::from(1u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id: bq,
                kind: BlockKind::Blockquote,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockStart {
                id: para,
                kind: BlockKind::Paragraph,
                parent_id: Some(bq),
                depth: 1,
            },
            BlockEvent::BlockAppendInline {
                id: para,
                runs: vec![InlineRun::plain("quoted text")],
            },
            BlockEvent::BlockEnd { id: para },
            BlockEvent::BlockEnd { id: bq },
        ]
    );
}

#[test]
fn nested_blockquote_levels() {
    let events = run_whole("> outer\n> > inner\n");
    let outer_bq = BlockId::from(0u64);
    let outer_para = BlockId::from(1u64);
    let inner_bq = BlockId::from(2u64);
    let inner_para = BlockId::from(3u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id: outer_bq,
                kind: BlockKind::Blockquote,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockStart {
                id: outer_para,
                kind: BlockKind::Paragraph,
                parent_id: Some(outer_bq),
                depth: 1,
            },
            BlockEvent::BlockAppendInline {
                id: outer_para,
                runs: vec![InlineRun::plain("outer")],
            },
            BlockEvent::BlockEnd { id: outer_para },
            BlockEvent::BlockStart {
                id: inner_bq,
                kind: BlockKind::Blockquote,
                parent_id: Some(outer_bq),
                depth: 1,
            },
            BlockEvent::BlockStart {
                id: inner_para,
                kind: BlockKind::Paragraph,
                parent_id: Some(inner_bq),
                depth: 2,
            },
            BlockEvent::BlockAppendInline {
                id: inner_para,
                runs: vec![InlineRun::plain("inner")],
            },
            BlockEvent::BlockEnd { id: inner_para },
            BlockEvent::BlockEnd { id: inner_bq },
            BlockEvent::BlockEnd { id: outer_bq },
        ]
    );
}

#[test]
fn footnote_definition_keeps_its_id() {
    let events = run_whole("[^note]: the footnote body\n");
    match &events[0] {
        BlockEvent::BlockStart {
            kind: BlockKind::FootnoteDefinition { id, index },
            ..
        } => {
            assert_eq!(id, "note");
            assert_eq!(*index, 1);
        }
        other => panic!("expected a footnote definition start, got {other:?}"),
    }
}

#[test]
fn emphasis_spanning_a_line_continuation_includes_the_soft_break() {
    // The soft break between lines of the same paragraph becomes a literal
    // space, so the emphasis content below is "bo ld", not "bold".
    let events = run_whole("text *bo\nld* more\n");
    let id = BlockId::from(0u64);
    assert_eq!(
        events,
        vec![
            BlockEvent::BlockStart {
                id,
                kind: BlockKind::Paragraph,
                parent_id: None,
                depth: 0,
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::plain("text ")],
            },
            BlockEvent::BlockAppendInline {
                id,
                runs: vec![InlineRun::styled("bo ld", StyleFlags::ITALIC), InlineRun::plain(" more")],
            },
            BlockEvent::BlockEnd { id },
        ]
    );
}

#[test]
fn open_blocks_snapshot_reports_still_open_containers() {
    // The line is terminated (and thus fully processed into the stack), but
    // no blank line or fence-close has occurred yet, so both the blockquote
    // and its paragraph are still open at the end of this `feed` call.
    let mut t = tokenizer();
    let result = t.feed("> still open text\n");
    assert_eq!(result.open_blocks.len(), 2);
    assert_eq!(result.open_blocks[0].kind, BlockKind::Blockquote);
    assert_eq!(result.open_blocks[0].depth, 0);
    assert_eq!(result.open_blocks[1].depth, 1);
}

#[test]
fn chunk_partitioning_does_not_change_the_event_stream() {
    let doc = "# Title\n\nA paragraph with *emphasis* and `code`.\n\n- item one\n  - nested\n- item two\n\n```rust\nfn f() {}\n```\n\n| a | b |\n| - | - |\n| 1 | 2 |\n";
    let whole = run_whole(doc);
    let char_count = doc.chars().count();

    let partitions: &[&[usize]] = &[
        &[1],
        &[5, 12, 40],
        &[3, 6, 9, 20, 45, 70, 90],
    ];
    for splits in partitions {
        let splits: Vec<usize> = splits.iter().copied().filter(|&s| s < char_count).collect();
        let chunked = run_chunked(doc, &splits);
        assert_eq!(chunked, whole, "mismatch for splits {splits:?}");
    }
}

#[test]
fn every_char_as_its_own_chunk_matches_whole_feed() {
    let doc = "## Heading\n\nSome *text* and a [link](http://x.test).\n";
    let whole = run_whole(doc);

    let mut t = tokenizer();
    let mut events = Vec::new();
    for ch in doc.chars() {
        events.extend(t.feed(&ch.to_string()).events);
    }
    events.extend(t.finish().events);
    assert_eq!(events, whole);
}
