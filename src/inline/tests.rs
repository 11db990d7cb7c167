use super::*;
use crate::config::SafeInlineTags;
use crate::style::StyleFlags;

fn parser() -> InlineParser {
    InlineParser::new(SafeInlineTags::default())
}

fn full(text: &str) -> Vec<InlineRun> {
    parse_fully(text, SafeInlineTags::default())
}

#[test]
fn plain_text_round_trips() {
    assert_eq!(full("just text"), vec![InlineRun::plain("just text")]);
}

#[test]
fn bold_and_italic_distinguished() {
    assert_eq!(full("*i*"), vec![InlineRun::styled("i", StyleFlags::ITALIC)]);
    assert_eq!(full("**b**"), vec![InlineRun::styled("b", StyleFlags::BOLD)]);
    assert_eq!(
        full("***both***"),
        vec![InlineRun::styled("both", StyleFlags::BOLD | StyleFlags::ITALIC)]
    );
}

#[test]
fn emphasis_split_across_append_calls() {
    let mut p = parser();
    let mut runs = p.append("some *bo");
    assert_eq!(runs, vec![InlineRun::plain("some ")]);
    runs = p.append("ld* text");
    assert_eq!(
        runs,
        vec![InlineRun::styled("bold", StyleFlags::ITALIC), InlineRun::plain(" text")]
    );
    assert!(p.finish().is_empty());
}

#[test]
fn unclosed_emphasis_is_literal_at_finish() {
    let mut p = parser();
    let runs = p.append("not *closed");
    assert_eq!(runs, vec![InlineRun::plain("not ")]);
    let tail = p.finish();
    assert_eq!(tail, vec![InlineRun::plain("*closed")]);
}

#[test]
fn code_span_takes_priority_over_emphasis() {
    assert_eq!(full("`*not emphasis*`"), vec![InlineRun::styled("*not emphasis*", StyleFlags::CODE)]);
}

#[test]
fn link_with_title() {
    let runs = full(r#"[text](http://example.com "a title")"#);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "text");
    assert_eq!(runs[0].link_url.as_deref(), Some("http://example.com"));
    assert!(runs[0].style.contains(StyleFlags::LINK));
}

#[test]
fn image_payload_carries_alt_and_source() {
    let runs = full("![alt text](pic.png)");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].text, "alt text");
    let img = runs[0].image.as_ref().expect("image payload");
    assert_eq!(img.source, "pic.png");
}

#[test]
fn bare_autolink_detected() {
    let runs = full("see https://example.com/page for details");
    assert!(runs.iter().any(|r| r.link_url.as_deref() == Some("https://example.com/page")));
}

#[test]
fn trailing_punctuation_excluded_from_autolink() {
    let runs = full("visit https://example.com.");
    let link = runs.iter().find(|r| r.style.contains(StyleFlags::LINK)).expect("a link run");
    assert_eq!(link.link_url.as_deref(), Some("https://example.com"));
}

#[test]
fn strikethrough_uses_double_tilde_only() {
    assert_eq!(full("~~gone~~"), vec![InlineRun::styled("gone", StyleFlags::STRIKETHROUGH)]);
    // A run of three or more tildes is reserved for fenced code and is not
    // recognised as strikethrough here.
    assert_eq!(full("~~~not~~~"), vec![InlineRun::plain("~~~not~~~")]);
}

#[test]
fn inline_math_dollar_delimited() {
    let runs = full("$x^2$");
    assert_eq!(runs.len(), 1);
    let math = runs[0].math.as_ref().expect("math payload");
    assert_eq!(math.tex, "x^2");
    assert!(!math.display);
}

#[test]
fn escaped_delimiter_is_literal() {
    assert_eq!(full(r"\*not emphasis\*"), vec![InlineRun::plain("*not emphasis*")]);
}

#[test]
fn safe_br_tag_becomes_hard_break_run() {
    assert_eq!(full("a<br>b"), vec![InlineRun::plain("a"), InlineRun::plain("\n"), InlineRun::plain("b")]);
}

#[test]
fn unsafe_html_tag_is_literal() {
    assert_eq!(full("a<script>b"), vec![InlineRun::plain("a<script>b")]);
}

#[test]
fn kbd_tag_applies_keyboard_style() {
    let runs = full("<kbd>Ctrl</kbd>");
    assert_eq!(runs, vec![InlineRun::styled("Ctrl", StyleFlags::KEYBOARD)]);
}

#[test]
fn footnote_reference_becomes_sentinel_link() {
    let runs = full("see[^1] for detail");
    let fref = runs.iter().find(|r| r.link_url.as_deref() == Some("footnote:1")).expect("a footnote-link run");
    assert_eq!(fref.text, "[^1]");
}

#[test]
fn disabled_safe_tag_falls_back_to_literal() {
    let mut tags = SafeInlineTags::default();
    tags.kbd = false;
    let runs = parse_fully("<kbd>Ctrl</kbd>", tags);
    assert_eq!(runs, vec![InlineRun::plain("<kbd>Ctrl</kbd>")]);
}
