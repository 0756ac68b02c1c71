//! Rich text blocks and their two transforms: plain text and HTML
//!
//! Blocks follow the shape the CMS stores them in. Span offsets count UTF-16
//! code units, as the CMS editor does.

use serde::{Deserialize, Serialize};

use crate::helpers::{escape_text, html_escape};

/// Kind of a rich text block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    Paragraph,
    /// `heading1` to `heading6`
    Heading(u8),
    Preformatted,
    ListItem,
    OrderedListItem,
    Image,
    Embed,
    Other(String),
}

impl From<String> for BlockKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "paragraph" => BlockKind::Paragraph,
            "preformatted" => BlockKind::Preformatted,
            "list-item" => BlockKind::ListItem,
            "o-list-item" => BlockKind::OrderedListItem,
            "image" => BlockKind::Image,
            "embed" => BlockKind::Embed,
            other => match other.strip_prefix("heading").and_then(|n| n.parse::<u8>().ok()) {
                Some(level @ 1..=6) => BlockKind::Heading(level),
                _ => BlockKind::Other(kind),
            },
        }
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Paragraph => "paragraph".to_string(),
            BlockKind::Heading(level) => format!("heading{}", level),
            BlockKind::Preformatted => "preformatted".to_string(),
            BlockKind::ListItem => "list-item".to_string(),
            BlockKind::OrderedListItem => "o-list-item".to_string(),
            BlockKind::Image => "image".to_string(),
            BlockKind::Embed => "embed".to_string(),
            BlockKind::Other(kind) => kind,
        }
    }
}

/// Kind of an inline span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    Other(String),
}

impl From<String> for SpanKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "strong" => SpanKind::Strong,
            "em" => SpanKind::Em,
            "hyperlink" => SpanKind::Hyperlink,
            "label" => SpanKind::Label,
            _ => SpanKind::Other(kind),
        }
    }
}

impl From<SpanKind> for String {
    fn from(kind: SpanKind) -> Self {
        match kind {
            SpanKind::Strong => "strong".to_string(),
            SpanKind::Em => "em".to_string(),
            SpanKind::Hyperlink => "hyperlink".to_string(),
            SpanKind::Label => "label".to_string(),
            SpanKind::Other(kind) => kind,
        }
    }
}

/// Extra data of hyperlink and label spans
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Inline formatting over `[start, end)` of a block's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

/// oEmbed payload of an embed block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub embed_type: Option<String>,
}

/// One rich text block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

impl RichTextBlock {
    /// A block of `kind` with plain text
    pub fn new(kind: BlockKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn with_span(mut self, start: usize, end: usize, kind: SpanKind) -> Self {
        self.spans.push(Span {
            start,
            end,
            kind,
            data: None,
        });
        self
    }
}

/// Flatten blocks to plain text, one space between blocks that carry text
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .filter(|b| !b.text.is_empty())
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render blocks to HTML
///
/// Text is escaped; embed HTML is passed through untouched.
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block.kind {
            BlockKind::ListItem => Some("ul"),
            BlockKind::OrderedListItem => Some("ol"),
            _ => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        match &block.kind {
            BlockKind::Paragraph | BlockKind::Other(_) => wrap(&mut out, "p", block),
            BlockKind::Heading(level) => wrap(&mut out, &format!("h{}", level), block),
            BlockKind::Preformatted => wrap(&mut out, "pre", block),
            BlockKind::ListItem | BlockKind::OrderedListItem => wrap(&mut out, "li", block),
            BlockKind::Image => {
                let src = block.url.as_deref().unwrap_or_default();
                let alt = block.alt.as_deref().unwrap_or_default();
                out.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    html_escape(src),
                    html_escape(alt)
                ));
            }
            BlockKind::Embed => {
                let embed = block.oembed.clone().unwrap_or_default();
                out.push_str(&format!(
                    r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
                    html_escape(embed.embed_url.as_deref().unwrap_or_default()),
                    html_escape(embed.embed_type.as_deref().unwrap_or_default()),
                    embed.html.as_deref().unwrap_or_default()
                ));
            }
        }
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }
    out
}

fn wrap(out: &mut String, tag: &str, block: &RichTextBlock) {
    out.push_str(&format!("<{}>", tag));
    render_inline(out, block);
    out.push_str(&format!("</{}>", tag));
}

/// Render a block's text with its spans
fn render_inline(out: &mut String, block: &RichTextBlock) {
    let offsets = utf16_offsets(&block.text);
    let len = offsets.len() - 1;

    let mut spans: Vec<&Span> = block
        .spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    // Outer spans first so nesting falls out of the order
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    render_range(out, &block.text, &offsets, 0, len, &spans);
}

fn render_range(
    out: &mut String,
    text: &str,
    offsets: &[usize],
    start: usize,
    end: usize,
    spans: &[&Span],
) {
    let mut cursor = start;
    let mut i = 0;

    while i < spans.len() {
        let span = spans[i];
        let span_start = span.start.max(cursor);
        let span_end = span.end.min(end);
        if span_start >= span_end {
            i += 1;
            continue;
        }

        // Everything starting inside this span nests under it
        let mut j = i + 1;
        while j < spans.len() && spans[j].start < span_end {
            j += 1;
        }

        out.push_str(&escape_text(&text[offsets[cursor]..offsets[span_start]]));
        let (open, close) = span_tags(span);
        out.push_str(&open);
        render_range(out, text, offsets, span_start, span_end, &spans[i + 1..j]);
        out.push_str(close);

        cursor = span_end;
        i = j;
    }

    out.push_str(&escape_text(&text[offsets[cursor]..offsets[end]]));
}

fn span_tags(span: &Span) -> (String, &'static str) {
    let data = span.data.clone().unwrap_or_default();
    match &span.kind {
        SpanKind::Strong => ("<strong>".to_string(), "</strong>"),
        SpanKind::Em => ("<em>".to_string(), "</em>"),
        SpanKind::Hyperlink => {
            let href = html_escape(data.url.as_deref().unwrap_or_default());
            let open = match data.target {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener noreferrer">"#,
                    href,
                    html_escape(&target)
                ),
                None => format!(r#"<a href="{}">"#, href),
            };
            (open, "</a>")
        }
        SpanKind::Label => {
            let class = html_escape(data.label.as_deref().unwrap_or_default());
            (format!(r#"<span class="{}">"#, class), "</span>")
        }
        SpanKind::Other(_) => (String::new(), ""),
    }
}

/// Byte offset of every UTF-16 position in `text`, plus the end
///
/// The second half of a surrogate pair maps to the start of its character.
fn utf16_offsets(text: &str) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(text.len() + 1);
    for (byte, c) in text.char_indices() {
        for _ in 0..c.len_utf16() {
            offsets.push(byte);
        }
    }
    offsets.push(text.len());
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(json: &str) -> Vec<RichTextBlock> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decode_block_kinds() {
        let blocks = blocks(
            r#"[
                {"type": "heading2", "text": "Title", "spans": []},
                {"type": "o-list-item", "text": "one", "spans": []},
                {"type": "heading9", "text": "odd", "spans": []},
                {"type": "image", "url": "https://images.prismic.io/x.png", "alt": null}
            ]"#,
        );
        assert_eq!(blocks[0].kind, BlockKind::Heading(2));
        assert_eq!(blocks[1].kind, BlockKind::OrderedListItem);
        assert_eq!(blocks[2].kind, BlockKind::Other("heading9".to_string()));
        assert_eq!(blocks[3].kind, BlockKind::Image);
        assert_eq!(blocks[3].text, "");
    }

    #[test]
    fn test_as_text_joins_blocks() {
        let blocks = vec![
            RichTextBlock::paragraph("Lorem ipsum"),
            RichTextBlock::new(BlockKind::Image, ""),
            RichTextBlock::paragraph("dolor sit amet"),
        ];
        assert_eq!(as_text(&blocks), "Lorem ipsum dolor sit amet");
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn test_as_html_escapes_and_groups_lists() {
        let blocks = vec![
            RichTextBlock::paragraph("a < b"),
            RichTextBlock::new(BlockKind::ListItem, "one"),
            RichTextBlock::new(BlockKind::ListItem, "two"),
            RichTextBlock::new(BlockKind::OrderedListItem, "first"),
            RichTextBlock::new(BlockKind::Heading(3), "End"),
        ];
        assert_eq!(
            as_html(&blocks),
            "<p>a &lt; b</p><ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><h3>End</h3>"
        );
    }

    #[test]
    fn test_as_html_spans() {
        let block = RichTextBlock::paragraph("Hello bold world")
            .with_span(6, 10, SpanKind::Strong)
            .with_span(6, 16, SpanKind::Em);
        assert_eq!(
            as_html(&[block]),
            "<p>Hello <em><strong>bold</strong> world</em></p>"
        );
    }

    #[test]
    fn test_as_html_hyperlink() {
        let blocks = blocks(
            r#"[{"type": "paragraph", "text": "see docs", "spans": [
                {"start": 4, "end": 8, "type": "hyperlink",
                 "data": {"link_type": "Web", "url": "https://x.dev/?a=1&b=2", "target": "_blank"}}
            ]}]"#,
        );
        assert_eq!(
            as_html(&blocks),
            r#"<p>see <a href="https://x.dev/?a=1&amp;b=2" target="_blank" rel="noopener noreferrer">docs</a></p>"#
        );
    }

    #[test]
    fn test_spans_use_utf16_offsets() {
        // "🚀" is two UTF-16 units, "é" is one
        let block = RichTextBlock::paragraph("🚀 café").with_span(3, 7, SpanKind::Strong);
        assert_eq!(as_html(&[block]), "<p>🚀 <strong>café</strong></p>");
    }

    #[test]
    fn test_out_of_range_spans_are_clamped() {
        let block = RichTextBlock::paragraph("short")
            .with_span(2, 50, SpanKind::Em)
            .with_span(40, 60, SpanKind::Strong);
        assert_eq!(as_html(&[block]), "<p>sh<em>ort</em></p>");
    }

    #[test]
    fn test_line_breaks() {
        let block = RichTextBlock::paragraph("one\ntwo");
        assert_eq!(as_html(&[block]), "<p>one<br />two</p>");
    }
}
