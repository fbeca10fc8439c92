//! Purpose: Balanced-tag scanning over non-namespaced SOAP markup without a DOM parser.
//! Exports: `Span`, `scan_top_level_blocks`.
//! Role: Leaf utility for the decoder; the only place that knows how tags are matched.
//! Invariants: Tag names match ASCII case-insensitively; an open tag ends at its first `>`.
//! Invariants: Only tag balance delimits a block, so nested `item`s never truncate their parent.
//! Notes: Self-closing elements must be expanded (`expand_self_closing`) before scanning.
//! Notes: Unmatched trailing opens never close and therefore never emit a block.
use std::borrow::Cow;

/// Byte range of one element inside the scanned text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// One matched tag: `<name ...>`, `<name .../>`, or `</name>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct TagMatch {
    pub start: usize,
    pub end: usize,
    pub self_closing: bool,
}

/// Returns the spans of every `item` element not nested inside another `item`.
pub fn scan_top_level_blocks(fragment: &str) -> Vec<Span> {
    scan_balanced(fragment, "item")
}

pub(crate) fn scan_balanced(fragment: &str, tag: &str) -> Vec<Span> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    let mut depth = 0usize;
    let mut block_start = 0;

    loop {
        let close = find_close_tag(fragment, tag, cursor);
        let open = find_open_tag(fragment, tag, cursor)
            .filter(|open| close.is_none_or(|close| open.start < close.start));
        if let Some(open) = open {
            if depth == 0 {
                block_start = open.start;
            }
            depth += 1;
            cursor = open.end;
            continue;
        }

        let Some(close) = close else {
            break;
        };
        cursor = close.end;
        if depth == 0 {
            continue;
        }
        depth -= 1;
        if depth == 0 {
            blocks.push(Span {
                start: block_start,
                end: cursor,
            });
        }
    }
    blocks
}

pub(crate) fn find_open_tag(text: &str, tag: &str, from: usize) -> Option<TagMatch> {
    let mut pos = from;
    while let Some(rel) = text.get(pos..)?.find('<') {
        let lt = pos + rel;
        if let Some(found) = open_tag_at(text, lt, tag) {
            return Some(found);
        }
        pos = lt + 1;
    }
    None
}

pub(crate) fn find_close_tag(text: &str, tag: &str, from: usize) -> Option<TagMatch> {
    let bytes = text.as_bytes();
    let mut pos = from;
    while let Some(rel) = text.get(pos..)?.find("</") {
        let name_start = pos + rel + 2;
        let name_end = name_start + tag.len();
        if name_end <= bytes.len() && bytes[name_start..name_end].eq_ignore_ascii_case(tag.as_bytes())
        {
            let mut gt = name_end;
            while gt < bytes.len() && bytes[gt].is_ascii_whitespace() {
                gt += 1;
            }
            if gt < bytes.len() && bytes[gt] == b'>' {
                return Some(TagMatch {
                    start: pos + rel,
                    end: gt + 1,
                    self_closing: false,
                });
            }
        }
        pos = name_start;
    }
    None
}

fn open_tag_at(text: &str, lt: usize, tag: &str) -> Option<TagMatch> {
    let bytes = text.as_bytes();
    let name_start = lt + 1;
    let name_end = name_start + tag.len();
    if name_end >= bytes.len() || !bytes[name_start..name_end].eq_ignore_ascii_case(tag.as_bytes())
    {
        return None;
    }
    let next = bytes[name_end];
    if next != b'>' && next != b'/' && !next.is_ascii_whitespace() {
        return None;
    }
    let gt = name_end + text[name_end..].find('>')?;
    Some(TagMatch {
        start: lt,
        end: gt + 1,
        self_closing: bytes[gt - 1] == b'/',
    })
}

/// Rewrites `<tag .../>` as `<tag ...></tag>` for each listed tag so the balanced scan sees pairs.
pub(crate) fn expand_self_closing<'a>(fragment: &'a str, tags: &[&str]) -> Cow<'a, str> {
    let mut out = String::new();
    let mut copied = 0;
    let mut pos = 0;
    while let Some(rel) = fragment[pos..].find('<') {
        let lt = pos + rel;
        let found = tags.iter().find_map(|tag| {
            open_tag_at(fragment, lt, tag)
                .filter(|found| found.self_closing)
                .map(|found| (tag.len(), found))
        });
        match found {
            Some((name_len, found)) => {
                out.push_str(&fragment[copied..lt]);
                out.push_str(fragment[lt..found.end - 2].trim_end());
                out.push_str("></");
                out.push_str(&fragment[lt + 1..lt + 1 + name_len]);
                out.push('>');
                copied = found.end;
                pos = found.end;
            }
            None => pos = lt + 1,
        }
    }
    if copied == 0 {
        return Cow::Borrowed(fragment);
    }
    out.push_str(&fragment[copied..]);
    Cow::Owned(out)
}

/// Splits a balanced element span into its opening tag and its inner content.
pub(crate) fn split_element(text: &str, span: Span) -> (&str, &str) {
    let element = span.slice(text);
    let Some(gt) = element.find('>') else {
        return (element, "");
    };
    let open = &element[..=gt];
    let inner_end = element.rfind("</").filter(|end| *end > gt).unwrap_or(element.len());
    (open, &element[gt + 1..inner_end])
}

/// True when an opening tag carries `nil="true"` (any prefix, either quote style, or `1`).
pub(crate) fn is_nil_tag(open: &str) -> bool {
    let lower = open.to_ascii_lowercase();
    ["nil=\"true\"", "nil='true'", "nil=\"1\"", "nil='1'"]
        .iter()
        .any(|marker| lower.contains(marker))
}
