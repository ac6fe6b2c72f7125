//! Line-oriented reader for `.ox` training logs.
//!
//! Produces an owned [`Node`] tree. The reader never fails: lines it cannot
//! place become `Error` nodes and unterminated blocks get a missing `@end`.

use super::{Node, NodeKind, Span};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*:$").expect("valid item regex"));
static REP_SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+x\d+|\d+(/\d+)*)$").expect("valid rep scheme regex"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(:\d{2})+|\d+(\.\d+)?(s|sec|min|h|hr))$").expect("valid time regex")
});
static DISTANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?(m|km|mi|yd|ft)$").expect("valid distance regex"));
static WEIGHT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(BW|\d+(\.\d+)?[A-Za-z]*)([+/](BW|\d+(\.\d+)?[A-Za-z]*))*$")
        .expect("valid weight regex")
});

const ENTRY_FLAGS: [&str; 3] = ["*", "!", "W"];
const WEIGH_IN_FLAG: &str = "W";
const NOTE_FLAG: &str = "note";

/// Parse a whole `.ox` document into a `SourceFile` tree
pub fn parse_source(source: &str) -> Node {
    let mut reader = Reader {
        lines: source.lines().collect(),
        pos: 0,
    };

    let mut children = Vec::new();
    while let Some(node) = reader.next_node() {
        children.push(node);
    }

    let end_line = reader.lines.len().saturating_sub(1);
    let end_col = reader.lines.last().map_or(0, |l| l.len());
    Node::branch(
        NodeKind::SourceFile,
        source.to_string(),
        Span::new(0, 0, end_line, end_col),
        children,
    )
}

struct Reader<'s> {
    lines: Vec<&'s str>,
    pos: usize,
}

impl<'s> Reader<'s> {
    fn skip_blank(&mut self) {
        while self.pos < self.lines.len() && self.lines[self.pos].trim().is_empty() {
            self.pos += 1;
        }
    }

    fn next_node(&mut self) -> Option<Node> {
        self.skip_blank();
        let idx = self.pos;
        let line = *self.lines.get(idx)?;
        let trimmed = line.trim();

        let node = match trimmed {
            "@session" => self.read_block(NodeKind::SessionBlock),
            "@exercise" => self.read_block(NodeKind::ExerciseBlock),
            "@template" => self.read_block(NodeKind::TemplateBlock),
            _ if trimmed.starts_with('#') => {
                self.pos += 1;
                Node::leaf(NodeKind::Comment, None, line, line_span(idx, line))
            }
            _ => {
                self.pos += 1;
                read_dated_line(idx, line)
            }
        };
        Some(node)
    }

    /// Read `@keyword ... @end`. Only session blocks get their header and
    /// body parsed; exercise and template blocks are kept opaque.
    fn read_block(&mut self, kind: NodeKind) -> Node {
        let open_idx = self.pos;
        let open_line = self.lines[open_idx];
        self.pos += 1;

        let mut children = Vec::new();
        let mut last_idx = open_idx;

        if kind == NodeKind::SessionBlock {
            self.skip_blank();
            match self.lines.get(self.pos) {
                Some(&line) if !line.trim().starts_with('@') => {
                    let idx = self.pos;
                    self.pos += 1;
                    last_idx = idx;
                    match read_header(idx, line) {
                        Some(fields) => children.extend(fields),
                        None => children.push(Node::leaf(
                            NodeKind::Error,
                            None,
                            line,
                            line_span(idx, line),
                        )),
                    }
                }
                _ => children.push(Node::missing(
                    "date",
                    open_idx,
                    open_line.trim_end().len(),
                )),
            }
        }

        let end = loop {
            let Some(&line) = self.lines.get(self.pos) else {
                break None;
            };
            let idx = self.pos;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                self.pos += 1;
                continue;
            }
            if trimmed == "@end" {
                self.pos += 1;
                break Some(
                    Node::leaf(NodeKind::Token, None, trimmed, line_span(idx, line))
                        .with_field("end"),
                );
            }
            if trimmed.starts_with('@') {
                // next block starts; leave it for the caller
                break None;
            }
            self.pos += 1;
            last_idx = idx;
            if kind == NodeKind::SessionBlock {
                children.push(read_body_line(idx, line));
            }
        };

        let end = end.unwrap_or_else(|| {
            let last_line = self.lines[last_idx];
            Node::missing("end", last_idx, last_line.trim_end().len())
        });
        let span = Span::new(
            open_idx,
            line_span(open_idx, open_line).start_col,
            end.span.end_line,
            end.span.end_col,
        );
        let text = self.lines[open_idx..self.pos].join("\n");
        children.push(end);

        Node::branch(kind, text, span, children)
    }
}

/// `date flag name` header of a session block
fn read_header(idx: usize, line: &str) -> Option<Vec<Node>> {
    let pieces = split_pieces(line);
    let (&(date_col, date), &(flag_col, flag)) = (pieces.first()?, pieces.get(1)?);
    if !DATE_RE.is_match(date) || !ENTRY_FLAGS.contains(&flag) {
        return None;
    }

    let mut fields = vec![
        Node::leaf(NodeKind::Token, Some("date"), date, piece_span(idx, date_col, date)),
        Node::leaf(NodeKind::Token, Some("flag"), flag, piece_span(idx, flag_col, flag)),
    ];
    match pieces.get(2) {
        Some(&(name_col, _)) => {
            let name = line[name_col..].trim_end();
            fields.push(Node::leaf(
                NodeKind::Token,
                Some("name"),
                name,
                piece_span(idx, name_col, name),
            ));
        }
        None => fields.push(Node::missing("name", idx, line.trim_end().len())),
    }
    Some(fields)
}

fn read_body_line(idx: usize, line: &str) -> Node {
    let span = line_span(idx, line);
    if line.trim().starts_with('#') {
        return Node::leaf(NodeKind::Comment, None, line, span);
    }

    let pieces = split_pieces(line);
    match pieces.split_first() {
        Some((&(_, "note:"), rest)) => match rest {
            [(col, text)] if is_quoted(text) => Node::branch(
                NodeKind::NoteLine,
                line.trim().to_string(),
                span,
                vec![Node::leaf(
                    NodeKind::Token,
                    Some("text"),
                    text,
                    piece_span(idx, *col, text),
                )],
            ),
            [] => Node::branch(
                NodeKind::NoteLine,
                line.trim().to_string(),
                span,
                vec![Node::missing("text", idx, span.end_col)],
            ),
            _ => Node::leaf(NodeKind::Error, None, line, span),
        },
        Some((&(item_col, item), rest)) if ITEM_RE.is_match(item) => Node::branch(
            NodeKind::ItemLine,
            line.trim().to_string(),
            span,
            vec![
                Node::leaf(NodeKind::Token, Some("item"), item, piece_span(idx, item_col, item)),
                read_details(idx, rest, span.end_col),
            ],
        ),
        _ => Node::leaf(NodeKind::Error, None, line, span),
    }
}

/// `date flag item: details` or `date note "text"`
fn read_dated_line(idx: usize, line: &str) -> Node {
    let span = line_span(idx, line);
    let error = || Node::leaf(NodeKind::Error, None, line, span);

    let pieces = split_pieces(line);
    let (Some(&(date_col, date)), Some(&(flag_col, flag))) = (pieces.first(), pieces.get(1))
    else {
        return error();
    };
    if !DATE_RE.is_match(date) {
        return error();
    }

    let mut children = vec![
        Node::leaf(NodeKind::Token, Some("date"), date, piece_span(idx, date_col, date)),
        Node::leaf(NodeKind::Token, Some("flag"), flag, piece_span(idx, flag_col, flag)),
    ];
    let rest = &pieces[2..];

    if flag == NOTE_FLAG {
        match rest {
            [] => children.push(Node::missing("text", idx, span.end_col)),
            [(col, text)] if is_quoted(text) => children.push(Node::leaf(
                NodeKind::Token,
                Some("text"),
                text,
                piece_span(idx, *col, text),
            )),
            _ => return error(),
        }
        return Node::branch(NodeKind::NoteEntry, line.trim().to_string(), span, children);
    }

    if !ENTRY_FLAGS.contains(&flag) {
        return error();
    }

    match rest.split_first() {
        Some((&(item_col, item), tail)) if ITEM_RE.is_match(item) => {
            children.push(Node::leaf(
                NodeKind::Token,
                Some("item"),
                item,
                piece_span(idx, item_col, item),
            ));
            children.push(read_details(idx, tail, span.end_col));
        }
        _ if flag == WEIGH_IN_FLAG => children.push(read_details(idx, rest, span.end_col)),
        None => children.push(Node::missing("item", idx, span.end_col)),
        Some(_) => return error(),
    }
    Node::branch(NodeKind::SinglelineEntry, line.trim().to_string(), span, children)
}

fn read_details(idx: usize, pieces: &[(usize, &str)], eol: usize) -> Node {
    let mut seen: Vec<&'static str> = Vec::new();
    let mut children = Vec::with_capacity(pieces.len());

    for &(col, piece) in pieces {
        let span = piece_span(idx, col, piece);
        match classify_detail(piece) {
            Some(field) if !seen.contains(&field) => {
                seen.push(field);
                children.push(Node::leaf(NodeKind::Token, Some(field), piece, span));
            }
            _ => children.push(Node::leaf(NodeKind::Error, None, piece, span)),
        }
    }

    let span = match (pieces.first(), pieces.last()) {
        (Some(&(start, _)), Some(&(last_col, last))) => {
            Span::new(idx, start, idx, last_col + last.len())
        }
        _ => Span::new(idx, eol, idx, eol),
    };
    let text = pieces.iter().map(|&(_, p)| p).collect::<Vec<_>>().join(" ");
    Node::branch(NodeKind::Details, text, span, children).with_field("details")
}

/// Field name a detail token fills, if it has a recognizable shape
fn classify_detail(piece: &str) -> Option<&'static str> {
    if is_quoted(piece) {
        Some("note")
    } else if REP_SCHEME_RE.is_match(piece) {
        Some("rep_scheme")
    } else if TIME_RE.is_match(piece) {
        Some("time")
    } else if DISTANCE_RE.is_match(piece) {
        Some("distance")
    } else if WEIGHT_RE.is_match(piece) {
        Some("weight")
    } else {
        None
    }
}

fn is_quoted(piece: &str) -> bool {
    piece.len() >= 2 && piece.starts_with('"') && piece.ends_with('"')
}

/// Whitespace-separated pieces with their starting byte column. A piece
/// opening with `"` runs to the closing quote (or end of line).
fn split_pieces(line: &str) -> Vec<(usize, &str)> {
    let bytes = line.as_bytes();
    let mut pieces = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        if bytes[i] == b'"' {
            i += 1;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            if i < bytes.len() {
                i += 1;
            }
        } else {
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
        }
        pieces.push((start, &line[start..i]));
    }
    pieces
}

fn line_span(idx: usize, line: &str) -> Span {
    let start_col = line.len() - line.trim_start().len();
    Span::new(idx, start_col, idx, line.trim_end().len())
}

fn piece_span(idx: usize, col: usize, piece: &str) -> Span {
    Span::new(idx, col, idx, col + piece.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxNode;

    fn field<'a>(node: &'a Node, name: &str) -> &'a str {
        node.children
            .iter()
            .find(|c| c.field == Some(name))
            .map(|c| c.text.as_str())
            .unwrap_or_else(|| panic!("missing field {}", name))
    }

    #[test]
    fn test_singleline_entry() {
        let root = parse_source("2025-01-10 * pullups: BW 5x10\n");
        assert_eq!(root.children.len(), 1);
        let entry = &root.children[0];
        assert_eq!(entry.kind, NodeKind::SinglelineEntry);
        assert_eq!(field(entry, "date"), "2025-01-10");
        assert_eq!(field(entry, "flag"), "*");
        assert_eq!(field(entry, "item"), "pullups:");

        let details = entry.children.iter().find(|c| c.kind == NodeKind::Details).unwrap();
        assert_eq!(field(details, "weight"), "BW");
        assert_eq!(field(details, "rep_scheme"), "5x10");
    }

    #[test]
    fn test_detail_classification() {
        assert_eq!(classify_detail("24kg+32kg"), Some("weight"));
        assert_eq!(classify_detail("160/185/210lb"), Some("weight"));
        assert_eq!(classify_detail("5/3/1"), Some("rep_scheme"));
        assert_eq!(classify_detail("12"), Some("rep_scheme"));
        assert_eq!(classify_detail("30min"), Some("time"));
        assert_eq!(classify_detail("1:30"), Some("time"));
        assert_eq!(classify_detail("5km"), Some("distance"));
        assert_eq!(classify_detail("\"felt good\""), Some("note"));
        assert_eq!(classify_detail("???"), None);
    }

    #[test]
    fn test_quoted_note_keeps_spaces() {
        let root = parse_source("2025-01-10 * deadlift: 315lb 1x3 \"^rm top set felt good\"\n");
        let details = root.children[0]
            .children
            .iter()
            .find(|c| c.kind == NodeKind::Details)
            .unwrap();
        assert_eq!(field(details, "note"), "\"^rm top set felt good\"");
    }

    #[test]
    fn test_session_block() {
        let text = "@session\n2025-01-11 * Upper Day\nnote: \"Cycle 1\"\nbench-press: 135lb 5x5\n@end\n";
        let root = parse_source(text);
        assert_eq!(root.children.len(), 1);

        let block = &root.children[0];
        assert_eq!(block.kind, NodeKind::SessionBlock);
        assert_eq!(field(block, "name"), "Upper Day");
        let kinds: Vec<NodeKind> = block.children.iter().map(|c| c.kind).collect();
        assert!(kinds.contains(&NodeKind::NoteLine));
        assert!(kinds.contains(&NodeKind::ItemLine));
        assert!(!block.child_by_field("end").unwrap().is_missing());
        assert_eq!(block.span.start_line, 0);
        assert_eq!(block.span.end_line, 4);
    }

    #[test]
    fn test_unterminated_block_gets_missing_end() {
        let root = parse_source("@session\n2025-01-11 * Upper Day\nsquat: 185lb 3x5\n");
        let block = &root.children[0];
        let end = block.child_by_field("end").unwrap();
        assert!(end.is_missing());
        assert_eq!(end.span().start_line, 2);
    }

    #[test]
    fn test_garbage_line_is_error_node() {
        let root = parse_source("this is not a log line\n2025-01-10 * pullups: BW 5x10\n");
        assert_eq!(root.children[0].kind, NodeKind::Error);
        assert_eq!(root.children[1].kind, NodeKind::SinglelineEntry);
    }

    #[test]
    fn test_comments_and_opaque_blocks() {
        let text = "# header\n@exercise\nname: squat\n@end\n@template\nanything goes\n@end\n";
        let root = parse_source(text);
        let kinds: Vec<NodeKind> = root.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Comment, NodeKind::ExerciseBlock, NodeKind::TemplateBlock]
        );
    }

    #[test]
    fn test_standalone_note() {
        let root = parse_source("2025-01-10 note \"rest day\"\n");
        let note = &root.children[0];
        assert_eq!(note.kind, NodeKind::NoteEntry);
        assert_eq!(field(note, "text"), "\"rest day\"");
    }
}
