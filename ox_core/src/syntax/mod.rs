//! Syntax-tree capability interface.
//!
//! The record builder and the linter only see trees through [`SyntaxNode`],
//! so any tokenizer that can answer these questions can feed them. The
//! [`reader`] module supplies a line-oriented implementation for `.ox` text.

pub mod reader;

use serde::Serialize;

pub use reader::parse_source;

/// Closed set of node categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    SourceFile,
    SinglelineEntry,
    SessionBlock,
    NoteEntry,
    ItemLine,
    NoteLine,
    Details,
    Comment,
    ExerciseBlock,
    TemplateBlock,
    /// Leaf holding a field value (date, flag, weight, ...)
    Token,
    /// Hard syntax error; nothing below it is trusted
    Error,
}

/// Zero-based source range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

/// What the core needs from a parsed tree.
///
/// Implemented on cheap handles (references, cursor-like node ids) so that
/// `children` and `child_by_field` can hand back owned values.
pub trait SyntaxNode: Sized {
    fn kind(&self) -> NodeKind;

    /// Source text covered by the node
    fn text(&self) -> &str;

    fn span(&self) -> Span;

    /// Name of the field this node fills in its parent, if any
    fn field_name(&self) -> Option<&str>;

    fn child_by_field(&self, name: &str) -> Option<Self>;

    fn children(&self) -> Vec<Self>;

    /// True for zero-width nodes the tokenizer inserted to recover
    fn is_missing(&self) -> bool;
}

/// Owned tree node produced by [`reader::parse_source`]
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub field: Option<&'static str>,
    pub text: String,
    pub span: Span,
    pub children: Vec<Node>,
    pub missing: bool,
}

impl Node {
    pub fn leaf(kind: NodeKind, field: Option<&'static str>, text: &str, span: Span) -> Self {
        Self {
            kind,
            field,
            text: text.to_string(),
            span,
            children: Vec::new(),
            missing: false,
        }
    }

    pub fn branch(kind: NodeKind, text: String, span: Span, children: Vec<Node>) -> Self {
        Self {
            kind,
            field: None,
            text,
            span,
            children,
            missing: false,
        }
    }

    /// Zero-width placeholder for something the reader expected but did not find
    pub fn missing(field: &'static str, line: usize, col: usize) -> Self {
        Self {
            kind: NodeKind::Token,
            field: Some(field),
            text: String::new(),
            span: Span::new(line, col, line, col),
            children: Vec::new(),
            missing: true,
        }
    }

    pub fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }
}

impl<'a> SyntaxNode for &'a Node {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn span(&self) -> Span {
        self.span
    }

    fn field_name(&self) -> Option<&str> {
        self.field
    }

    fn child_by_field(&self, name: &str) -> Option<Self> {
        let node: &'a Node = *self;
        node.children.iter().find(|c| c.field == Some(name))
    }

    fn children(&self) -> Vec<Self> {
        let node: &'a Node = *self;
        node.children.iter().collect()
    }

    fn is_missing(&self) -> bool {
        self.missing
    }
}
