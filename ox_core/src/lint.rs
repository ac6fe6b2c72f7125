//! Diagnostics collected from a syntax tree.

use crate::syntax::{NodeKind, SyntaxNode};
use crate::types::{Diagnostic, Severity};

/// Walk the tree and report hard syntax errors and missing tokens.
///
/// `Error` subtrees are reported once and not entered. A missing node is
/// reported and the walk carries on with its siblings.
pub fn collect_diagnostics<N: SyntaxNode>(root: &N) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    visit(root, &mut diagnostics);
    diagnostics
}

fn visit<N: SyntaxNode>(node: &N, out: &mut Vec<Diagnostic>) {
    if node.kind() == NodeKind::Error {
        out.push(Diagnostic::at(node.span(), "Syntax error", Severity::Error));
        return;
    }
    if node.is_missing() {
        let what = node.field_name().unwrap_or("token");
        out.push(Diagnostic::at(
            node.span(),
            format!("Missing {}", what),
            Severity::Error,
        ));
        return;
    }
    for child in node.children() {
        visit(&child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;

    fn lint(text: &str) -> Vec<Diagnostic> {
        let root = parse_source(text);
        collect_diagnostics(&&root)
    }

    #[test]
    fn test_clean_file_has_no_diagnostics() {
        let text = "# log\n2025-01-10 * pullups: BW 5x10\n@session\n2025-01-11 * Upper\nsquat: 185lb 3x5\n@end\n";
        assert!(lint(text).is_empty());
    }

    #[test]
    fn test_error_line_reported_once() {
        let diagnostics = lint("2025-01-10 * pullups: BW 5x10\nnot a log line at all\n");
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.message, "Syntax error");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.start_line, 2);
        assert_eq!(d.start_col, 0);
    }

    #[test]
    fn test_bad_detail_token_reported() {
        let diagnostics = lint("2025-01-10 * pullups: BW 5x10 ???\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].start_col, 30);
        assert_eq!(diagnostics[0].end_col, 33);
    }

    #[test]
    fn test_missing_end_reported_and_siblings_continue() {
        let text = "@session\n2025-01-11 * Upper\nsquat: 185lb 3x5 ???\n";
        let messages: Vec<_> = lint(text).into_iter().map(|d| d.message).collect();
        assert_eq!(messages, vec!["Syntax error", "Missing end"]);
    }

    #[test]
    fn test_missing_item_reported() {
        let diagnostics = lint("2025-01-10 *\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Missing item");
    }
}
