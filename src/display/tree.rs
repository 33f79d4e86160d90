//! Annotated syntax-tree printer used by verbose single-file commands.

use crate::fingerprint::FileFingerprint;
use crate::parsing::SyntaxTree;
use std::fmt::Write;

const INDENT: &str = "  ";

/// Render the named nodes of a tree, one per line, indented by depth.
///
/// Declaration roots also show their canonical string and term counts:
///
/// ```text
/// <source_file>
///   <function_declaration>:
///   function_declaration:identifier:parameter_list:block
///   block=1 function_declaration=1 identifier=1 parameter_list=1
/// ```
pub fn render_annotated_tree(tree: &SyntaxTree, fingerprint: &FileFingerprint) -> String {
    let mut out = String::new();
    let mut stack = vec![(tree.root(), 0usize)];

    while let Some((id, depth)) = stack.pop() {
        let node = tree.node(id);
        if !node.is_named() {
            continue;
        }
        let indent = INDENT.repeat(depth);

        match fingerprint.declaration(id) {
            Some(decl) => {
                let counts: Vec<String> = decl
                    .frequency
                    .sorted()
                    .into_iter()
                    .map(|(term, count)| format!("{term}={count}"))
                    .collect();
                let _ = writeln!(out, "{indent}<{}>:", node.kind());
                let _ = writeln!(out, "{indent}{}", decl.canonical);
                let _ = writeln!(out, "{indent}{}", counts.join(" "));
            }
            None => {
                let _ = writeln!(out, "{indent}<{}>", node.kind());
            }
        }

        for &child in node.children().iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{DeclarationSelector, Fingerprinter};
    use crate::vector::Vocabulary;
    use std::sync::Arc;

    #[test]
    fn test_render_marks_declarations() {
        let src = "func f() {}";
        let mut b = SyntaxTree::builder(src);
        let root = b.root("source_file", 0..src.len());
        let func = b.child(root, "function_declaration", true, 0..src.len());
        b.child(func, "func", false, 0..4);
        b.child(func, "identifier", true, 5..6);
        b.child(func, "block", true, 9..11);
        let tree = b.build();

        let vocab = Vocabulary::new(["function_declaration", "identifier", "block"]).unwrap();
        let fp = Fingerprinter::new(Arc::new(vocab), DeclarationSelector::go()).fingerprint(&tree);
        let rendered = render_annotated_tree(&tree, &fp);

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "<source_file>");
        assert_eq!(lines[1], "  <function_declaration>:");
        assert_eq!(lines[2], "  function_declaration:identifier:block");
        assert_eq!(lines[3], "  block=1 function_declaration=1 identifier=1");
        assert_eq!(lines[4], "    <identifier>");
        assert_eq!(lines[5], "    <block>");
        assert!(!rendered.contains("<func>"));
    }
}
