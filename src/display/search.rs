//! Rendering of nearest-neighbor search results

use crate::indexing::SearchHit;
use crate::storage::NearestMatch;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct SearchReportJson<'a> {
    pub file: String,
    pub declarations: Vec<DeclarationResultJson<'a>>,
}

/// Line numbers in reports are 1-based
#[derive(Debug, Serialize)]
pub struct DeclarationResultJson<'a> {
    pub kind: &'a str,
    pub start_line: u32,
    pub end_line: u32,
    pub raw_text: &'a str,
    pub canonical: &'a str,
    pub matches: Vec<MatchJson<'a>>,
}

#[derive(Debug, Serialize)]
pub struct MatchJson<'a> {
    pub source_file: &'a str,
    pub start_line: u32,
    pub end_line: u32,
    pub raw_text: &'a str,
    pub distance: f32,
}

impl<'a> From<&'a NearestMatch> for MatchJson<'a> {
    fn from(m: &'a NearestMatch) -> Self {
        Self {
            source_file: &m.source_file,
            start_line: m.start_row + 1,
            end_line: m.end_row + 1,
            raw_text: &m.raw_text,
            distance: m.distance,
        }
    }
}

impl<'a> SearchReportJson<'a> {
    pub fn new(file: &Path, hits: &'a [SearchHit]) -> Self {
        Self {
            file: file.display().to_string(),
            declarations: hits
                .iter()
                .map(|hit| DeclarationResultJson {
                    kind: &hit.declaration.kind,
                    start_line: hit.declaration.span.start_line(),
                    end_line: hit.declaration.span.end_line(),
                    raw_text: &hit.declaration.raw_text,
                    canonical: &hit.declaration.canonical,
                    matches: hit.matches.iter().map(MatchJson::from).collect(),
                })
                .collect(),
        }
    }
}

/// Each provided declaration followed by its stored matches, nearest first
pub fn render_search_results(hits: &[SearchHit]) -> String {
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let decl = &hit.declaration;
        let _ = writeln!(
            out,
            "Provided {} (lines {}-{}):",
            decl.kind,
            decl.span.start_line(),
            decl.span.end_line()
        );
        let _ = writeln!(out, "{}", decl.raw_text);

        if hit.matches.is_empty() {
            let _ = writeln!(out, "\n  No stored matches");
            continue;
        }
        for (rank, m) in hit.matches.iter().enumerate() {
            let _ = writeln!(
                out,
                "\nMatch {} (distance {:.4}) {}:{}-{}",
                rank + 1,
                m.distance,
                m.source_file,
                m.start_row + 1,
                m.end_row + 1
            );
            let _ = writeln!(out, "{}", m.raw_text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::DeclarationFingerprint;
    use crate::parsing::{NodeId, SyntaxTree};
    use crate::vector::{Embedding, NodeFrequency};

    fn hit(matches: Vec<NearestMatch>) -> SearchHit {
        let src = "func a() {}";
        let mut b = SyntaxTree::builder(src);
        let root = b.root("source_file", 0..src.len());
        let node: NodeId = b.child(root, "function_declaration", true, 0..src.len());
        let tree = b.build();
        SearchHit {
            declaration: DeclarationFingerprint {
                node,
                kind: "function_declaration".to_string(),
                span: tree.node(node).span(),
                canonical: "function_declaration".to_string(),
                raw_text: src.to_string(),
                frequency: NodeFrequency::from_canonical("function_declaration"),
                embedding: Embedding::new(vec![1.0]).unwrap(),
            },
            matches,
        }
    }

    fn stored(file: &str, distance: f32) -> NearestMatch {
        NearestMatch {
            source_file: file.to_string(),
            start_row: 2,
            end_row: 4,
            raw_text: "func b() {}".to_string(),
            distance,
        }
    }

    #[test]
    fn test_render_lists_matches_in_order() {
        let hits = vec![hit(vec![stored("x.go", 0.0), stored("y.go", 0.25)])];
        let text = render_search_results(&hits);
        assert!(text.starts_with("Provided function_declaration (lines 1-1):\nfunc a() {}"));
        let first = text.find("Match 1 (distance 0.0000) x.go:3-5").unwrap();
        let second = text.find("Match 2 (distance 0.2500) y.go:3-5").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_render_empty_store() {
        let text = render_search_results(&[hit(Vec::new())]);
        assert!(text.contains("No stored matches"));
    }

    #[test]
    fn test_json_shape() {
        let hits = vec![hit(vec![stored("x.go", 0.5)])];
        let json = serde_json::to_value(SearchReportJson::new(Path::new("q.go"), &hits)).unwrap();
        assert_eq!(json["file"], "q.go");
        assert_eq!(json["declarations"][0]["kind"], "function_declaration");
        assert_eq!(json["declarations"][0]["matches"][0]["source_file"], "x.go");
        assert_eq!(json["declarations"][0]["matches"][0]["distance"], 0.5);
        assert_eq!(json["declarations"][0]["start_line"], 1);
        assert_eq!(json["declarations"][0]["matches"][0]["start_line"], 3);
        assert_eq!(json["declarations"][0]["matches"][0]["end_line"], 5);
    }
}
