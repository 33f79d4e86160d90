//! Table formatting utilities for structured output.

use crate::fingerprint::DeclarationFingerprint;
use crate::indexing::BatchReport;
use comfy_table::{
    Attribute, Cell, CellAlignment, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table
}

fn bold<T: Into<Cell>>(content: T) -> Cell {
    content.into().add_attribute(Attribute::Bold)
}

/// Short label for a declaration: kind and 1-based line range
pub fn declaration_label(decl: &DeclarationFingerprint) -> String {
    let kind = decl.kind.strip_suffix("_declaration").unwrap_or(&decl.kind);
    format!("{kind} L{}-{}", decl.span.start_line(), decl.span.end_line())
}

/// Pairwise cosine similarity of one file's declarations.
///
/// Uses the vocabulary embeddings, so the numbers match what a search
/// against the store would rank on.
pub fn create_similarity_table(declarations: &[DeclarationFingerprint]) -> String {
    let mut table = new_table();
    let mut header = vec![bold("")];
    header.extend((1..=declarations.len()).map(|i| bold(format!("#{i}"))));
    table.set_header(header);

    for (i, a) in declarations.iter().enumerate() {
        let mut row = vec![Cell::new(format!("#{} {}", i + 1, declaration_label(a)))];
        for b in declarations {
            let score =
                crate::vector::cosine_similarity(a.embedding.as_slice(), b.embedding.as_slice());
            row.push(Cell::new(format!("{score:.3}")).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }

    table.to_string()
}

/// Per-repository results of a batch with a total row
pub fn create_summary_table(report: &BatchReport) -> String {
    let mut table = new_table();
    table.set_header(
        ["Repository", "Files", "Failed", "Declarations", "Time", "Status"].map(bold),
    );

    for outcome in &report.repos {
        match &outcome.result {
            Ok(stats) => table.add_row(vec![
                outcome.label.clone(),
                stats.files_ingested.to_string(),
                stats.files_failed.to_string(),
                stats.declarations_persisted.to_string(),
                format!("{:.2}s", stats.elapsed.as_secs_f64()),
                if stats.is_success() { "ok" } else { "partial" }.to_string(),
            ]),
            Err(e) => table.add_row(vec![
                outcome.label.clone(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                e.status_code().to_string(),
            ]),
        };
    }

    let totals = report.totals();
    table.add_row(vec![
        bold("TOTAL"),
        bold(totals.files_ingested.to_string()),
        bold(totals.files_failed.to_string()),
        bold(totals.declarations_persisted.to_string()),
        bold(format!("{:.2}s", totals.elapsed.as_secs_f64())),
        bold(if report.is_success() { "ok" } else { "failed" }),
    ]);

    table.to_string()
}
