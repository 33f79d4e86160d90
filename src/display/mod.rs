//! Terminal output: annotated trees, tables, search results and progress.

pub mod progress;
pub mod search;
pub mod tables;
pub mod theme;
pub mod tree;

pub use progress::{create_progress_bar, create_spinner};
pub use search::{MatchJson, SearchReportJson, render_search_results};
pub use tables::{create_similarity_table, create_summary_table, declaration_label};
pub use theme::{THEME, Theme};
pub use tree::render_annotated_tree;
