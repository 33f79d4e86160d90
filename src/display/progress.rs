//! Progress bars for long-running ingestion and fetch operations.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Styled bar whose length grows as repositories are walked.
///
/// Draws to stderr, and is hidden when stderr is not a terminal so logs and
/// piped output stay clean.
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    hide_unless_terminal(&pb);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner for indeterminate work such as clones.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message.to_string());
    hide_unless_terminal(&spinner);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn hide_unless_terminal(pb: &ProgressBar) {
    use is_terminal::IsTerminal;
    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_grows() {
        let pb = create_progress_bar(0, "ingesting");
        pb.inc_length(5);
        pb.inc(2);
        assert_eq!(pb.length(), Some(5));
        assert_eq!(pb.position(), 2);
        pb.finish_and_clear();
    }
}
