//! Human-readable terminal output.

use console::style;

use crate::workflow::{FinishOutcome, StartOutcome};

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Indented, dimmed detail lines under an error, e.g. the stderr of the
/// git command that failed
pub fn display_diagnostic(diagnostic: &str) {
    for line in diagnostic.lines() {
        eprintln!("  {}", style(line).dim());
    }
}

pub fn display_start_outcome(outcome: &StartOutcome) {
    display_success(&format!(
        "Started release {} on branch {}",
        outcome.release_version, outcome.release_branch
    ));
    println!(
        "  Development branch continues at {}",
        style(&outcome.next_dev_version).bold()
    );
}

pub fn display_finish_outcome(outcome: &FinishOutcome) {
    display_success(&format!(
        "Finished release {} (tag {})",
        outcome.release_version, outcome.tag
    ));
}
