use crate::ui::icons::{CHECK, CROSS, FOLDER, WARN};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Terminal UI for a stepsite run, rendered via `indicatif` progress bars.
///
/// Two bars are stacked vertically:
/// - Revision bar: how many revisions have been built
/// - Step bar: spinner naming the step currently running
pub struct BuildUI {
    multi: MultiProgress,
    revision_bar: ProgressBar,
    step_bar: ProgressBar,
    verbose: bool,
    quiet: bool,
}

impl BuildUI {
    /// Create the UI sized for `total_revisions`.
    pub fn new(total_revisions: u64, verbose: bool) -> Self {
        Self::with_target(total_revisions, verbose, ProgressDrawTarget::stderr(), false)
    }

    /// A UI that draws nothing, for tests and non-interactive callers.
    pub fn hidden() -> Self {
        Self::with_target(0, false, ProgressDrawTarget::hidden(), true)
    }

    fn with_target(
        total_revisions: u64,
        verbose: bool,
        target: ProgressDrawTarget,
        quiet: bool,
    ) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let revision_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let revision_bar = multi.add(ProgressBar::new(total_revisions));
        revision_bar.set_style(revision_style);
        revision_bar.set_prefix("Steps");

        let step_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");

        let step_bar = multi.add(ProgressBar::new_spinner());
        step_bar.set_style(step_style);
        step_bar.set_prefix(" Task");

        Self {
            multi,
            revision_bar,
            step_bar,
            verbose,
            quiet,
        }
    }

    /// Resize the revision bar once discovery knows how many there are.
    pub fn set_total(&self, total_revisions: u64) {
        self.revision_bar.set_length(total_revisions);
    }

    /// Print a line above the bars, or straight to stderr when the bars are
    /// not drawn (stderr is not a terminal).
    pub fn print_line(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        if self.multi.is_hidden() || self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Announce the revision about to be built.
    pub fn start_revision(&self, tag: &str, description: &str) {
        self.revision_bar
            .set_message(format!("{}: {}", style(tag).yellow(), description));
        self.print_line("");
        self.print_line(format!(
            "{} {} {}",
            style("▶").green().bold(),
            style(tag).yellow().bold(),
            style(description).dim()
        ));
        self.step_bar
            .enable_steady_tick(Duration::from_millis(100));
    }

    /// Update the spinner with the step that is running.
    ///
    /// In verbose mode the message is also printed as a dim indented line.
    pub fn log_step(&self, msg: &str) {
        self.step_bar.set_message(msg.to_string());
        if self.verbose {
            self.print_line(format!("    {} {}", style("→").dim(), style(msg).dim()));
        }
    }

    /// Print captured subprocess output (verbose mode only).
    pub fn show_output(&self, output: &str) {
        if !self.verbose {
            return;
        }
        for line in output.lines() {
            self.print_line(format!("      {}", style(line).dim()));
        }
    }

    pub fn revision_complete(&self, tag: &str) {
        self.revision_bar.inc(1);
        self.step_bar.set_message("");
        self.print_line(format!("  {} {} built", CHECK, style(tag).green().bold()));
    }

    pub fn revision_failed(&self, tag: &str, reason: &str) {
        self.step_bar.finish_and_clear();
        self.print_line(format!(
            "  {} {} failed: {}",
            CROSS,
            style(tag).red().bold(),
            reason
        ));
    }

    pub fn warn(&self, msg: &str) {
        self.print_line(format!("{} {}", WARN, style(msg).yellow()));
    }

    /// Clear the bars and print where the site landed.
    pub fn finish(&self, built: usize, output_dir: &std::path::Path) {
        self.step_bar.finish_and_clear();
        self.revision_bar.finish_and_clear();
        self.print_line(format!(
            "\n{} Built {} step(s) into {}",
            CHECK,
            style(built).green().bold(),
            style(output_dir.display()).cyan()
        ));
        self.print_line(format!(
            "{} Preview with: npx serve {}",
            FOLDER,
            output_dir.display()
        ));
    }

    pub fn finish_and_clear(&self) {
        self.step_bar.finish_and_clear();
        self.revision_bar.finish_and_clear();
    }
}
