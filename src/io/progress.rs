//! Attempt-level progress reporting for the retry loop

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;
use std::time::Duration;

static ATTEMPT_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Displays the seeded attempts of one generation run
pub struct AttemptReporter {
    bar: ProgressBar,
}

impl AttemptReporter {
    /// Create a reporter for `attempts` tries at generating `label`
    pub fn new(label: &str, attempts: usize) -> Self {
        let bar = ProgressBar::new(attempts as u64);
        bar.set_style(ATTEMPT_STYLE.clone());
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Note that an attempt with the given seed is starting
    pub fn attempt_started(&self, index: usize, seed: u64) {
        self.bar.set_position(index as u64);
        self.bar.set_message(format!("seed {seed}"));
    }

    /// Note that the current attempt ended in contradiction
    pub fn contradiction(&self) {
        self.bar.inc(1);
    }

    /// Tear down the display with a final status line
    pub fn finish(&self, summary: &str) {
        self.bar.finish_with_message(summary.to_string());
    }
}
