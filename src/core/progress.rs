//! Progress reporting using indicatif.
//!
//! Bars and spinners draw to stderr only when it is a TTY.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Style templates.
pub mod styles {
    use super::*;

    /// Spinner for history mining and other indeterminate phases.
    pub fn spinner() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template")
    }

    /// Bar for batch runs.
    pub fn batch() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:30.green/white}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("=>-")
    }
}

/// Check if stderr is a TTY.
pub fn is_tty() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

/// Create a spinner for indeterminate operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    if is_tty() {
        let bar = ProgressBar::new_spinner();
        bar.set_style(styles::spinner());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    } else {
        ProgressBar::hidden()
    }
}

/// Create a bar counting batch rows.
pub fn create_batch_progress(total: usize) -> ProgressBar {
    if is_tty() {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(styles::batch());
        bar.set_prefix("batch");
        bar
    } else {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_spinner() {
        let spinner = create_spinner("Mining history...");
        spinner.finish_and_clear();
    }

    #[test]
    fn test_batch_progress_tracks_position() {
        let bar = create_batch_progress(3);
        bar.inc(1);
        assert_eq!(bar.position(), 1);
        assert_eq!(bar.length(), Some(3));
    }

    #[test]
    fn test_styles_dont_panic() {
        let _ = styles::spinner();
        let _ = styles::batch();
    }
}
