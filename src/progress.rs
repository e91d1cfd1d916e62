use indicatif::{ProgressBar, ProgressStyle};

/// Receives one update per search task.
pub trait ProgressSink {
    /// `fraction` is in `0.0..=1.0`.
    fn update(&self, fraction: f64, message: &str);

    fn finish(&self, _message: &str) {}
}

/// Discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _fraction: f64, _message: &str) {}
}

const BAR_LENGTH: u64 = 1000;
const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}";

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(BAR_LENGTH);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn update(&self, fraction: f64, message: &str) {
        let position = (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64;
        self.bar.set_position(position);
        self.bar.set_message(message.to_string());
    }

    fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
