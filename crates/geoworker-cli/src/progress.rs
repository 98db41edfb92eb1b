use indicatif::{ProgressBar, ProgressStyle};

/// Percent bar for one task
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg}\n[{bar:40.cyan/blue}] {pos}% {elapsed}")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb.set_message(message.to_string());
    pb
}

pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("✗ {}", message));
}
