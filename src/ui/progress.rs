use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::{OutputFormat, get_output_format};

/// Spinner for a blocking external call. Hidden in JSON mode so the event
/// stream stays machine readable.
pub fn create_spinner(message: String) -> ProgressBar {
    if get_output_format() == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style.tick_chars("⠁⠉⠙⠚⠒⠂⠲⠴⠤⠄⠠⠦⠖⠐⠓⠋ "));
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress bar measured in milliseconds of rendered media.
pub fn create_render_bar(total_seconds: f64, message: &str) -> ProgressBar {
    if get_output_format() == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new((total_seconds * 1000.0) as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>8}/{len:8} ({eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

pub fn finish_spinner_with_success(pb: ProgressBar, message: impl Into<String>) {
    pb.finish_and_clear();
    super::emit(super::Level::Success, "progress.done", &message.into(), None);
}
