use std::time::Duration;

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Human-readable size with two decimals, in KB below one megabyte.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1_048_576.0;
    let bytes = bytes as f64;
    if bytes < MB {
        format!("{:.2} KB", bytes / KB)
    } else {
        format!("{:.2} MB", bytes / MB)
    }
}
