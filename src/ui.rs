use crate::errors::{AppError, AppResult};
use indicatif::{ProgressBar, ProgressStyle};

/// Creates the download progress bar.
///
/// An empty batch gets a hidden bar so nothing is drawn for it.
///
/// # Arguments
///
/// * `total` - Number of files in the batch
///
/// # Returns
///
/// Returns a styled `ProgressBar`, or an error if the template cannot be built.
///
/// # Example
///
/// ```no_run
/// use xray_offline::ui;
///
/// # fn main() -> Result<(), xray_offline::errors::AppError> {
/// let pb = ui::create_progress_bar(2)?;
/// pb.inc(1);
/// pb.finish_and_clear();
/// # Ok(())
/// # }
/// ```
pub fn create_progress_bar(total: u64) -> AppResult<ProgressBar> {
    if total == 0 {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| AppError::IoError(format!("Failed to create progress bar template: {e}")))?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
