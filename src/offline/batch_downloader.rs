use crate::errors::{AppError, AppResult};
use crate::ui;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// A download that did not produce its target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    pub url: String,
    pub file_name: String,
    pub error: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Target file name for every URL, in bucket order, whether or not it downloaded
    pub targets: Vec<String>,
    pub downloaded: usize,
    pub failures: Vec<DownloadFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Target name of the URL at `index`: `<prefix><index>.json`.
pub(crate) fn target_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{index}.json")
}

/// Downloads every URL of a bucket into `dest_dir`, one after another.
///
/// The URL at index `i` is written to `<prefix><i>.json`. There is no retry and no
/// integrity check. A failed download is logged and recorded in the returned
/// [`BatchReport`]; the remaining URLs are still attempted and no error is returned
/// for it. Only a failure to set up the progress display is returned as an error.
///
/// # Arguments
///
/// * `client` - HTTP client used for every request
/// * `urls` - Bucket URLs, in the order they were classified
/// * `dest_dir` - Existing directory receiving the files
/// * `prefix` - File name prefix, `vuln` or `comp`
///
/// # Returns
///
/// Returns a [`BatchReport`] listing every target name, the number of files written
/// and the failed downloads.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use xray_offline::offline::download_batch;
///
/// # async fn example() -> Result<(), xray_offline::errors::AppError> {
/// let client = reqwest::Client::new();
/// let urls = vec!["https://updates.example.com/data/1__vuln.json".to_string()];
/// let report = download_batch(&client, &urls, Path::new("/tmp/jfrog/xray/vuln"), "vuln").await?;
/// // Writes /tmp/jfrog/xray/vuln/vuln0.json
/// assert_eq!(report.targets, vec!["vuln0.json"]);
/// # Ok(())
/// # }
/// ```
pub async fn download_batch(
    client: &reqwest::Client,
    urls: &[String],
    dest_dir: &Path,
    prefix: &str,
) -> AppResult<BatchReport> {
    let mut report = BatchReport {
        targets: Vec::with_capacity(urls.len()),
        ..BatchReport::default()
    };

    let pb = ui::create_progress_bar(urls.len() as u64)?;

    for (index, url) in urls.iter().enumerate() {
        let file_name = target_file_name(prefix, index);
        let file_path = dest_dir.join(&file_name);
        info!(url = url.as_str(), file = file_name.as_str(), "Downloading");
        pb.set_message(format!("Downloading {file_name}..."));

        match download_to_file(client, url, &file_path).await {
            Ok(bytes) => {
                debug!(file = file_name.as_str(), bytes = bytes, "Download finished");
                report.downloaded += 1;
            }
            Err(e) => {
                warn!(
                    url = url.as_str(),
                    file = file_name.as_str(),
                    error = %e,
                    "Failed to download file"
                );
                report.failures.push(DownloadFailure {
                    url: url.clone(),
                    file_name: file_name.clone(),
                    error: e.to_string(),
                });
            }
        }

        report.targets.push(file_name);
        pb.inc(1);
    }

    if report.is_complete() {
        pb.finish_with_message(format!("Downloaded {} file(s)", report.downloaded));
    } else {
        pb.finish_with_message(format!(
            "Downloaded {} file(s), {} failed",
            report.downloaded,
            report.failures.len()
        ));
    }

    Ok(report)
}

/// Streams one URL into `file_path`. A partially written file is removed on failure.
async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    file_path: &Path,
) -> AppResult<u64> {
    let response = client.get(url).send().await?;

    let status = response.status();
    let mut response = response
        .error_for_status()
        .map_err(|e| AppError::NetworkError(format!("HTTP {}: {e}", status.as_u16())))?;

    let mut file = File::create(file_path).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to create file {}: {}",
            file_path.display(),
            e
        ))
    })?;

    let mut written = 0u64;
    let streamed = async {
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok::<(), AppError>(())
    }
    .await;
    drop(file);

    if let Err(e) = streamed {
        if let Err(remove_err) = fs::remove_file(file_path).await {
            warn!(
                file_path = %file_path.display(),
                error = %remove_err,
                "Failed to remove partial download"
            );
        }
        return Err(e);
    }

    Ok(written)
}
