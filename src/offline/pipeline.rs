use super::archiver::{zip_folder_files, ArchiveSummary};
use super::batch_downloader::{download_batch, BatchReport};
use super::classifier::classify;
use super::list_fetcher::fetch_manifest;
use super::scratch::ScratchDir;
use crate::config::OfflineUpdateConfig;
use crate::errors::{AppError, AppResult};
use crate::models::Category;
use crate::utils::{format_duration, format_size};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stages of one offline-update run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    FetchingList,
    Classifying,
    DownloadingVulnerabilities,
    DownloadingComponents,
    /// A bucket was empty and skipped
    Idle,
    Done,
    Aborted,
}

impl PipelineState {
    fn downloading(category: Category) -> Self {
        match category {
            Category::Vulnerability => Self::DownloadingVulnerabilities,
            Category::Component => Self::DownloadingComponents,
        }
    }

    /// Whether the run may move from `self` to `next`.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (FetchingList, Classifying)
                | (FetchingList, Aborted)
                | (Classifying, DownloadingVulnerabilities)
                | (Classifying, Idle)
                | (DownloadingVulnerabilities, DownloadingComponents)
                | (DownloadingVulnerabilities, Idle)
                | (Idle, DownloadingComponents)
                | (Idle, Idle)
                | (Idle, Done)
                | (DownloadingComponents, Done)
        )
    }
}

fn transition(state: &mut PipelineState, next: PipelineState) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal pipeline transition {state:?} -> {next:?}"
    );
    debug!(from = ?state, to = ?next, "Pipeline state change");
    *state = next;
}

/// Keeps the first error of a sequence of fallible steps.
///
/// Later errors are logged and dropped, so a cleanup failure never hides the
/// failure that preceded it.
#[derive(Debug, Default)]
pub struct FirstError {
    error: Option<AppError>,
}

impl FirstError {
    /// Returns the success value, or stores the error if none is stored yet.
    pub fn record<T>(&mut self, result: AppResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                } else {
                    warn!(error = %e, "Error suppressed by an earlier failure");
                }
                None
            }
        }
    }

    pub fn is_set(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_result(self) -> AppResult<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Final state of the run; always [`PipelineState::Done`] for a returned report
    pub state: PipelineState,
    /// `last_update` reported by the list endpoint
    pub last_update: i64,
    /// One entry per non-empty bucket, vulnerabilities first
    pub archives: Vec<ArchiveSummary>,
    /// Downloads that failed but were tolerated
    pub failed_downloads: usize,
}

struct BucketOutcome {
    archive: ArchiveSummary,
    batch: BatchReport,
}

/// Runs the offline update: fetch the list, classify it, then download and zip
/// each non-empty bucket.
///
/// A failure to fetch or parse the list aborts the run before anything is downloaded.
/// The two buckets are processed independently: an error in the vulnerability bucket
/// does not stop the component bucket, and the first error of the run is returned.
/// Each bucket's scratch directory is removed whether or not archiving succeeded.
pub async fn run_offline_update(
    client: &reqwest::Client,
    license_token: &str,
    url: &str,
    config: &OfflineUpdateConfig,
) -> AppResult<PipelineReport> {
    let started = Instant::now();
    let mut state = PipelineState::FetchingList;

    let manifest = match fetch_manifest(client, license_token, url).await {
        Ok(manifest) => manifest,
        Err(e) => {
            transition(&mut state, PipelineState::Aborted);
            return Err(e);
        }
    };

    transition(&mut state, PipelineState::Classifying);
    let buckets = classify(&manifest.urls);
    let classified = buckets.vulnerabilities.len() + buckets.components.len();
    info!(
        last_update = manifest.last_update,
        vulnerabilities = buckets.vulnerabilities.len(),
        components = buckets.components.len(),
        ignored = manifest.urls.len() - classified,
        "Update list classified"
    );

    let mut errors = FirstError::default();
    let mut report = PipelineReport {
        state,
        last_update: manifest.last_update,
        archives: Vec::with_capacity(Category::ALL.len()),
        failed_downloads: 0,
    };

    for category in Category::ALL {
        let urls = buckets.get(category);
        if urls.is_empty() {
            transition(&mut state, PipelineState::Idle);
            info!("There aren't new {}", category.display_name());
            continue;
        }

        transition(&mut state, PipelineState::downloading(category));
        info!(files = urls.len(), "Downloading {}", category.display_name());
        if let Some(outcome) = errors.record(process_bucket(client, category, urls, config).await)
        {
            report.failed_downloads += outcome.batch.failures.len();
            report.archives.push(outcome.archive);
        }
    }

    transition(&mut state, PipelineState::Done);
    errors.into_result()?;
    report.state = state;

    let total_bytes: u64 = report.archives.iter().map(|a| a.bytes).sum();
    info!(
        archives = report.archives.len(),
        failed_downloads = report.failed_downloads,
        size = %format_size(total_bytes),
        elapsed = %format_duration(started.elapsed()),
        "Offline update completed"
    );

    Ok(report)
}

/// Downloads and zips one bucket inside its own scratch directory, then removes it.
async fn process_bucket(
    client: &reqwest::Client,
    category: Category,
    urls: &[String],
    config: &OfflineUpdateConfig,
) -> AppResult<BucketOutcome> {
    let scratch = ScratchDir::create(&config.scratch_root, category.prefix())?;

    let outcome = download_and_archive(client, category, urls, scratch.path(), config).await;
    settle_bucket(outcome, scratch.release())
}

/// Combines a bucket's outcome with the removal of its scratch directory.
///
/// A cleanup error is returned only when the outcome itself succeeded.
fn settle_bucket<T>(outcome: AppResult<T>, cleanup: AppResult<()>) -> AppResult<T> {
    let mut errors = FirstError::default();
    let value = errors.record(outcome);
    errors.record(cleanup);
    errors.into_result()?;
    value.ok_or_else(|| AppError::ArchiveError("Bucket finished without a result".into()))
}

async fn download_and_archive(
    client: &reqwest::Client,
    category: Category,
    urls: &[String],
    scratch_dir: &Path,
    config: &OfflineUpdateConfig,
) -> AppResult<BucketOutcome> {
    let batch = download_batch(client, urls, scratch_dir, category.prefix()).await?;

    if !batch.is_complete() {
        if config.fail_on_download_error {
            let failed: Vec<String> = batch
                .failures
                .iter()
                .map(|f| format!("{} ({})", f.url, f.error))
                .collect();
            return Err(AppError::NetworkError(format!(
                "Failed to download {} of {} {} file(s): {}",
                batch.failures.len(),
                batch.targets.len(),
                category.display_name(),
                failed.join("; ")
            )));
        }
        warn!(
            failed = batch.failures.len(),
            total = batch.targets.len(),
            "Archiving {} with missing files",
            category.display_name()
        );
    }

    let archive_dir = config.archive_dir();
    std::fs::create_dir_all(archive_dir).map_err(|e| {
        AppError::IoError(format!(
            "Failed to create output directory {}: {}",
            archive_dir.display(),
            e
        ))
    })?;
    let target = archive_dir.join(category.archive_name());

    info!(archive = %target.display(), "Zipping files");
    let source = scratch_dir.to_path_buf();
    let archive_target = target.clone();
    let archive = tokio::task::spawn_blocking(move || zip_folder_files(&source, &archive_target))
        .await
        .map_err(|e| AppError::IoError(format!("Task join error: {e}")))??;
    info!(archive = %target.display(), entries = archive.entries, "Done zipping files");

    Ok(BucketOutcome { archive, batch })
}
