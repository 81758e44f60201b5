//! Offline update of vulnerability and component data.
//!
//! This module fetches the list of update files from the licensing endpoint, splits it by
//! category, downloads each category into a scratch directory and zips the result.
//! The main entry point is [`run_offline_update`].

mod archiver;
mod batch_downloader;
mod classifier;
mod list_fetcher;
mod pipeline;
mod scratch;

// Re-export public API
pub use archiver::{zip_folder_files, ArchiveSummary};
pub use batch_downloader::{download_batch, BatchReport, DownloadFailure};
pub use classifier::classify;
pub use list_fetcher::{fetch_manifest, parse_manifest};
pub use pipeline::{run_offline_update, FirstError, PipelineReport, PipelineState};
pub use scratch::ScratchDir;
