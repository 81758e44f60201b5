use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs::{self, File, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Result of a finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: u64,
}

/// Zips every regular file under `source` into `target`.
///
/// The walk is recursive and sorted by file name. Each file becomes one deflated entry
/// named by its path relative to `source` (with `/` separators), carrying the file's
/// modification time and permission bits. Directories produce no entries.
///
/// `target` is created or truncated. Any error while walking, writing a header or
/// copying data aborts the archive and the partially written file is left in place.
///
/// # Arguments
///
/// * `source` - Directory whose files are archived
/// * `target` - Path of the zip file to write
///
/// # Returns
///
/// Returns an [`ArchiveSummary`] with the archive path, entry count and size.
///
/// # Errors
///
/// Returns an error if:
/// - `target` cannot be created
/// - Walking `source` or reading one of its files fails
/// - Writing an entry or finishing the archive fails
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use xray_offline::offline::zip_folder_files;
///
/// # fn main() -> Result<(), xray_offline::errors::AppError> {
/// let summary = zip_folder_files(Path::new("/tmp/jfrog/xray/comp"), Path::new("/srv/out/comp.zip"))?;
/// println!("{} entries", summary.entries);
/// # Ok(())
/// # }
/// ```
pub fn zip_folder_files(source: &Path, target: &Path) -> AppResult<ArchiveSummary> {
    let file = File::create(target).map_err(|e| {
        AppError::IoError(format!(
            "Failed to create archive {}: {}",
            target.display(),
            e
        ))
    })?;
    let mut zip = ZipWriter::new(file);
    let mut entries = 0usize;

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let name = entry_name(source, path)?;
        let meta = entry.metadata()?;

        zip.start_file(name.as_str(), entry_options(&meta))
            .map_err(|e| AppError::ArchiveError(format!("Failed to add {name}: {e}")))?;

        let mut f = File::open(path).map_err(|e| {
            AppError::IoError(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        io::copy(&mut f, &mut zip).map_err(|e| {
            AppError::IoError(format!("Failed to write {name} into archive: {e}"))
        })?;

        debug!(entry = name.as_str(), bytes = meta.len(), "Added archive entry");
        entries += 1;
    }

    zip.finish()
        .map_err(|e| AppError::ArchiveError(format!("Failed to finalize archive: {e}")))?;

    let bytes = fs::metadata(target)?.len();
    info!(
        archive = %target.display(),
        entries = entries,
        bytes = bytes,
        "Archive written"
    );

    Ok(ArchiveSummary {
        path: target.to_path_buf(),
        entries,
        bytes,
    })
}

fn entry_name(source: &Path, path: &Path) -> AppResult<String> {
    let relative = path.strip_prefix(source).map_err(|e| {
        AppError::ArchiveError(format!("{} is outside {}: {e}", path.display(), source.display()))
    })?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

fn entry_options(meta: &Metadata) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip_time(meta))
        .unix_permissions(permission_bits(meta))
        .large_file(meta.len() > u32::MAX as u64)
}

/// Local modification time in zip (MS-DOS) form; falls back to the zip default
/// when the time is unavailable or before 1980.
fn zip_time(meta: &Metadata) -> zip::DateTime {
    let Ok(modified) = meta.modified() else {
        return zip::DateTime::default();
    };
    let dt: DateTime<Local> = modified.into();
    let (Ok(year), Ok(month), Ok(day), Ok(hour), Ok(minute), Ok(second)) = (
        u16::try_from(dt.year()),
        u8::try_from(dt.month()),
        u8::try_from(dt.day()),
        u8::try_from(dt.hour()),
        u8::try_from(dt.minute()),
        u8::try_from(dt.second()),
    ) else {
        return zip::DateTime::default();
    };
    zip::DateTime::from_date_and_time(year, month, day, hour, minute, second).unwrap_or_default()
}

#[cfg(unix)]
fn permission_bits(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
