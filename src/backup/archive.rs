// dbvault/src/backup/archive.rs
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::Builder;
use tracing::debug;

use crate::errors::{AppError, Result};

/// Wraps a single backup artifact in a gzipped TAR container next to it,
/// producing `<artifact>.tar.gz`. The uncompressed artifact is left in place;
/// the caller decides when to remove it. A failure removes the partial
/// archive so no misleadingly-named file survives.
pub fn compress_artifact(artifact: &Path) -> Result<PathBuf> {
    if !artifact.is_file() {
        return Err(AppError::NotFound(artifact.to_path_buf()));
    }
    let file_name = artifact
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            AppError::Backup(format!("invalid artifact filename: {}", artifact.display()))
        })?;
    let dest = PathBuf::from(format!("{}.tar.gz", artifact.display()));

    debug!(artifact = %artifact.display(), dest = %dest.display(), "compressing artifact");
    match write_tar_gz(artifact, file_name, &dest) {
        Ok(()) => Ok(dest),
        Err(e) => {
            let _ = fs::remove_file(&dest);
            Err(AppError::Backup(format!(
                "failed to compress {}: {e}",
                artifact.display()
            )))
        }
    }
}

fn write_tar_gz(artifact: &Path, entry_name: &str, dest: &Path) -> std::io::Result<()> {
    let archive_file = File::create(dest)?;
    let encoder = GzEncoder::new(archive_file, Compression::default());
    let mut builder = Builder::new(encoder);
    builder.append_path_with_name(artifact, entry_name)?;
    builder.into_inner()?.finish()?;
    Ok(())
}

/// Unpacks a `.tar.gz` or plain `.tar` artifact container into `dest_dir`
/// and returns the path of the inner artifact.
pub fn extract_artifact(archive_path: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !archive_path.is_file() {
        return Err(AppError::NotFound(archive_path.to_path_buf()));
    }
    let file_name = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            AppError::Restore(format!("invalid archive filename: {}", archive_path.display()))
        })?;

    let inner_name = file_name
        .strip_suffix(".tar.gz")
        .or_else(|| file_name.strip_suffix(".tar"))
        .ok_or_else(|| {
            AppError::Restore(format!("{file_name} is not a .tar.gz or .tar archive"))
        })?;

    debug!(archive = %archive_path.display(), dest = %dest_dir.display(), "extracting artifact");
    let archive_file = File::open(archive_path)?;
    let unpack = |mut archive: tar::Archive<Box<dyn std::io::Read>>| archive.unpack(dest_dir);
    let reader: Box<dyn std::io::Read> = if file_name.ends_with(".tar.gz") {
        Box::new(flate2::read::GzDecoder::new(archive_file))
    } else {
        Box::new(archive_file)
    };
    unpack(tar::Archive::new(reader)).map_err(|e| {
        AppError::Restore(format!("failed to unpack {}: {e}", archive_path.display()))
    })?;

    let inner = dest_dir.join(inner_name);
    if !inner.is_file() {
        return Err(AppError::Restore(format!(
            "archive {} did not contain expected artifact {inner_name}",
            archive_path.display()
        )));
    }
    Ok(inner)
}
