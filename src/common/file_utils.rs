use crate::errors::AppError;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub fn ensure_output_directory(dir_path: &Path) -> Result<PathBuf, AppError> {
    if !dir_path.exists() {
        debug!("Output directory '{}' does not exist, attempting to create it.", dir_path.display());
        std::fs::create_dir_all(dir_path).map_err(|e| {
            AppError::Io(format!(
                "Failed to create output directory '{}': {}",
                dir_path.display(),
                e
            ))
        })?;
    } else if !dir_path.is_dir() {
        return Err(AppError::Io(format!(
            "Output path '{}' exists but is not a directory.",
            dir_path.display()
        )));
    }
    Ok(dir_path.to_path_buf())
}

/// Writes snapshot bytes to a fresh `.jpg` file in `staging_dir` and returns its path.
/// The file outlives this call; the image store takes ownership of it.
pub async fn write_staged_snapshot(staging_dir: &Path, bytes: &[u8]) -> Result<PathBuf, AppError> {
    let temp = tempfile::Builder::new()
        .prefix("snap_")
        .suffix(".jpg")
        .tempfile_in(staging_dir)?;
    let (file, path) = temp.keep().map_err(|e| AppError::Io(e.error.to_string()))?;
    let mut file = tokio::fs::File::from_std(file);
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(path)
}
