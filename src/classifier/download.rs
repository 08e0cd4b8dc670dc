use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::network::ArtifactError;

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Fetches the artifact at `url` into `dest`, returning the number of bytes written.
/// The body goes to a sibling `.part` file first and is renamed into place.
pub fn download_model(url: &str, dest: &Path) -> Result<u64, ArtifactError> {
    info!("Downloading model from {}", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| ArtifactError::Download(e.to_string()))?;

    let bytes = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(|e| ArtifactError::Download(e.to_string()))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let partial = dest.with_extension("part");
    if let Err(e) = write_then_rename(&bytes, &partial, dest) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }

    info!(
        "Model downloaded to {} ({:.2} MB)",
        dest.display(),
        bytes.len() as f64 / (1024.0 * 1024.0)
    );
    Ok(bytes.len() as u64)
}

fn write_then_rename(bytes: &[u8], partial: &Path, dest: &Path) -> std::io::Result<()> {
    let mut file = File::create(partial)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(partial, dest)
}
