// src/fetch/mod.rs

//! Artifact downloading and checksum verification
//!
//! This module provides functionality for:
//! - Downloading release artifacts with timeout and bounded retry
//! - Streaming SHA-256 verification of downloaded files
//! - Refusing placeholder digests before any network I/O happens

use crate::error::{Error, Result};
use crate::formula::{ArtifactRef, Digest, PlatformTarget};
use reqwest::blocking::Client;
use sha2::{Digest as _, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed downloads
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// HTTP client wrapper with retry support
pub struct ArtifactClient {
    client: Client,
    max_retries: u32,
}

impl ArtifactClient {
    /// Create a new artifact client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Download(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Download a file to the specified path with retry support
    ///
    /// Writes through a `.tmp` sibling and renames into place, so a failed
    /// download never leaves a partial file at the destination.
    pub fn download_file(&self, url: &str, dest_path: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, dest_path.display());

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(mut response) => {
                    if !response.status().is_success() {
                        return Err(Error::Download(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    // Write to temporary file first
                    let temp_path = dest_path.with_extension("tmp");
                    let mut file = File::create(&temp_path)?;

                    io::copy(&mut response, &mut file).map_err(|e| {
                        Error::Download(format!("Failed to write downloaded data: {}", e))
                    })?;

                    // Atomic rename from temp to final destination
                    fs::rename(&temp_path, dest_path)?;

                    info!("Successfully downloaded to {}", dest_path.display());
                    return Ok(());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::Download(format!(
                            "Failed to download after {} attempts: {}",
                            attempt, e
                        )));
                    }
                    warn!("Download attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

impl Default for ArtifactClient {
    fn default() -> Self {
        Self::new().expect("Failed to create default artifact client")
    }
}

/// Fetch and verify the artifact for one platform target
///
/// Refuses to start the download when the declared digest is the all-zero
/// placeholder: an unverifiable artifact must never reach the install step.
/// On checksum mismatch the downloaded file is removed before returning.
pub fn fetch_artifact(
    artifact: &ArtifactRef,
    version: &str,
    target: PlatformTarget,
    dest_dir: &Path,
) -> Result<PathBuf> {
    let expected = match artifact.digest(target)? {
        Digest::Pinned(hex) => hex.to_ascii_lowercase(),
        Digest::Placeholder => {
            return Err(Error::UnverifiableChecksum(target.to_string()));
        }
    };

    let url = artifact.resolved_url(version);
    let default_filename = format!("{}.tar.gz", target);
    let filename = url.split('/').next_back().unwrap_or(&default_filename);
    let dest_path = dest_dir.join(filename);

    let client = ArtifactClient::new()?;
    client.download_file(&url, &dest_path)?;

    if let Err(e) = verify_checksum(&dest_path, &expected) {
        // Never leave an unverified artifact behind
        let _ = fs::remove_file(&dest_path);
        return Err(e);
    }

    Ok(dest_path)
}

/// Verify file checksum matches expected value
pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    debug!("Verifying checksum for {}", path.display());

    let actual = file_sha256(path)?;

    if actual != expected.to_ascii_lowercase() {
        return Err(Error::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        });
    }

    debug!("Checksum verified: {}", expected);
    Ok(())
}

/// Compute the lowercase hex SHA-256 digest of a file
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
