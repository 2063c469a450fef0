// src/install/mod.rs

//! Binary installation from verified release archives
//!
//! Release tarballs are either flat (`docgen`) or have a single top-level
//! directory (`docgen-0.6.10/docgen`). The named binary is extracted to a
//! temp file inside the destination directory, made executable, and renamed
//! into place so reinstalls overwrite atomically.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tar::Archive;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Install mode for the extracted binary (unix)
#[cfg(unix)]
const BINARY_MODE: u32 = 0o755;

/// Extract `binary` from a verified .tar.gz archive into `bin_dir`
///
/// Returns the path of the installed executable. Safe to run repeatedly:
/// an existing binary at the destination is replaced via rename, never
/// truncated in place.
pub fn install_binary(archive_path: &Path, binary: &str, bin_dir: &Path) -> Result<PathBuf> {
    info!(
        "Installing {} from {} into {}",
        binary,
        archive_path.display(),
        bin_dir.display()
    );

    fs::create_dir_all(bin_dir)?;

    let dest_path = bin_dir.join(binary);
    if dest_path.exists() && !dest_path.is_file() {
        return Err(Error::InstallCollision(dest_path.display().to_string()));
    }

    // Stage in the destination directory so the final rename stays on one
    // filesystem.
    let mut staged = NamedTempFile::new_in(bin_dir)?;
    extract_entry(archive_path, binary, staged.as_file_mut())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(BINARY_MODE);
        staged.as_file().set_permissions(perms)?;
    }

    staged
        .persist(&dest_path)
        .map_err(|e| Error::Io(e.error))?;

    info!("Installed {}", dest_path.display());
    Ok(dest_path)
}

/// Find the named binary in the archive and copy its content to `out`
///
/// Accepts the entry at the archive root or one directory deep; anything
/// buried deeper is treated as not found.
fn extract_entry(archive_path: &Path, binary: &str, out: &mut File) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive.entries()? {
        let mut entry = entry?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let entry_path = entry.path()?.to_path_buf();
        if !matches_binary(&entry_path, binary) {
            continue;
        }

        debug!("Found {} in archive at {}", binary, entry_path.display());
        io::copy(&mut entry, out)?;
        return Ok(());
    }

    Err(Error::BinaryNotInArchive {
        binary: binary.to_string(),
        archive: archive_path.display().to_string(),
    })
}

/// True when the tar entry is the wanted binary at depth 0 or 1
fn matches_binary(entry_path: &Path, binary: &str) -> bool {
    let components: Vec<_> = entry_path
        .components()
        .filter(|c| matches!(c, std::path::Component::Normal(_)))
        .collect();

    if components.len() > 2 {
        return false;
    }

    entry_path
        .file_name()
        .is_some_and(|name| name == binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    /// Build an in-memory .tar.gz containing the given (path, content) files
    fn make_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, path, *content).unwrap();
        }
        let tar_data = builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar_data).unwrap();
        encoder.finish().unwrap()
    }

    fn write_archive(dir: &Path, files: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join("release.tar.gz");
        fs::write(&path, make_archive(files)).unwrap();
        path
    }

    #[test]
    fn test_install_flat_archive() {
        let temp = tempfile::tempdir().unwrap();
        let bin_dir = temp.path().join("bin");
        let archive = write_archive(temp.path(), &[("docgen", b"#!/bin/sh\nexit 0\n")]);

        let installed = install_binary(&archive, "docgen", &bin_dir).unwrap();
        assert_eq!(installed, bin_dir.join("docgen"));
        assert_eq!(fs::read(&installed).unwrap(), b"#!/bin/sh\nexit 0\n");
    }

    #[test]
    fn test_install_nested_archive() {
        let temp = tempfile::tempdir().unwrap();
        let bin_dir = temp.path().join("bin");
        let archive = write_archive(
            temp.path(),
            &[
                ("docgen-0.6.10/README.md", b"readme".as_slice()),
                ("docgen-0.6.10/docgen", b"binary bytes".as_slice()),
            ],
        );

        let installed = install_binary(&archive, "docgen", &bin_dir).unwrap();
        assert_eq!(fs::read(&installed).unwrap(), b"binary bytes");
    }

    #[test]
    fn test_deeply_nested_binary_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let bin_dir = temp.path().join("bin");
        let archive = write_archive(temp.path(), &[("a/b/docgen", b"too deep".as_slice())]);

        let result = install_binary(&archive, "docgen", &bin_dir);
        assert!(matches!(result, Err(Error::BinaryNotInArchive { .. })));
    }

    #[test]
    fn test_missing_binary_in_archive() {
        let temp = tempfile::tempdir().unwrap();
        let bin_dir = temp.path().join("bin");
        let archive = write_archive(temp.path(), &[("other-tool", b"nope".as_slice())]);

        let result = install_binary(&archive, "docgen", &bin_dir);
        assert!(matches!(result, Err(Error::BinaryNotInArchive { .. })));
    }

    #[test]
    fn test_reinstall_overwrites_cleanly() {
        let temp = tempfile::tempdir().unwrap();
        let bin_dir = temp.path().join("bin");

        let first = write_archive(temp.path(), &[("docgen", b"version one".as_slice())]);
        install_binary(&first, "docgen", &bin_dir).unwrap();

        let second = write_archive(temp.path(), &[("docgen", b"version two".as_slice())]);
        let installed = install_binary(&second, "docgen", &bin_dir).unwrap();

        assert_eq!(fs::read(&installed).unwrap(), b"version two");
        // Only the binary lives in the bin dir, no staging leftovers
        assert_eq!(fs::read_dir(&bin_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_collision_with_directory_fails() {
        let temp = tempfile::tempdir().unwrap();
        let bin_dir = temp.path().join("bin");
        fs::create_dir_all(bin_dir.join("docgen")).unwrap();
        let archive = write_archive(temp.path(), &[("docgen", b"bytes".as_slice())]);

        let result = install_binary(&archive, "docgen", &bin_dir);
        assert!(matches!(result, Err(Error::InstallCollision(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_installed_binary_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let bin_dir = temp.path().join("bin");
        let archive = write_archive(temp.path(), &[("docgen", b"#!/bin/sh\nexit 0\n")]);

        let installed = install_binary(&archive, "docgen", &bin_dir).unwrap();
        let mode = fs::metadata(&installed).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
