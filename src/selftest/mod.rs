// src/selftest/mod.rs

//! Post-install checks: runtime dependency lookup and the version smoke test

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Check that every runtime dependency resolves on PATH
pub fn check_dependencies(depends_on: &[String]) -> Result<()> {
    for dep in depends_on {
        match which::which(dep) {
            Ok(path) => debug!("Dependency {} found at {}", dep, path.display()),
            Err(_) => return Err(Error::DependencyMissing(dep.clone())),
        }
    }
    Ok(())
}

/// Run `<binary> --version` and require a zero exit code
///
/// Returns the trimmed stdout (the version banner) on success.
pub fn run_self_test(binary_path: &Path) -> Result<String> {
    info!("Running self-test: {} --version", binary_path.display());

    let output = Command::new(binary_path)
        .arg("--version")
        .output()
        .map_err(|e| Error::SelfTestFailure {
            binary: binary_path.display().to_string(),
            reason: format!("failed to execute: {}", e),
        })?;

    if !output.status.success() {
        return Err(Error::SelfTestFailure {
            binary: binary_path.display().to_string(),
            reason: match output.status.code() {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            },
        });
    }

    let banner = String::from_utf8_lossy(&output.stdout).trim().to_string();
    info!("Self-test passed: {}", banner);
    Ok(banner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dependencies_empty_list() {
        assert!(check_dependencies(&[]).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_check_dependencies_finds_sh() {
        assert!(check_dependencies(&["sh".to_string()]).is_ok());
    }

    #[test]
    fn test_check_dependencies_missing() {
        let deps = vec!["definitely-not-a-real-command-9f2a".to_string()];
        match check_dependencies(&deps) {
            Err(Error::DependencyMissing(name)) => {
                assert_eq!(name, "definitely-not-a-real-command-9f2a");
            }
            other => panic!("expected DependencyMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_self_test_missing_binary() {
        let result = run_self_test(Path::new("/nonexistent/binary"));
        assert!(matches!(result, Err(Error::SelfTestFailure { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_self_test_passing_binary() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let script_path = temp.path().join("fake-tool");
        let mut script = std::fs::File::create(&script_path).unwrap();
        script
            .write_all(b"#!/bin/sh\necho \"fake-tool 1.2.3\"\nexit 0\n")
            .unwrap();
        drop(script);
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let banner = run_self_test(&script_path).unwrap();
        assert_eq!(banner, "fake-tool 1.2.3");
    }

    #[cfg(unix)]
    #[test]
    fn test_self_test_failing_binary() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let script_path = temp.path().join("broken-tool");
        let mut script = std::fs::File::create(&script_path).unwrap();
        script.write_all(b"#!/bin/sh\nexit 3\n").unwrap();
        drop(script);
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();

        match run_self_test(&script_path) {
            Err(Error::SelfTestFailure { reason, .. }) => {
                assert!(reason.contains("3"));
            }
            other => panic!("expected SelfTestFailure, got {:?}", other),
        }
    }
}
