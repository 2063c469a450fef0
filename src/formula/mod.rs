// src/formula/mod.rs

//! Formula loading, validation, and platform resolution
//!
//! A formula is the declarative recipe for one prebuilt binary: package
//! metadata, runtime dependencies, and a table mapping each supported
//! platform target to a download URL and its expected SHA-256 digest.

pub mod target;

pub use target::{Arch, Os, PlatformTarget};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Digest value release tooling writes before the real checksum is computed
pub const PLACEHOLDER_SHA256: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// A versioned release artifact for one platform target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Download URL; `{version}` is substituted from the formula version
    pub url: String,

    /// Expected SHA-256 digest, 64 hex characters
    pub sha256: String,
}

/// Classification of an artifact's declared digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Digest<'a> {
    /// A real digest the download must match
    Pinned(&'a str),

    /// All-zero placeholder: the release was published without a checksum
    Placeholder,
}

impl ArtifactRef {
    /// Substitute the formula version into the URL template
    pub fn resolved_url(&self, version: &str) -> String {
        self.url.replace("{version}", version)
    }

    /// Classify the declared digest, rejecting anything that is not a
    /// plausible SHA-256 value
    pub fn digest(&self, target: PlatformTarget) -> Result<Digest<'_>> {
        if self.sha256.len() != 64 {
            return Err(Error::InvalidChecksum {
                target: target.to_string(),
                reason: format!("expected 64 hex characters, got {}", self.sha256.len()),
            });
        }
        if !self.sha256.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidChecksum {
                target: target.to_string(),
                reason: "contains non-hex characters".to_string(),
            });
        }

        if self.sha256 == PLACEHOLDER_SHA256 {
            Ok(Digest::Placeholder)
        } else {
            Ok(Digest::Pinned(&self.sha256))
        }
    }
}

/// A formula: the full descriptor for one installable package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    /// Package name; also the default binary name
    pub name: String,

    /// Short human-readable description
    pub desc: Option<String>,

    /// Upstream project homepage
    pub homepage: Option<String>,

    /// Release version, semver-like
    pub version: String,

    /// SPDX license identifier
    pub license: Option<String>,

    /// Name of the binary inside the release archive, when it differs
    /// from the package name
    #[serde(default)]
    pub binary: Option<String>,

    /// External commands that must be on PATH at runtime
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Release artifacts keyed by platform target
    pub artifacts: BTreeMap<PlatformTarget, ArtifactRef>,
}

impl Formula {
    /// Load and validate a formula file, dispatching on extension
    /// (`.json` is parsed as JSON, everything else as TOML)
    pub fn load(path: &Path) -> Result<Formula> {
        debug!("Loading formula from {}", path.display());
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parse and validate a formula from TOML text
    pub fn from_toml_str(content: &str) -> Result<Formula> {
        let formula: Formula = toml::from_str(content)
            .map_err(|e| Error::InvalidFormula(format!("TOML parse error: {}", e)))?;
        formula.validate()?;
        Ok(formula)
    }

    /// Parse and validate a formula from JSON text
    pub fn from_json_str(content: &str) -> Result<Formula> {
        let formula: Formula = serde_json::from_str(content)
            .map_err(|e| Error::InvalidFormula(format!("JSON parse error: {}", e)))?;
        formula.validate()?;
        Ok(formula)
    }

    /// Check the structural invariants every usable formula must hold
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidFormula("name must not be empty".to_string()));
        }

        semver::Version::parse(&self.version).map_err(|e| {
            Error::InvalidFormula(format!(
                "version '{}' is not a semantic version: {}",
                self.version, e
            ))
        })?;

        if self.artifacts.is_empty() {
            return Err(Error::InvalidFormula(format!(
                "formula '{}' declares no artifacts",
                self.name
            )));
        }

        for (target, artifact) in &self.artifacts {
            if artifact.url.trim().is_empty() {
                return Err(Error::InvalidFormula(format!(
                    "artifact for {} has an empty URL",
                    target
                )));
            }
            // Placeholder digests parse fine here; the fetch step refuses them.
            artifact.digest(*target)?;
        }

        Ok(())
    }

    /// Resolve the single artifact for a platform target
    ///
    /// Pure lookup: returns the matching [`ArtifactRef`] or
    /// [`Error::UnsupportedPlatform`] naming the targets the formula does
    /// publish for.
    pub fn artifact_for(&self, target: PlatformTarget) -> Result<&ArtifactRef> {
        self.artifacts.get(&target).ok_or_else(|| {
            Error::UnsupportedPlatform {
                os: target.os.to_string(),
                arch: target.arch.to_string(),
                supported: self
                    .artifacts
                    .keys()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })
    }

    /// Name of the binary to install (falls back to the package name)
    pub fn binary_name(&self) -> &str {
        self.binary.as_deref().unwrap_or(&self.name)
    }
}
