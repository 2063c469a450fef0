// src/formula/target.rs

//! Platform targets: the (OS, CPU architecture) pairs a formula publishes for

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating systems a formula can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Os {
    MacOs,
    Linux,
}

impl Os {
    /// Detect the operating system of the running host
    pub fn detect() -> Result<Self> {
        match std::env::consts::OS {
            "macos" => Ok(Os::MacOs),
            "linux" => Ok(Os::Linux),
            other => Err(unsupported(other, std::env::consts::ARCH)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::MacOs => "macos",
            Os::Linux => "linux",
        }
    }
}

impl FromStr for Os {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "macos" | "darwin" | "osx" => Ok(Os::MacOs),
            "linux" => Ok(Os::Linux),
            other => Err(Error::InvalidFormula(format!(
                "unknown operating system '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architectures a formula can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arch {
    Arm64,
    X86_64,
}

impl Arch {
    /// Detect the CPU architecture of the running host
    pub fn detect() -> Result<Self> {
        match std::env::consts::ARCH {
            "aarch64" => Ok(Arch::Arm64),
            "x86_64" => Ok(Arch::X86_64),
            other => Err(unsupported(std::env::consts::OS, other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm64 => "arm64",
            Arch::X86_64 => "x86_64",
        }
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            other => Err(Error::InvalidFormula(format!(
                "unknown architecture '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An (OS, architecture) pair, keyed in formula files as e.g. "linux-x86_64"
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformTarget {
    pub os: Os,
    pub arch: Arch,
}

impl PlatformTarget {
    /// All targets this crate knows how to name
    pub const ALL: [PlatformTarget; 4] = [
        PlatformTarget { os: Os::MacOs, arch: Arch::Arm64 },
        PlatformTarget { os: Os::MacOs, arch: Arch::X86_64 },
        PlatformTarget { os: Os::Linux, arch: Arch::Arm64 },
        PlatformTarget { os: Os::Linux, arch: Arch::X86_64 },
    ];

    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the target of the running host
    pub fn detect() -> Result<Self> {
        Ok(Self {
            os: Os::detect()?,
            arch: Arch::detect()?,
        })
    }
}

impl FromStr for PlatformTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (os, arch) = s.split_once('-').ok_or_else(|| {
            Error::InvalidFormula(format!(
                "platform target '{}' is not of the form <os>-<arch>",
                s
            ))
        })?;

        Ok(Self {
            os: os.parse()?,
            arch: arch.parse()?,
        })
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl TryFrom<String> for PlatformTarget {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PlatformTarget> for String {
    fn from(target: PlatformTarget) -> Self {
        target.to_string()
    }
}

/// Build an UnsupportedPlatform error listing every nameable target
fn unsupported(os: &str, arch: &str) -> Error {
    Error::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
        supported: PlatformTarget::ALL
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_targets() {
        for target in PlatformTarget::ALL {
            let parsed: PlatformTarget = target.to_string().parse().unwrap();
            assert_eq!(parsed, target);
        }
    }

    #[test]
    fn test_parse_aliases() {
        let t: PlatformTarget = "darwin-aarch64".parse().unwrap();
        assert_eq!(t, PlatformTarget::new(Os::MacOs, Arch::Arm64));

        let t: PlatformTarget = "linux-amd64".parse().unwrap();
        assert_eq!(t, PlatformTarget::new(Os::Linux, Arch::X86_64));
    }

    #[test]
    fn test_parse_rejects_unknown_os() {
        let result = "windows-x86_64".parse::<PlatformTarget>();
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_arch() {
        let result = "linux-riscv64".parse::<PlatformTarget>();
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        let result = "linux".parse::<PlatformTarget>();
        assert!(result.is_err());
    }

    #[test]
    fn test_display_format() {
        let t = PlatformTarget::new(Os::Linux, Arch::X86_64);
        assert_eq!(t.to_string(), "linux-x86_64");

        let t = PlatformTarget::new(Os::MacOs, Arch::Arm64);
        assert_eq!(t.to_string(), "macos-arm64");
    }

    #[test]
    fn test_detect_matches_host() {
        // Only asserts on hosts this crate supports; elsewhere detection
        // must fail with UnsupportedPlatform.
        match PlatformTarget::detect() {
            Ok(target) => {
                assert_eq!(target.os.as_str(), std::env::consts::OS);
            }
            Err(Error::UnsupportedPlatform { .. }) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}
