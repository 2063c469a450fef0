// src/lib.rs

//! Taproom
//!
//! Installer for tap formulae: declarative manifests that map platform
//! targets to prebuilt binary release artifacts.
//!
//! # Architecture
//!
//! - Formulae: TOML (or JSON) descriptors with per-target URLs and SHA-256 digests
//! - Linear pipeline: resolve -> fetch + verify -> install -> self-test
//! - No partial installs: artifacts are verified before anything touches the bin dir
//! - Placeholder (all-zero) digests are treated as unverifiable and block installation

pub mod fetch;
pub mod formula;
pub mod install;
pub mod selftest;

mod error;

pub use error::{Error, Result};
