//! # Quarry Package System Errors
//!
//! Defines error types specific to the Quarry package system.
//!
//! This module includes [`PackageSystemError`], the primary enum covering
//! validation failures (invalid names, missing dependencies, version floors,
//! cyclic ordering, synchronization-stability violations), lifecycle-phase
//! failures, and header parsing problems. Validation-stage errors are
//! aggregated across the whole candidate set into
//! [`PackageSystemError::ValidationFailure`] so a single run surfaces the
//! complete problem list.

use std::path::PathBuf;

use semver::Version;

use crate::package_system::version::VersionError;

/// A lifecycle phase of the batch load/unload state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecyclePhase {
    #[error("Instantiate")]
    Instantiate,
    #[error("Load")]
    Load,
    #[error("Register")]
    Register,
    #[error("Finalize")]
    Finalize,
    #[error("Teardown")]
    Teardown,
}

fn fmt_issues(issues: &[PackageSystemError]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("\n  ")
}

#[derive(Debug, thiserror::Error)]
pub enum PackageSystemError {
    #[error("Invalid package name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Package '{package}' requires missing dependency '{dependency}'")]
    DependencyMissing { package: String, dependency: String },

    #[error(
        "Package '{package}' requires '{dependency}' version {required} or newer, but found {actual}"
    )]
    VersionTooLow {
        package: String,
        dependency: String,
        required: Version,
        actual: Version,
    },

    #[error("Cyclic ordering among packages: {}", .0.join(", "))]
    CyclicOrdering(Vec<String>),

    #[error(
        "Synchronization instability: '{package}' indirectly depends on '{target}' via {}. \
         Some packages in the chain may not exist on both peers; add a direct dependency or ordering hint.",
        chain.join(" -> ")
    )]
    SyncStabilityViolation {
        package: String,
        target: String,
        chain: Vec<String>,
    },

    #[error(
        "Validation failed, {} package(s) disabled:\n  {}",
        .disabled.len(),
        fmt_issues(.issues)
    )]
    ValidationFailure {
        /// Every violation found across the candidate set
        issues: Vec<PackageSystemError>,
        /// Implicated package names, disabled for this and future attempts
        disabled: Vec<String>,
    },

    #[error(
        "{phase} phase failed for package '{package}' (built for host {host_version}): {source}"
    )]
    LoadPhaseFailure {
        package: String,
        phase: LifecyclePhase,
        /// The host version the package declared itself compatible with
        host_version: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Build failed for '{package}': {message}")]
    BuildFailure { package: String, message: String },

    #[error("Package header error for '{}': {message}", path.display())]
    HeaderError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Version parsing error: {0}")]
    VersionParsing(#[from] VersionError),

    #[error("Internal package system error: {0}")]
    InternalError(String),
}

impl PackageSystemError {
    /// The package names implicated by this error, used to disable them for
    /// subsequent load attempts.
    pub fn implicated(&self) -> Vec<String> {
        match self {
            PackageSystemError::InvalidName { name, .. } => vec![name.clone()],
            PackageSystemError::DependencyMissing { package, .. } => vec![package.clone()],
            PackageSystemError::VersionTooLow { package, .. } => vec![package.clone()],
            PackageSystemError::CyclicOrdering(set) => set.clone(),
            PackageSystemError::SyncStabilityViolation { package, .. } => vec![package.clone()],
            PackageSystemError::ValidationFailure { disabled, .. } => disabled.clone(),
            PackageSystemError::LoadPhaseFailure { package, .. } => vec![package.clone()],
            _ => Vec::new(),
        }
    }
}
