use semver::{BuildMetadata, Version};
use thiserror::Error;

/// Error type for version parsing
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("Invalid version format: '{0}'")]
    InvalidFormat(String),
    #[error("Version parse error for '{input}': {message}")]
    ParseError { input: String, message: String },
}

/// Parses a package version string into a `semver::Version`.
///
/// Pack authors commonly write short versions ("1.2"); missing minor/patch
/// components are padded with zeros. An optional `+build` suffix is carried
/// through as build metadata.
pub fn parse_version(input: &str) -> Result<Version, VersionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VersionError::InvalidFormat(input.to_string()));
    }

    let (core, build) = match trimmed.split_once('+') {
        Some((core, build)) => (core, Some(build)),
        None => (trimmed, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(VersionError::InvalidFormat(input.to_string()));
    }

    let parse_part = |part: &str| -> Result<u64, VersionError> {
        part.parse::<u64>().map_err(|e| VersionError::ParseError {
            input: input.to_string(),
            message: e.to_string(),
        })
    };

    let major = parse_part(parts[0])?;
    let minor = parts.get(1).map(|p| parse_part(p)).transpose()?.unwrap_or(0);
    let patch = parts.get(2).map(|p| parse_part(p)).transpose()?.unwrap_or(0);

    let mut version = Version::new(major, minor, patch);
    if let Some(build) = build {
        version.build = BuildMetadata::new(build).map_err(|e| VersionError::ParseError {
            input: input.to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(version)
}
