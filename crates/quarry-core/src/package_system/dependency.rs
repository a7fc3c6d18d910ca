use std::fmt;

use semver::Version;
use serde::Serialize;

/// Represents a dependency on another package
#[derive(Debug, Clone, Serialize)]
pub struct DependencyRef {
    /// The name of the referenced package
    pub name: String,

    /// The minimum acceptable version; the floor check fails when the
    /// installed version is strictly lower
    pub min_version: Option<Version>,

    /// Whether this is a hard requirement or a weak (ordering-only) reference
    pub required: bool,
}

impl DependencyRef {
    /// Create a new required dependency with a minimum-version floor
    pub fn required(name: &str, min_version: Version) -> Self {
        Self {
            name: name.to_string(),
            min_version: Some(min_version),
            required: true,
        }
    }

    /// Create a new required dependency with any version
    pub fn required_any(name: &str) -> Self {
        Self {
            name: name.to_string(),
            min_version: None,
            required: true,
        }
    }

    /// Create a new weak reference; participates in ordering (and, in
    /// include-weak mode, existence validation) but carries no floor
    pub fn weak(name: &str) -> Self {
        Self {
            name: name.to_string(),
            min_version: None,
            required: false,
        }
    }

    /// Check whether the given installed version satisfies the floor
    pub fn is_satisfied_by(&self, installed: &Version) -> bool {
        match &self.min_version {
            Some(floor) => installed >= floor,
            None => true,
        }
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.required { "Requires" } else { "Weakly references" };
        match &self.min_version {
            Some(floor) => write!(f, "{} package: {} (>= {})", kind, self.name, floor),
            None => write!(f, "{} package: {} (any version)", kind, self.name),
        }
    }
}
