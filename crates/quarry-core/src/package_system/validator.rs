use std::collections::HashMap;
use std::sync::Arc;

use crate::host::constants::HOST_NAME;
use crate::package_system::descriptor::PackageDescriptor;
use crate::package_system::enabled::EnabledStore;
use crate::package_system::error::PackageSystemError;

/// Validates a candidate set before ordering.
///
/// Runs two independent passes — name validity, then dependency existence
/// and version floors — each aggregating every violation it finds rather
/// than stopping at the first, so a single run surfaces the complete problem
/// list. Every implicated package is disabled persistently.
pub struct Validator {
    include_weak: bool,
}

impl Validator {
    pub fn new(include_weak: bool) -> Self {
        Self { include_weak }
    }

    pub fn validate(
        &self,
        candidates: &[Arc<PackageDescriptor>],
        enabled: &mut EnabledStore,
    ) -> Result<(), PackageSystemError> {
        let mut issues = Vec::new();

        self.verify_names(candidates, &mut issues);
        self.verify_dependencies(candidates, &mut issues);

        if issues.is_empty() {
            return Ok(());
        }

        let mut disabled: Vec<String> = Vec::new();
        for issue in &issues {
            log::error!("{}", issue);
            for name in issue.implicated() {
                if !disabled.iter().any(|d| d.eq_ignore_ascii_case(&name)) {
                    disabled.push(name);
                }
            }
        }
        for name in &disabled {
            if let Err(e) = enabled.disable(name) {
                log::warn!("Failed to persist disable for '{}': {}", name, e);
            }
        }

        Err(PackageSystemError::ValidationFailure { issues, disabled })
    }

    /// Pass 1: names are non-empty, not the reserved host name, free of path
    /// separators, and unique within the set (case-insensitive). Duplicates
    /// flag every holder of the name.
    fn verify_names(
        &self,
        candidates: &[Arc<PackageDescriptor>],
        issues: &mut Vec<PackageSystemError>,
    ) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for pkg in candidates {
            *counts.entry(pkg.name.to_ascii_lowercase()).or_default() += 1;
        }

        for pkg in candidates {
            let invalid = |reason: &str| PackageSystemError::InvalidName {
                name: pkg.name.clone(),
                reason: reason.to_string(),
            };
            if pkg.name.is_empty() {
                issues.push(invalid("name is empty"));
                continue;
            }
            if pkg.name.eq_ignore_ascii_case(HOST_NAME) {
                issues.push(invalid("name is reserved for the host"));
            }
            if pkg.name.contains('/') || pkg.name.contains('\\') {
                issues.push(invalid("name contains a path separator"));
            }
            if counts[&pkg.name.to_ascii_lowercase()] > 1 {
                issues.push(invalid("two packages share this name"));
            }
        }
    }

    /// Pass 2: every validated reference resolves within the set, and every
    /// strong reference's minimum-version floor is met. Weak references are
    /// checked for existence only in include-weak mode.
    fn verify_dependencies(
        &self,
        candidates: &[Arc<PackageDescriptor>],
        issues: &mut Vec<PackageSystemError>,
    ) {
        let by_name: HashMap<String, &Arc<PackageDescriptor>> = candidates
            .iter()
            .map(|pkg| (pkg.name.to_ascii_lowercase(), pkg))
            .collect();

        for pkg in candidates {
            for dep in pkg.refs(self.include_weak) {
                match by_name.get(&dep.name.to_ascii_lowercase()) {
                    None => issues.push(PackageSystemError::DependencyMissing {
                        package: pkg.name.clone(),
                        dependency: dep.name.clone(),
                    }),
                    Some(installed) => {
                        if let Some(floor) = &dep.min_version {
                            if installed.version < *floor {
                                issues.push(PackageSystemError::VersionTooLow {
                                    package: pkg.name.clone(),
                                    dependency: dep.name.clone(),
                                    required: floor.clone(),
                                    actual: installed.version.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }
    }
}
