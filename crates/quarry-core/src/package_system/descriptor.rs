use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::package_system::dependency::DependencyRef;
use crate::package_system::error::PackageSystemError;
use crate::package_system::version::parse_version;

/// Which peer of a paired session a package applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Present only on the client peer
    Client,
    /// Present only on the server peer
    Server,
    /// Required to be present and identical on both peers
    Both,
}

/// Which kind of host process is doing the loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSide {
    Client,
    Server,
}

impl Side {
    /// Whether packages of this side participate in the synced order.
    pub fn is_synced(&self) -> bool {
        matches!(self, Side::Both)
    }

    /// Whether a package of this side loads on the given host.
    /// A client-only pack never loads on a dedicated server and vice versa.
    pub fn loads_on(&self, host: HostSide) -> bool {
        match self {
            Side::Client => host == HostSide::Client,
            Side::Server => host == HostSide::Server,
            Side::Both => true,
        }
    }
}

/// Parsed metadata header of one package artifact.
///
/// Immutable once parsed; the repository re-parses only when the backing
/// artifact's modification time changes. Identity (`Eq`, `Hash`, `Ord`) is
/// the case-insensitive name: names are unique within a candidate set.
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    /// Unique package name (case-insensitive)
    pub name: String,
    /// Declared package version
    pub version: Version,
    /// The host version this package declares itself compatible with
    pub host_version: Option<Version>,
    /// Side classification
    pub side: Side,
    /// Strong and weak dependency references
    pub dependencies: Vec<DependencyRef>,
    /// Explicit ordering hints: this package loads after the named ones
    pub load_after: Vec<String>,
    /// Explicit ordering hints: this package loads before the named ones
    pub load_before: Vec<String>,
    /// Path of the backing artifact
    pub path: PathBuf,
    /// Modification time of the backing artifact at parse time
    pub modified: SystemTime,
    /// SHA-256 hash of the archive contents; zeroed when the header omits it
    pub hash: [u8; 32],
    /// Optional signature over the content hash
    pub signature: Option<Vec<u8>>,
}

// --- Intermediate structs for deserialization ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawDependencyRef {
    name: String,
    #[serde(default)]
    min_version: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RawPackageHeader {
    name: String,
    version: String,
    #[serde(default)]
    host_version: Option<String>,
    #[serde(default = "default_side")]
    side: Side,
    #[serde(default)]
    dependencies: Vec<RawDependencyRef>,
    #[serde(default)]
    weak_dependencies: Vec<String>,
    #[serde(default)]
    load_after: Vec<String>,
    #[serde(default)]
    load_before: Vec<String>,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    signature: Option<String>,
}

fn default_side() -> Side {
    Side::Both
}

// --- End intermediate structs ---

impl PackageDescriptor {
    /// Parse a package header artifact.
    pub fn parse_header(
        path: &Path,
        bytes: &[u8],
        modified: SystemTime,
    ) -> Result<Self, PackageSystemError> {
        let header_err = |message: String,
                          source: Option<Box<dyn std::error::Error + Send + Sync>>| {
            PackageSystemError::HeaderError {
                path: path.to_path_buf(),
                message,
                source,
            }
        };

        let raw: RawPackageHeader = serde_json::from_slice(bytes)
            .map_err(|e| header_err("malformed header".to_string(), Some(Box::new(e) as _)))?;

        let version = parse_version(&raw.version)
            .map_err(|e| header_err(format!("bad version '{}'", raw.version), Some(Box::new(e) as _)))?;
        let host_version = raw
            .host_version
            .as_deref()
            .map(parse_version)
            .transpose()
            .map_err(|e| header_err("bad host version".to_string(), Some(Box::new(e) as _)))?;

        let mut dependencies = Vec::with_capacity(raw.dependencies.len() + raw.weak_dependencies.len());
        for dep in raw.dependencies {
            let min_version = dep
                .min_version
                .as_deref()
                .map(parse_version)
                .transpose()
                .map_err(|e| {
                    header_err(
                        format!("bad minimum version for dependency '{}'", dep.name),
                        Some(Box::new(e) as _),
                    )
                })?;
            dependencies.push(DependencyRef {
                name: dep.name,
                min_version,
                required: true,
            });
        }
        for name in raw.weak_dependencies {
            dependencies.push(DependencyRef::weak(&name));
        }

        let hash = match raw.hash.as_deref() {
            Some(encoded) => {
                let decoded = hex::decode(encoded)
                    .map_err(|e| header_err("bad content hash".to_string(), Some(Box::new(e) as _)))?;
                decoded
                    .try_into()
                    .map_err(|_| header_err("content hash is not 32 bytes".to_string(), None))?
            }
            None => [0u8; 32],
        };
        let signature = raw
            .signature
            .as_deref()
            .map(hex::decode)
            .transpose()
            .map_err(|e| header_err("bad signature".to_string(), Some(Box::new(e) as _)))?;

        Ok(Self {
            name: raw.name,
            version,
            host_version,
            side: raw.side,
            dependencies,
            load_after: raw.load_after,
            load_before: raw.load_before,
            path: path.to_path_buf(),
            modified,
            hash,
            signature,
        })
    }

    /// Dependency references subject to existence validation.
    /// Weak references are included only in include-weak mode.
    pub fn refs(&self, include_weak: bool) -> impl Iterator<Item = &DependencyRef> {
        self.dependencies
            .iter()
            .filter(move |dep| dep.required || include_weak)
    }

    /// Strong dependency references (always validated and always ordering).
    pub fn strong_refs(&self) -> impl Iterator<Item = &DependencyRef> {
        self.dependencies.iter().filter(|dep| dep.required)
    }

    /// Names this package must load after: explicit hints plus strong
    /// dependencies, plus weak references in include-weak mode.
    pub fn ordered_after(&self, include_weak: bool) -> impl Iterator<Item = &str> {
        self.load_after
            .iter()
            .map(String::as_str)
            .chain(self.refs(include_weak).map(|dep| dep.name.as_str()))
    }

    /// Names this package must load before (explicit hints only).
    pub fn ordered_before(&self) -> impl Iterator<Item = &str> {
        self.load_before.iter().map(String::as_str)
    }

    /// The host version string to report in loading errors.
    pub fn declared_host_version(&self) -> String {
        match &self.host_version {
            Some(v) => v.to_string(),
            None => "<unspecified>".to_string(),
        }
    }
}

// Identity is the case-insensitive name; names are unique within a
// candidate set, which the validator enforces before any set is used.
impl PartialEq for PackageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for PackageDescriptor {}

impl Hash for PackageDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.name.as_bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for PackageDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.name.bytes().map(|b| b.to_ascii_lowercase());
        let right = other.name.bytes().map(|b| b.to_ascii_lowercase());
        left.cmp(right)
    }
}

impl std::fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Builder for descriptors constructed in code (host pseudo-package, tests).
pub struct DescriptorBuilder {
    descriptor: PackageDescriptor,
}

impl DescriptorBuilder {
    /// Start building a descriptor with the given name, version and side.
    pub fn new(name: &str, version: Version, side: Side) -> Self {
        Self {
            descriptor: PackageDescriptor {
                name: name.to_string(),
                version,
                host_version: None,
                side,
                dependencies: Vec::new(),
                load_after: Vec::new(),
                load_before: Vec::new(),
                path: PathBuf::new(),
                modified: SystemTime::UNIX_EPOCH,
                hash: [0u8; 32],
                signature: None,
            },
        }
    }

    /// Add a dependency reference.
    pub fn dependency(mut self, dep: DependencyRef) -> Self {
        self.descriptor.dependencies.push(dep);
        self
    }

    /// Add a load-after ordering hint.
    pub fn load_after(mut self, name: &str) -> Self {
        self.descriptor.load_after.push(name.to_string());
        self
    }

    /// Add a load-before ordering hint.
    pub fn load_before(mut self, name: &str) -> Self {
        self.descriptor.load_before.push(name.to_string());
        self
    }

    /// Declare the compatible host version.
    pub fn host_version(mut self, version: Version) -> Self {
        self.descriptor.host_version = Some(version);
        self
    }

    /// Build the descriptor.
    pub fn build(self) -> PackageDescriptor {
        self.descriptor
    }
}
