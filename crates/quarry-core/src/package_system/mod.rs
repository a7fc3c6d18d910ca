//! # Quarry Package System
//!
//! Infrastructure for discovering, validating, ordering, and activating
//! extension packages. It owns the whole lifecycle: header discovery and
//! caching, dependency and version-floor validation, deterministic
//! topological ordering with synchronization-stability checking, and the
//! batch load/unload state machine.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`descriptor`]**: Package metadata ([`PackageDescriptor`]), side
//!   classification, and header parsing.
//! - **[`dependency`]**: Strong and weak dependency references with
//!   minimum-version floors.
//! - **[`version`]**: Version-string parsing on top of semver.
//! - **[`repository`]**: Header discovery with a per-artifact
//!   modification-time cache.
//! - **[`validator`]**: Aggregated name and dependency validation.
//! - **[`sort`]**: Generic precedence graph ([`TopoSort`]) and the load-order
//!   resolution pipeline.
//! - **[`stability`]**: The synchronization-stability proof over the
//!   Both-side subset.
//! - **[`lifecycle`]**: The [`PackageRuntime`] contract and the batch
//!   [`Orchestrator`].
//! - **[`enabled`]**: The persisted enabled set and load-set overrides.
//! - **[`worker`]**: The single dedicated background worker queueing batches
//!   and build requests.
//! - **[`signature`]**: Content hashing and signature verification as a
//!   trust signal.
//! - **[`error`]**: The [`PackageSystemError`](error::PackageSystemError)
//!   taxonomy.

pub mod dependency;
pub mod descriptor;
pub mod enabled;
pub mod error;
pub mod lifecycle;
pub mod repository;
pub mod signature;
pub mod sort;
pub mod stability;
pub mod validator;
pub mod version;
pub mod worker;

pub use dependency::DependencyRef;
pub use descriptor::{HostSide, PackageDescriptor, Side};
pub use enabled::EnabledStore;
pub use lifecycle::{CapabilitySet, InstanceFactory, Orchestrator, PackageRuntime};
pub use repository::DescriptorRepository;
pub use sort::{resolve_load_order, TopoSort};
pub use validator::Validator;
pub use worker::{LoadWorker, PackageBuilder};

// Test module declaration
#[cfg(test)]
mod tests;
