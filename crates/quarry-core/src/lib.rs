pub mod content;
pub mod host;
pub mod package_system;

// Re-export key public types for easier use by the binary and by hosts
// embedding the loader.
pub use host::context::{HostContext, LoadOptions};
pub use host::error::{Error, Result};
pub use package_system::descriptor::{HostSide, PackageDescriptor, Side};
pub use package_system::lifecycle::{InstanceFactory, Orchestrator, PackageRuntime};
pub use package_system::worker::LoadWorker;
