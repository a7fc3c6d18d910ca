use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::host::constants::{ENABLED_FILE, LOAD_SETS_DIR, PACKS_DIR};
use crate::host::error::Result;
use crate::package_system::descriptor::{HostSide, PackageDescriptor};
use crate::package_system::enabled::{read_load_set, EnabledStore};
use crate::package_system::repository::DescriptorRepository;

/// Options for a single load attempt.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Named load-set override; replaces the enabled set for this attempt.
    pub load_set: Option<String>,
    /// Whether weak references participate in existence validation and
    /// ordering.
    pub include_weak: bool,
    /// Escape hatch for a boot loop: load with an empty candidate set.
    pub skip_all: bool,
}

/// Explicit loader state threaded through the discovery → validate → sort →
/// orchestrate pipeline. Independent contexts allow independent load
/// attempts without shared process-wide state.
pub struct HostContext {
    root: PathBuf,
    host_side: HostSide,
    repository: DescriptorRepository,
    enabled: Arc<Mutex<EnabledStore>>,
}

impl HostContext {
    /// Create a context rooted at the given directory.
    pub fn new(root: &Path, host_side: HostSide) -> Self {
        let packs_dir = root.join(PACKS_DIR);
        let enabled = EnabledStore::new(packs_dir.join(ENABLED_FILE));
        Self {
            root: root.to_path_buf(),
            host_side,
            repository: DescriptorRepository::new(packs_dir),
            enabled: Arc::new(Mutex::new(enabled)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn host_side(&self) -> HostSide {
        self.host_side
    }

    /// The shared enabled store. Outside a batch the caller may lock it
    /// directly (e.g. CLI enable/disable); during a batch only the worker
    /// touches it.
    pub fn enabled(&self) -> &Arc<Mutex<EnabledStore>> {
        &self.enabled
    }

    /// Discover every parseable package, pruning the enabled set of names
    /// that are no longer discoverable.
    pub async fn discover(&mut self) -> Result<Vec<Arc<PackageDescriptor>>> {
        let discovered = self.repository.discover().await?;
        let known: HashSet<String> = discovered.iter().map(|pkg| pkg.name.clone()).collect();
        self.enabled.lock().await.prune(&known)?;
        Ok(discovered)
    }

    /// Build the candidate set for a load attempt: discovered ∧ enabled ∧
    /// side-applicable, with the load-set override applied first when given.
    pub async fn select_candidates(
        &mut self,
        opts: &LoadOptions,
    ) -> Result<Vec<Arc<PackageDescriptor>>> {
        let discovered = self.repository.discover().await?;
        let known: HashSet<String> = discovered.iter().map(|pkg| pkg.name.clone()).collect();

        let mut enabled = self.enabled.lock().await;
        enabled.prune(&known)?;

        if let Some(name) = &opts.load_set {
            match read_load_set(&self.root.join(LOAD_SETS_DIR), name) {
                Ok(selected) => enabled.apply_override(&known, &selected)?,
                Err(e) => {
                    log::error!(
                        "Failed to read load set '{}': {}; falling back to the enabled set",
                        name,
                        e
                    );
                }
            }
        }

        if opts.skip_all {
            return Ok(Vec::new());
        }

        let host_side = self.host_side;
        Ok(discovered
            .into_iter()
            .filter(|pkg| enabled.is_enabled(&pkg.name) && pkg.side.loads_on(host_side))
            .collect())
    }
}
