use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::fs;

use crate::host::constants::{PACK_HEADER_SUFFIX, TEMP_DOWNLOAD_NAME};
use crate::host::error::{Error, Result};
use crate::package_system::descriptor::PackageDescriptor;

struct CacheEntry {
    modified: SystemTime,
    descriptor: Arc<PackageDescriptor>,
}

/// Discovers package header artifacts and caches parsed descriptors.
///
/// The cache is keyed by artifact path; a changed modification time
/// invalidates only that artifact's entry. Discovery is side-effect-free
/// apart from cache population.
pub struct DescriptorRepository {
    packs_dir: PathBuf,
    cache: HashMap<PathBuf, CacheEntry>,
}

impl DescriptorRepository {
    /// Create a repository over the given packs directory.
    pub fn new(packs_dir: PathBuf) -> Self {
        Self {
            packs_dir,
            cache: HashMap::new(),
        }
    }

    /// The directory this repository scans.
    pub fn packs_dir(&self) -> &PathBuf {
        &self.packs_dir
    }

    /// Discover every parseable package header, alphabetically by name.
    ///
    /// A parse failure for a single artifact is logged and that artifact is
    /// skipped; it never aborts discovery of the others. The returned order
    /// is byte-wise on the case-folded name, stable across locales.
    pub async fn discover(&mut self) -> Result<Vec<Arc<PackageDescriptor>>> {
        fs::create_dir_all(&self.packs_dir)
            .await
            .map_err(|e| Error::io(e, "create packs directory", self.packs_dir.clone()))?;

        let mut found = Vec::new();
        let mut read_dir = fs::read_dir(&self.packs_dir)
            .await
            .map_err(|e| Error::io(e, "read packs directory", self.packs_dir.clone()))?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Error::io(e, "read packs directory", self.packs_dir.clone()))?
        {
            let path = entry.path();
            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if !file_name.ends_with(PACK_HEADER_SUFFIX) || file_name == TEMP_DOWNLOAD_NAME {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    log::warn!("Skipping '{}': cannot stat artifact: {}", path.display(), e);
                    continue;
                }
            };

            if let Some(cached) = self.cache.get(&path) {
                if cached.modified == modified {
                    found.push(cached.descriptor.clone());
                    continue;
                }
            }

            let bytes = match fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Skipping '{}': cannot read artifact: {}", path.display(), e);
                    continue;
                }
            };
            match PackageDescriptor::parse_header(&path, &bytes, modified) {
                Ok(descriptor) => {
                    let descriptor = Arc::new(descriptor);
                    self.cache.insert(
                        path,
                        CacheEntry {
                            modified,
                            descriptor: descriptor.clone(),
                        },
                    );
                    found.push(descriptor);
                }
                Err(e) => {
                    // drop any stale entry for the now-broken artifact
                    self.cache.remove(&path);
                    log::warn!("Skipping '{}': {}", path.display(), e);
                }
            }
        }

        found.sort();
        Ok(found)
    }
}
