use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::host::error::{Error, Result};

/// Persisted enabled/disabled flags, independent of whether a package is
/// currently resolvable.
///
/// The backing file is read lazily on first use and written back whenever
/// the set changes. Names that are no longer discoverable are pruned via
/// [`EnabledStore::prune`] after each discovery.
pub struct EnabledStore {
    path: PathBuf,
    cache: Option<HashSet<String>>,
}

impl EnabledStore {
    /// Create a store backed by the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path, cache: None }
    }

    fn load(&mut self) -> &mut HashSet<String> {
        let path = &self.path;
        self.cache.get_or_insert_with(|| match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<HashSet<String>>(&contents) {
                Ok(set) => set,
                Err(e) => {
                    log::warn!(
                        "Enabled-set file '{}' is malformed ({}); starting empty",
                        path.display(),
                        e
                    );
                    HashSet::new()
                }
            },
            Err(_) => HashSet::new(),
        })
    }

    /// Whether the named package is enabled.
    pub fn is_enabled(&mut self, name: &str) -> bool {
        self.load().contains(name)
    }

    /// Set one package's enabled flag and persist the store.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let set = self.load();
        let changed = if enabled {
            set.insert(name.to_string())
        } else {
            set.remove(name)
        };
        if changed {
            self.save()?;
        }
        Ok(())
    }

    /// Enable the named package and persist.
    pub fn enable(&mut self, name: &str) -> Result<()> {
        self.set_enabled(name, true)
    }

    /// Disable the named package and persist.
    pub fn disable(&mut self, name: &str) -> Result<()> {
        self.set_enabled(name, false)
    }

    /// Replace the whole set for the given discoverable names and persist.
    /// Used when a load-set override is applied.
    pub fn apply_override(
        &mut self,
        discoverable: &HashSet<String>,
        selected: &HashSet<String>,
    ) -> Result<()> {
        let set = self.load();
        set.clear();
        set.extend(discoverable.intersection(selected).cloned());
        self.save()
    }

    /// Drop names that are no longer discoverable; persists only if
    /// something was removed.
    pub fn prune(&mut self, discoverable: &HashSet<String>) -> Result<()> {
        let set = self.load();
        let before = set.len();
        set.retain(|name| discoverable.contains(name));
        if set.len() != before {
            self.save()?;
        }
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        let mut names: Vec<String> = self.load().iter().cloned().collect();
        names.sort();
        let json = serde_json::to_string_pretty(&names)
            .map_err(|e| Error::Other(format!("Failed to serialize enabled set: {}", e)))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(e, "create enabled-set directory", parent.to_path_buf()))?;
        }
        fs::write(&self.path, json)
            .map_err(|e| Error::io(e, "write enabled set", self.path.clone()))
    }
}

/// Read a named load-set override file: a JSON list of package names that
/// replaces the enabled set for a single load attempt.
///
/// The name may omit the `.json` suffix. The caller is expected to fall back
/// to the standard enabled set and report the error when this fails.
pub fn read_load_set(dir: &Path, name: &str) -> Result<HashSet<String>> {
    let file_name = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    };
    let path = dir.join(file_name);
    let contents =
        fs::read_to_string(&path).map_err(|e| Error::io(e, "read load set", path.clone()))?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::Other(format!("Load set '{}' is malformed: {}", path.display(), e)))
}
