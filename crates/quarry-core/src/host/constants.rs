/// Host application name. Reserved: no package may claim it.
pub const HOST_NAME: &str = "Quarry";

/// Host version advertised to packages.
pub const HOST_VERSION: &str = "0.4.1";

/// Directory packages are discovered in, relative to the host root.
pub const PACKS_DIR: &str = "packs";

/// Persisted enabled-set file name, inside the packs directory.
pub const ENABLED_FILE: &str = "enabled.json";

/// Directory load-set override files are read from, relative to the host root.
pub const LOAD_SETS_DIR: &str = "loadsets";

/// File-name suffix identifying a package header artifact.
pub const PACK_HEADER_SUFFIX: &str = ".pack.json";

/// In-flight download placeholder; skipped during discovery.
pub const TEMP_DOWNLOAD_NAME: &str = "temporary-download.pack.json";
