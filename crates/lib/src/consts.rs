//! Shared constants for stitch.

/// Number of hex characters kept from a SHA-256 digest for object hashes.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "stitch.toml";

/// Default destination directory for assembled artifacts, relative to the config file.
pub const DEFAULT_DESTINATION: &str = "build/libs";

/// Path of the jar manifest inside an assembled artifact.
pub const JAR_MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Path of the machine-readable assembly manifest inside an assembled artifact.
pub const BUNDLE_MANIFEST_PATH: &str = "META-INF/stitch/manifest.json";

/// Current version of the assembly manifest format.
pub const BUNDLE_MANIFEST_VERSION: u32 = 1;

/// Value written to the `Created-By` jar manifest attribute.
pub const CREATED_BY: &str = concat!("stitch ", env!("CARGO_PKG_VERSION"));
