//! Build metadata and catalog schema version accessors.
//!
//! The generated version.rs from the build script is included here so the
//! catalog, the CLI and the logs share a single source of truth.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Catalog schema version used when a manifest value cannot be parsed
const FALLBACK_SCHEMA_VERSION: u32 = 20250901;

/// Catalog schema version stamped into persisted catalogs.
///
/// Falls back to a stable default if the build script could not read it.
pub fn catalog_schema_version() -> u32 {
    CATALOG_SCHEMA_VERSION
        .parse()
        .unwrap_or(FALLBACK_SCHEMA_VERSION)
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Single-line build description for startup logging
pub fn build_summary() -> String {
    format!(
        "{} {} (built {}, git {}, catalog schema {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        build_time(),
        git_hash(),
        catalog_schema_version()
    )
}
