use chrono::Utc;
use std::env;
use std::fs::{metadata, File};
use std::io::Write;
use std::path::Path;

/// Read `[package.metadata].catalog_schema_version` from the manifest
fn catalog_schema_version(cargo_toml_path: &Path) -> String {
    let contents = std::fs::read_to_string(cargo_toml_path).unwrap_or_default();
    contents
        .parse::<toml::Table>()
        .ok()
        .and_then(|manifest| {
            manifest
                .get("package")
                .and_then(|p| p.as_table())
                .and_then(|p| p.get("metadata"))
                .and_then(|m| m.as_table())
                .and_then(|m| m.get("catalog_schema_version"))
                .and_then(|v| v.as_integer())
        })
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_short_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("version.rs");
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let cargo_toml_path = Path::new(&manifest_dir).join("Cargo.toml");

    // Regenerate only when the manifest is newer than the generated file
    let should_regenerate = match (metadata(&dest_path), metadata(&cargo_toml_path)) {
        (Ok(generated), Ok(manifest)) => {
            manifest.modified().unwrap() > generated.modified().unwrap()
        }
        _ => true,
    };

    if !should_regenerate {
        return;
    }

    let schema_version = catalog_schema_version(&cargo_toml_path);
    let build_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let git_hash = git_short_hash();

    let mut f = File::create(&dest_path).unwrap();
    #[allow(clippy::uninlined_format_args)]
    writeln!(
        &mut f,
        r###"pub const CATALOG_SCHEMA_VERSION: &str = "{}";
pub const BUILD_TIME: &str = "{}";
pub const GIT_HASH: &str = "{}";"###,
        schema_version, build_time, git_hash
    )
    .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
