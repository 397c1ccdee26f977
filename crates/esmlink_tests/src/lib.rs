//! Shared fixtures for the workspace-level integration tests.
//!
//! Fixture manifests live in `tests/fixtures/` at the workspace root.

use esmlink_linker::{parse_manifest_file, LinkError, LinkedProgram, Manifest, ManifestLoader, Program};
use esmlink_options::LinkerOptions;
use std::path::PathBuf;

/// Absolute path of a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

/// Parse a fixture manifest. Panics if the fixture is missing or malformed.
pub fn load_fixture(name: &str) -> Manifest {
    let path = fixture_path(name);
    parse_manifest_file(&path.to_string_lossy())
        .unwrap_or_else(|err| panic!("fixture {} is unreadable: {}", path.display(), err))
}

/// Load `entries` from `manifest` into one program and link it, using
/// `options` in place of the manifest's own linker options.
pub fn link_with(manifest: &Manifest, options: LinkerOptions, entries: &[&str]) -> Result<LinkedProgram, LinkError> {
    let mut loader = ManifestLoader::new(manifest);
    let mut program = Program::new(options);
    for entry in entries {
        program.load(&mut loader, entry)?;
    }
    program.link()
}

/// Load `entries` from `manifest` and link with the manifest's options.
pub fn link(manifest: &Manifest, entries: &[&str]) -> Result<LinkedProgram, LinkError> {
    link_with(manifest, manifest.linker_options.clone(), entries)
}
