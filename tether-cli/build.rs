//! Records the workspace root for `tests/e2e.rs`, which builds the demo
//! plugins under `demos/` by manifest path.

use std::path::Path;

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let manifest_dir = Path::new(&manifest_dir);
    let root = manifest_dir.parent().unwrap_or(manifest_dir);

    println!("cargo::rustc-env=TETHER_WORKSPACE_ROOT={}", root.display());
    println!("cargo::rerun-if-changed=build.rs");
}
