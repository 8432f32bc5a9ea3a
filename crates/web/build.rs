//! Build script for the web crate.
//!
//! Hashes the static assets so templates can append `?v=<hash>` and let
//! browsers cache them until the content changes.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Assets covered by the hash, relative to the crate root.
const HASHED_ASSETS: &[&str] = &[
    "static/css/main.css",
    "static/js/admin.js",
    "static/js/signup.js",
];

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");

    let mut hasher = Sha256::new();
    for asset in HASHED_ASSETS {
        let path = Path::new(&manifest_dir).join(asset);
        println!("cargo:rerun-if-changed={}", path.display());

        match fs::read(&path) {
            Ok(content) => hasher.update(&content),
            Err(e) => println!("cargo:warning=Could not read {asset}: {e}"),
        }
    }

    // First 8 chars of SHA256
    let hash = format!("{:x}", hasher.finalize());
    println!("cargo:rustc-env=ASSET_HASH={}", &hash[..8]);
}
