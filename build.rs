//! Build script for fuzzy-anemia
//!
//! Embeds version and target information for the CLI.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=ANEMIA_VERSION={}", version);

    // Shown in `fuzzy-anemia --version`
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=ANEMIA_TARGET={}", target);
}
