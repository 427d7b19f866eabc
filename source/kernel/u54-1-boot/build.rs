// Copyright 2024 U54 Bring-up Contributors
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=U54_LINKER_SCRIPT");

    // Host builds produce the stub binary and use the default linker setup.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return;
    }

    let script = match env::var("U54_LINKER_SCRIPT") {
        Ok(script) => PathBuf::from(script),
        Err(_) => {
            let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
            manifest_dir.join("mpfs-lim.ld")
        }
    };
    println!("cargo:rerun-if-changed={}", script.display());
    // Use canonicalize to ensure only a single absolute path reaches the linker
    let abs_script = script.canonicalize().expect("linker script must exist");
    println!("cargo:rustc-link-arg-bins=-T{}", abs_script.display());
}
