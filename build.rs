//! Build script for the tracker firmware
//!
//! Handles:
//! - Memory layout configuration
//! - defmt linker script for target builds

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // embassy-stm32's `memory-x` feature generates memory.x for the chip
    if env::var_os("CARGO_FEATURE_EMBEDDED").is_some() {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
