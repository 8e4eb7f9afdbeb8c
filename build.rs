#[path = "build/target.rs"]
mod target;

/// Resolves the target capabilities once, before any code is compiled.
///
/// Unsupported targets fail the build here instead of producing a binary
/// that would have no backend to run against.
fn main() {
    let checked = target::check_target(
        &cfg_var("CARGO_CFG_TARGET_OS"),
        &cfg_var("CARGO_CFG_TARGET_ARCH"),
        &cfg_var("CARGO_CFG_TARGET_ENDIAN"),
        &cfg_var("CARGO_CFG_TARGET_POINTER_WIDTH"),
        &cfg_var("CARGO_CFG_TARGET_ENV"),
    );
    if let Err(message) = checked {
        panic!("{message}");
    }

    let target = std::env::var("TARGET").unwrap_or_default();
    println!("cargo:rustc-env=TEA_OS_TARGET={target}");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=build/target.rs");
}

fn cfg_var(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}
