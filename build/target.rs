//! The supported target matrix, checked by the build script.

/// Accepts the `CARGO_CFG_TARGET_*` values of a supported target and
/// describes the first unsupported one otherwise.
pub fn check_target(
    os: &str,
    arch: &str,
    endian: &str,
    pointer_width: &str,
    env: &str,
) -> Result<(), String> {
    if !matches!(os, "windows" | "linux" | "macos") {
        return Err(format!("tea_os does not support this OS (CARGO_CFG_TARGET_OS = {os:?})"));
    }

    if !matches!(arch, "x86_64" | "x86" | "aarch64" | "arm") {
        return Err(format!(
            "tea_os does not support this architecture (CARGO_CFG_TARGET_ARCH = {arch:?})"
        ));
    }

    if endian != "little" {
        return Err(format!(
            "tea_os only supports little-endian targets (CARGO_CFG_TARGET_ENDIAN = {endian:?})"
        ));
    }

    if !matches!(pointer_width, "32" | "64") {
        return Err(format!(
            "tea_os only supports 32 and 64 bit targets \
             (CARGO_CFG_TARGET_POINTER_WIDTH = {pointer_width:?})"
        ));
    }

    let abi_supported = match os {
        "windows" => matches!(env, "msvc" | "gnu"),
        "linux" => matches!(env, "gnu" | "musl"),
        "macos" => env.is_empty(),
        _ => false,
    };
    if !abi_supported {
        return Err(format!(
            "tea_os does not support this toolchain/OS combination \
             (CARGO_CFG_TARGET_ENV = {env:?}, CARGO_CFG_TARGET_OS = {os:?})"
        ));
    }

    Ok(())
}
