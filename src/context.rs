//! Target capabilities, fixed when the crate is compiled.
//!
//! `build.rs` rejects unsupported targets before compilation starts; the
//! `compile_error!` gates below repeat the check so the crate can never be
//! built against a platform it has no backend for.

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
compile_error!("This OS is not supported.");

#[cfg(not(any(
    target_arch = "x86_64",
    target_arch = "x86",
    target_arch = "aarch64",
    target_arch = "arm"
)))]
compile_error!("Architecture not supported.");

#[cfg(not(target_endian = "little"))]
compile_error!("Only little-endian architectures are supported.");

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("Only 32 and 64 bit targets are supported.");

#[cfg(any(
    all(target_os = "windows", not(any(target_env = "msvc", target_env = "gnu"))),
    all(target_os = "linux", not(any(target_env = "gnu", target_env = "musl"))),
))]
compile_error!("This toolchain/OS combination is not supported.");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    Linux,
    Mac,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    X86,
    Arm64,
    Arm32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordWidth {
    Bits32,
    Bits64,
}

/// The toolchain ABI the binary was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    Msvc,
    Gnu,
    Musl,
    /// The platform's only ABI (macOS)
    System,
}

#[cfg(target_os = "windows")]
pub const OS: Os = Os::Windows;
#[cfg(target_os = "linux")]
pub const OS: Os = Os::Linux;
#[cfg(target_os = "macos")]
pub const OS: Os = Os::Mac;

#[cfg(target_arch = "x86_64")]
pub const ARCH: Arch = Arch::X64;
#[cfg(target_arch = "x86")]
pub const ARCH: Arch = Arch::X86;
#[cfg(target_arch = "aarch64")]
pub const ARCH: Arch = Arch::Arm64;
#[cfg(target_arch = "arm")]
pub const ARCH: Arch = Arch::Arm32;

#[cfg(target_pointer_width = "64")]
pub const WORD_WIDTH: WordWidth = WordWidth::Bits64;
#[cfg(target_pointer_width = "32")]
pub const WORD_WIDTH: WordWidth = WordWidth::Bits32;

#[cfg(target_env = "msvc")]
pub const ABI: Abi = Abi::Msvc;
#[cfg(target_env = "gnu")]
pub const ABI: Abi = Abi::Gnu;
#[cfg(target_env = "musl")]
pub const ABI: Abi = Abi::Musl;
#[cfg(target_os = "macos")]
pub const ABI: Abi = Abi::System;

/// Big-endian targets never get this far.
pub const LITTLE_ENDIAN: bool = true;

/// Target triple the crate was compiled for, as reported by cargo.
pub const TARGET: &str = env!("TEA_OS_TARGET");

/// Snapshot of every capability constant in one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context {
    pub os: Os,
    pub arch: Arch,
    pub word_width: WordWidth,
    pub abi: Abi,
}

impl Context {
    pub const fn current() -> Context {
        Context {
            os: OS,
            arch: ARCH,
            word_width: WORD_WIDTH,
            abi: ABI,
        }
    }

    pub const fn is_windows(&self) -> bool {
        matches!(self.os, Os::Windows)
    }

    pub const fn is_linux(&self) -> bool {
        matches!(self.os, Os::Linux)
    }

    pub const fn is_mac(&self) -> bool {
        matches!(self.os, Os::Mac)
    }

    pub const fn is_64bit(&self) -> bool {
        matches!(self.word_width, WordWidth::Bits64)
    }

    pub const fn is_32bit(&self) -> bool {
        matches!(self.word_width, WordWidth::Bits32)
    }

    pub const fn is_little_endian(&self) -> bool {
        LITTLE_ENDIAN
    }
}
