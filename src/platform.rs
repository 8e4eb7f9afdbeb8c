use std::{ptr::NonNull, time::Duration};

use crate::{
    errors::OsResult,
    file::{AccessFlags, FileProperties},
    str8::Str8,
};

#[cfg(target_family = "windows")]
mod windows;

#[cfg(target_family = "unix")]
mod unix;

#[cfg(target_family = "windows")]
pub use self::windows::NativeHandle;

#[cfg(target_family = "unix")]
pub use self::unix::NativeHandle;

/// The native backend selected for the target. Service modules only reach
/// the OS through the traits below.
pub struct Platform;

pub trait PlatformMemory {
    /// Granularity of commit and decommit, in bytes
    fn get_page_size() -> usize;

    /// Reserves `size` bytes of address space with no physical backing.
    /// `size` is a multiple of the page size.
    unsafe fn reserve(size: usize) -> OsResult<NonNull<u8>>;

    /// Releases an entire reservation made by `reserve`
    unsafe fn release(base: *mut u8, size: usize) -> OsResult<()>;

    /// Backs the pages in `[base, base + size)` with zeroed memory that is
    /// readable and writable.
    /// If a page in the range is already committed, it remains committed
    /// without issue
    unsafe fn commit(base: *mut u8, size: usize) -> OsResult<()>;

    /// Drops the physical backing of `[base, base + size)` while keeping the
    /// address space reserved. Decommitted pages read as zero once committed
    /// again.
    unsafe fn decommit(base: *mut u8, size: usize) -> OsResult<()>;
}

pub trait PlatformFile {
    fn open(path: Str8<'_>, flags: AccessFlags) -> OsResult<NativeHandle>;

    fn close(handle: NativeHandle) -> OsResult<()>;

    /// One native positional read. May return fewer bytes than `out` holds;
    /// zero means end of file.
    fn read_at(handle: NativeHandle, offset: u64, out: &mut [u8]) -> OsResult<usize>;

    /// One native positional write. With `append` the offset is ignored and
    /// the bytes land at the end of the file.
    fn write_at(
        handle: NativeHandle,
        offset: u64,
        data: &[u8],
        append: bool,
    ) -> OsResult<usize>;

    fn properties(handle: NativeHandle) -> OsResult<FileProperties>;

    /// `Ok(true)` when created, `Ok(false)` when a directory was already there
    fn dir_make(path: Str8<'_>) -> OsResult<bool>;
}

pub trait PlatformProcess {
    fn exit(code: i32) -> !;

    fn now_unix() -> u64;

    /// One native sleep. May return early if interrupted.
    fn sleep(duration: Duration);
}
