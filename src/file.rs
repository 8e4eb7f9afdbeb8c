//! Positional file access and directory creation.
//!
//! Reads and writes always name an absolute offset; a [`File`] has no cursor.

use core::{mem::ManuallyDrop, ops::Range};

use bitflags::bitflags;
use tracing::{debug, trace, warn};

use crate::{
    errors::{OsError, OsResult},
    platform::{NativeHandle, Platform, PlatformFile},
    str8::Str8,
    time::DenseTime,
};

bitflags! {
    /// How a file is opened. Any combination is accepted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const READ        = 1 << 0;
        const WRITE       = 1 << 1;
        const EXECUTE     = 1 << 2;
        /// Every write goes to the end of the file, whatever offset is passed
        const APPEND      = 1 << 3;
        /// Other openers may read while this handle is open (Windows only;
        /// unix files are always shared)
        const SHARE_READ  = 1 << 4;
        /// Other openers may write while this handle is open (Windows only)
        const SHARE_WRITE = 1 << 5;
        /// Child processes inherit the handle
        const INHERITED   = 1 << 6;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FilePropertyFlags: u32 {
        const IS_FOLDER = 1 << 0;
    }
}

/// What `open` does with the path, derived from the access flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Fail with `NotFound` if missing
    OpenExisting,
    /// Create if missing, keep contents otherwise
    OpenOrCreate,
    /// Create if missing, truncate otherwise
    CreateOrTruncate,
}

impl AccessFlags {
    pub(crate) fn disposition(self) -> Disposition {
        if self.contains(AccessFlags::APPEND)
            || (self.contains(AccessFlags::WRITE) && self.contains(AccessFlags::READ))
        {
            Disposition::OpenOrCreate
        } else if self.contains(AccessFlags::WRITE) {
            Disposition::CreateOrTruncate
        } else {
            Disposition::OpenExisting
        }
    }
}

/// Snapshot of a file's metadata, taken by one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileProperties {
    pub size: u64,
    pub modified: DenseTime,
    pub created: DenseTime,
    pub flags: FilePropertyFlags,
}

impl FileProperties {
    pub fn is_dir(&self) -> bool {
        self.flags.contains(FilePropertyFlags::IS_FOLDER)
    }
}

/// An open OS file. The handle is closed when the `File` is dropped.
#[derive(Debug)]
pub struct File {
    handle: NativeHandle,
    flags: AccessFlags,
}

// positional I/O on one handle from several threads is safe at the OS level
unsafe impl Send for File {}
unsafe impl Sync for File {}

impl File {
    pub fn open(path: Str8<'_>, flags: AccessFlags) -> OsResult<File> {
        match Platform::open(path, flags) {
            Ok(handle) => {
                debug!(%path, ?flags, "opened file");
                Ok(File { handle, flags })
            }
            Err(err) => {
                debug!(%path, ?flags, %err, "failed to open file");
                Err(err)
            }
        }
    }

    /// Closes the handle, reporting any error the OS returns. Dropping the
    /// file closes it too but can only log the error.
    pub fn close(self) -> OsResult<()> {
        let file = ManuallyDrop::new(self);
        Platform::close(file.handle)
    }

    pub fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// The native handle, still owned by this `File`
    pub fn raw(&self) -> NativeHandle {
        self.handle
    }

    /// Reads the bytes in `range` into the front of `out`.
    ///
    /// Returns how many bytes were read. Fewer than `range` holds means the
    /// range runs past the end of the file. An inverted range or a buffer
    /// shorter than the range is `InvalidArgument`.
    pub fn read(&self, range: Range<u64>, out: &mut [u8]) -> OsResult<usize> {
        let wanted = range
            .end
            .checked_sub(range.start)
            .ok_or(OsError::InvalidArgument)?;
        let wanted = usize::try_from(wanted).map_err(|_| OsError::InvalidArgument)?;
        if out.len() < wanted {
            return Err(OsError::InvalidArgument);
        }

        let mut total = 0;
        while total < wanted {
            let offset = range.start + total as u64;
            let read = Platform::read_at(self.handle, offset, &mut out[total..wanted])?;
            if read == 0 {
                break;
            }
            total += read;
        }
        trace!(start = range.start, end = range.end, read = total, "read file range");
        Ok(total)
    }

    /// Writes `data` at `offset` and returns how many bytes were written.
    ///
    /// Files opened with [`AccessFlags::APPEND`] ignore `offset` and append.
    pub fn write(&self, offset: u64, data: &[u8]) -> OsResult<usize> {
        let append = self.flags.contains(AccessFlags::APPEND);
        let mut total = 0;
        while total < data.len() {
            let written = Platform::write_at(
                self.handle,
                offset.saturating_add(total as u64),
                &data[total..],
                append,
            )?;
            if written == 0 {
                break;
            }
            total += written;
        }
        trace!(offset, written = total, append, "wrote file range");
        Ok(total)
    }

    pub fn properties(&self) -> OsResult<FileProperties> {
        Platform::properties(self.handle)
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if let Err(err) = Platform::close(self.handle) {
            warn!(%err, "failed to close file");
        }
    }
}

/// Properties of the file or directory at `path`
pub fn properties_from_path(path: Str8<'_>) -> OsResult<FileProperties> {
    let file = File::open(
        path,
        AccessFlags::READ | AccessFlags::SHARE_READ | AccessFlags::SHARE_WRITE,
    )?;
    let properties = file.properties()?;
    file.close()?;
    Ok(properties)
}

/// Creates a directory.
///
/// Returns `true` if the directory was created and `false` if it already
/// existed. A non-directory already at `path` is `AlreadyExists`.
pub fn dir_make(path: Str8<'_>) -> OsResult<bool> {
    let created = Platform::dir_make(path)?;
    if created {
        debug!(%path, "created directory");
    } else {
        trace!(%path, "directory already exists");
    }
    Ok(created)
}
