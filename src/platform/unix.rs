use std::{
    ffi::{c_void, CString},
    io, mem,
    ptr::{self, NonNull},
    time::Duration,
};

use crate::{
    errors::{OsError, OsResult},
    file::{AccessFlags, Disposition, FileProperties, FilePropertyFlags},
    platform::{Platform, PlatformFile, PlatformMemory, PlatformProcess},
    str8::Str8,
    time::DenseTime,
};

pub type NativeHandle = libc::c_int;

pub(crate) fn error_from_code(code: i32) -> OsError {
    match code {
        libc::ENOENT | libc::ENOTDIR => OsError::NotFound,
        libc::EACCES | libc::EPERM | libc::EROFS => OsError::PermissionDenied,
        libc::EEXIST => OsError::AlreadyExists,
        libc::ENOMEM => OsError::OutOfMemory,
        libc::EBADF => OsError::InvalidHandle,
        libc::ENOSYS | libc::ENOTSUP => OsError::Unsupported,
        libc::EINVAL | libc::ENAMETOOLONG => OsError::InvalidArgument,
        code => OsError::Os(code),
    }
}

fn errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

fn last_error() -> OsError {
    error_from_code(errno())
}

fn c_path(path: Str8<'_>) -> OsResult<CString> {
    CString::new(path.as_bytes()).map_err(|_| OsError::InvalidArgument)
}

fn open_flags(flags: AccessFlags) -> libc::c_int {
    let readable = flags.intersects(AccessFlags::READ | AccessFlags::EXECUTE);
    let writable = flags.intersects(AccessFlags::WRITE | AccessFlags::APPEND);

    let mut oflag = match (readable, writable) {
        (true, true) => libc::O_RDWR,
        (false, true) => libc::O_WRONLY,
        _ => libc::O_RDONLY,
    };
    oflag |= match flags.disposition() {
        Disposition::OpenExisting => 0,
        Disposition::OpenOrCreate => libc::O_CREAT,
        Disposition::CreateOrTruncate => libc::O_CREAT | libc::O_TRUNC,
    };
    if flags.contains(AccessFlags::APPEND) {
        oflag |= libc::O_APPEND;
    }
    if !flags.contains(AccessFlags::INHERITED) {
        oflag |= libc::O_CLOEXEC;
    }
    // SHARE_READ and SHARE_WRITE have no unix counterpart: files are always
    // shared.
    oflag
}

fn offset_from(offset: u64) -> OsResult<libc::off_t> {
    libc::off_t::try_from(offset).map_err(|_| OsError::InvalidArgument)
}

fn dense_time(secs: i64, nsec: i64) -> DenseTime {
    DenseTime::from_unix(secs, (nsec / 1_000_000) as u32)
}

#[cfg(target_os = "macos")]
fn created_time(stat: &libc::stat) -> DenseTime {
    dense_time(stat.st_birthtime as i64, stat.st_birthtime_nsec as i64)
}

// linux's stat carries no birth time; the status change time is the closest
#[cfg(not(target_os = "macos"))]
fn created_time(stat: &libc::stat) -> DenseTime {
    dense_time(stat.st_ctime as i64, stat.st_ctime_nsec as i64)
}

fn is_dir(stat: &libc::stat) -> bool {
    (stat.st_mode & libc::S_IFMT) == libc::S_IFDIR
}

impl PlatformMemory for Platform {
    fn get_page_size() -> usize {
        unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
    }

    unsafe fn reserve(size: usize) -> OsResult<NonNull<u8>> {
        let mmap_result = libc::mmap(
            ptr::null_mut(),
            size,
            libc::PROT_NONE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        );
        if mmap_result == libc::MAP_FAILED {
            return Err(last_error());
        }
        NonNull::new(mmap_result as *mut u8).ok_or(OsError::OutOfMemory)
    }

    unsafe fn release(base: *mut u8, size: usize) -> OsResult<()> {
        if libc::munmap(base as *mut c_void, size) != 0 {
            return Err(last_error());
        }
        Ok(())
    }

    unsafe fn commit(base: *mut u8, size: usize) -> OsResult<()> {
        let result = libc::mprotect(
            base as *mut c_void,
            size,
            libc::PROT_READ | libc::PROT_WRITE,
        );
        if result != 0 {
            return Err(last_error());
        }
        Ok(())
    }

    unsafe fn decommit(base: *mut u8, size: usize) -> OsResult<()> {
        // mapping fresh PROT_NONE pages over the range hands the old pages
        // back to the OS, so a later commit sees zeroes
        let mmap_result = libc::mmap(
            base as *mut c_void,
            size,
            libc::PROT_NONE,
            libc::MAP_FIXED | libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        );
        if mmap_result == libc::MAP_FAILED {
            return Err(last_error());
        }
        Ok(())
    }
}

impl PlatformFile for Platform {
    fn open(path: Str8<'_>, flags: AccessFlags) -> OsResult<NativeHandle> {
        let path = c_path(path)?;
        let oflag = open_flags(flags);
        loop {
            let fd = unsafe { libc::open(path.as_ptr(), oflag, 0o666 as libc::c_uint) };
            if fd >= 0 {
                return Ok(fd);
            }
            if errno() != libc::EINTR {
                return Err(last_error());
            }
        }
    }

    fn close(handle: NativeHandle) -> OsResult<()> {
        // the descriptor is gone even when close reports EINTR, so never retry
        if unsafe { libc::close(handle) } != 0 {
            let code = errno();
            if code != libc::EINTR {
                return Err(error_from_code(code));
            }
        }
        Ok(())
    }

    fn read_at(handle: NativeHandle, offset: u64, out: &mut [u8]) -> OsResult<usize> {
        let offset = offset_from(offset)?;
        loop {
            let result = unsafe {
                libc::pread(handle, out.as_mut_ptr() as *mut c_void, out.len(), offset)
            };
            if result >= 0 {
                return Ok(result as usize);
            }
            if errno() != libc::EINTR {
                return Err(last_error());
            }
        }
    }

    fn write_at(
        handle: NativeHandle,
        offset: u64,
        data: &[u8],
        append: bool,
    ) -> OsResult<usize> {
        // O_APPEND moves every write to the end of the file
        let offset = if append { None } else { Some(offset_from(offset)?) };
        loop {
            let result = unsafe {
                match offset {
                    Some(offset) => {
                        libc::pwrite(handle, data.as_ptr() as *const c_void, data.len(), offset)
                    }
                    None => libc::write(handle, data.as_ptr() as *const c_void, data.len()),
                }
            };
            if result >= 0 {
                return Ok(result as usize);
            }
            if errno() != libc::EINTR {
                return Err(last_error());
            }
        }
    }

    fn properties(handle: NativeHandle) -> OsResult<FileProperties> {
        let mut stat: libc::stat = unsafe { mem::zeroed() };
        if unsafe { libc::fstat(handle, &mut stat) } != 0 {
            return Err(last_error());
        }

        let mut flags = FilePropertyFlags::empty();
        if is_dir(&stat) {
            flags |= FilePropertyFlags::IS_FOLDER;
        }

        Ok(FileProperties {
            size: stat.st_size.max(0) as u64,
            modified: dense_time(stat.st_mtime as i64, stat.st_mtime_nsec as i64),
            created: created_time(&stat),
            flags,
        })
    }

    fn dir_make(path: Str8<'_>) -> OsResult<bool> {
        let path = c_path(path)?;
        if unsafe { libc::mkdir(path.as_ptr(), 0o777) } == 0 {
            return Ok(true);
        }

        let code = errno();
        if code != libc::EEXIST {
            return Err(error_from_code(code));
        }

        let mut stat: libc::stat = unsafe { mem::zeroed() };
        if unsafe { libc::stat(path.as_ptr(), &mut stat) } != 0 {
            return Err(last_error());
        }
        if is_dir(&stat) {
            Ok(false)
        } else {
            Err(OsError::AlreadyExists)
        }
    }
}

impl PlatformProcess for Platform {
    fn exit(code: i32) -> ! {
        unsafe { libc::exit(code) }
    }

    fn now_unix() -> u64 {
        let now = unsafe { libc::time(ptr::null_mut()) };
        now.max(0) as u64
    }

    fn sleep(duration: Duration) {
        let mut request: libc::timespec = unsafe { mem::zeroed() };
        request.tv_sec = duration.as_secs().min(libc::time_t::MAX as u64) as libc::time_t;
        request.tv_nsec = duration.subsec_nanos() as _;
        unsafe {
            libc::nanosleep(&request, ptr::null_mut());
        }
    }
}
