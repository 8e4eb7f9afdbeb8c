use std::{
    ffi::c_void,
    iter, mem,
    ptr::{self, addr_of_mut, NonNull},
    time::Duration,
};

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{
            CloseHandle, GetLastError, ERROR_ACCESS_DENIED, ERROR_ALREADY_EXISTS,
            ERROR_COMMITMENT_LIMIT, ERROR_FILE_EXISTS, ERROR_FILE_NOT_FOUND, ERROR_HANDLE_EOF,
            ERROR_INVALID_HANDLE, ERROR_INVALID_NAME, ERROR_INVALID_PARAMETER,
            ERROR_NOT_ENOUGH_MEMORY, ERROR_NOT_SUPPORTED, ERROR_OUTOFMEMORY,
            ERROR_PATH_NOT_FOUND, ERROR_SHARING_VIOLATION, ERROR_WRITE_PROTECT, FILETIME,
            GENERIC_EXECUTE, GENERIC_READ, GENERIC_WRITE, HANDLE,
        },
        Security::SECURITY_ATTRIBUTES,
        Storage::FileSystem::{
            CreateDirectoryW, CreateFileW, GetFileAttributesW, GetFileInformationByHandle,
            ReadFile, WriteFile, BY_HANDLE_FILE_INFORMATION, CREATE_ALWAYS, FILE_APPEND_DATA,
            FILE_ATTRIBUTE_DIRECTORY, FILE_ATTRIBUTE_NORMAL, FILE_CREATION_DISPOSITION,
            FILE_FLAG_BACKUP_SEMANTICS, FILE_SHARE_MODE, FILE_SHARE_READ, FILE_SHARE_WRITE,
            INVALID_FILE_ATTRIBUTES, OPEN_ALWAYS, OPEN_EXISTING,
        },
        System::{
            Memory::{
                VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_DECOMMIT, MEM_RELEASE, MEM_RESERVE,
                PAGE_NOACCESS, PAGE_READWRITE,
            },
            SystemInformation::{GetSystemInfo, GetSystemTimeAsFileTime, SYSTEM_INFO},
            Threading::{ExitProcess, Sleep},
            IO::OVERLAPPED,
        },
    },
};

use crate::{
    errors::{OsError, OsResult},
    file::{AccessFlags, Disposition, FileProperties, FilePropertyFlags},
    platform::{Platform, PlatformFile, PlatformMemory, PlatformProcess},
    str8::Str8,
    time::DenseTime,
};

pub type NativeHandle = HANDLE;

// FILETIME ticks are 100ns since 1601-01-01
const TICKS_PER_SECOND: u64 = 10_000_000;
const EPOCH_DIFFERENCE_SECONDS: i64 = 11_644_473_600;

pub(crate) fn error_from_code(code: u32) -> OsError {
    match code {
        code if code == ERROR_FILE_NOT_FOUND.0 || code == ERROR_PATH_NOT_FOUND.0 => {
            OsError::NotFound
        }
        code if code == ERROR_ACCESS_DENIED.0
            || code == ERROR_SHARING_VIOLATION.0
            || code == ERROR_WRITE_PROTECT.0 =>
        {
            OsError::PermissionDenied
        }
        code if code == ERROR_ALREADY_EXISTS.0 || code == ERROR_FILE_EXISTS.0 => {
            OsError::AlreadyExists
        }
        code if code == ERROR_NOT_ENOUGH_MEMORY.0
            || code == ERROR_OUTOFMEMORY.0
            || code == ERROR_COMMITMENT_LIMIT.0 =>
        {
            OsError::OutOfMemory
        }
        code if code == ERROR_INVALID_HANDLE.0 => OsError::InvalidHandle,
        code if code == ERROR_NOT_SUPPORTED.0 => OsError::Unsupported,
        code if code == ERROR_INVALID_PARAMETER.0 || code == ERROR_INVALID_NAME.0 => {
            OsError::InvalidArgument
        }
        code => OsError::Os(code as i32),
    }
}

fn last_error_code() -> u32 {
    unsafe { GetLastError() }.0
}

fn last_error() -> OsError {
    error_from_code(last_error_code())
}

/// Win32 failures arrive as HRESULTs wrapping the `GetLastError` value
fn win32_code(err: &windows::core::Error) -> u32 {
    let hresult = err.code().0 as u32;
    if hresult & 0xFFFF_0000 == 0x8007_0000 {
        hresult & 0xFFFF
    } else {
        hresult
    }
}

fn error_from_windows(err: windows::core::Error) -> OsError {
    error_from_code(win32_code(&err))
}

fn wide_path(path: Str8<'_>) -> OsResult<Vec<u16>> {
    let path = path.to_str()?;
    if path.contains('\0') {
        return Err(OsError::InvalidArgument);
    }
    Ok(path.encode_utf16().chain(iter::once(0)).collect())
}

fn desired_access(flags: AccessFlags) -> u32 {
    let mut access = 0;
    if flags.contains(AccessFlags::READ) {
        access |= GENERIC_READ.0;
    }
    if flags.contains(AccessFlags::WRITE) {
        access |= GENERIC_WRITE.0;
    }
    if flags.contains(AccessFlags::EXECUTE) {
        access |= GENERIC_EXECUTE.0;
    }
    if flags.contains(AccessFlags::APPEND) {
        access |= FILE_APPEND_DATA.0;
    }
    access
}

fn share_mode(flags: AccessFlags) -> FILE_SHARE_MODE {
    let mut share = FILE_SHARE_MODE(0);
    if flags.contains(AccessFlags::SHARE_READ) {
        share |= FILE_SHARE_READ;
    }
    if flags.contains(AccessFlags::SHARE_WRITE) {
        share |= FILE_SHARE_WRITE;
    }
    share
}

fn creation_disposition(flags: AccessFlags) -> FILE_CREATION_DISPOSITION {
    match flags.disposition() {
        Disposition::OpenExisting => OPEN_EXISTING,
        Disposition::OpenOrCreate => OPEN_ALWAYS,
        Disposition::CreateOrTruncate => CREATE_ALWAYS,
    }
}

fn overlapped_at(offset: u64) -> OVERLAPPED {
    let mut overlapped = OVERLAPPED::default();
    unsafe {
        overlapped.Anonymous.Anonymous.Offset = offset as u32;
        overlapped.Anonymous.Anonymous.OffsetHigh = (offset >> 32) as u32;
    }
    overlapped
}

fn dense_time(filetime: FILETIME) -> DenseTime {
    let ticks =
        (u64::from(filetime.dwHighDateTime) << 32) | u64::from(filetime.dwLowDateTime);
    let secs = (ticks / TICKS_PER_SECOND) as i64 - EPOCH_DIFFERENCE_SECONDS;
    let msec = ((ticks % TICKS_PER_SECOND) / 10_000) as u32;
    DenseTime::from_unix(secs, msec)
}

impl PlatformMemory for Platform {
    fn get_page_size() -> usize {
        let page_size: u32;
        unsafe {
            let mut system_info = SYSTEM_INFO {
                ..Default::default()
            };
            GetSystemInfo(addr_of_mut!(system_info));
            page_size = system_info.dwPageSize;
        }

        page_size as usize
    }

    unsafe fn reserve(size: usize) -> OsResult<NonNull<u8>> {
        let base = VirtualAlloc(
            None, // let the system allocate the region
            size,
            MEM_RESERVE,
            PAGE_NOACCESS,
        ) as *mut u8;
        NonNull::new(base).ok_or_else(last_error)
    }

    unsafe fn release(base: *mut u8, _size: usize) -> OsResult<()> {
        VirtualFree(base as *mut c_void, 0, MEM_RELEASE).map_err(error_from_windows)
    }

    unsafe fn commit(base: *mut u8, size: usize) -> OsResult<()> {
        /*
        From microsoft docs on VirtualAlloc:
        "VirtualAlloc...can commit a page that is already committed.
        This means you can commit a range of pages, regardless of whether
        they have already been committed, and the function will not fail."
        */
        let result = VirtualAlloc(
            Some(base as *const c_void),
            size,
            MEM_COMMIT,
            PAGE_READWRITE,
        );
        if result.is_null() {
            return Err(last_error());
        }
        Ok(())
    }

    unsafe fn decommit(base: *mut u8, size: usize) -> OsResult<()> {
        VirtualFree(base as *mut c_void, size, MEM_DECOMMIT).map_err(error_from_windows)
    }
}

impl PlatformFile for Platform {
    fn open(path: Str8<'_>, flags: AccessFlags) -> OsResult<NativeHandle> {
        let path = wide_path(path)?;
        let security = SECURITY_ATTRIBUTES {
            nLength: mem::size_of::<SECURITY_ATTRIBUTES>() as u32,
            lpSecurityDescriptor: ptr::null_mut(),
            bInheritHandle: true.into(),
        };
        let security = if flags.contains(AccessFlags::INHERITED) {
            Some(&security as *const SECURITY_ATTRIBUTES)
        } else {
            None
        };

        unsafe {
            CreateFileW(
                PCWSTR(path.as_ptr()),
                desired_access(flags),
                share_mode(flags),
                security,
                creation_disposition(flags),
                // backup semantics lets directories be opened for properties
                FILE_ATTRIBUTE_NORMAL | FILE_FLAG_BACKUP_SEMANTICS,
                HANDLE::default(),
            )
        }
        .map_err(error_from_windows)
    }

    fn close(handle: NativeHandle) -> OsResult<()> {
        unsafe { CloseHandle(handle) }.map_err(error_from_windows)
    }

    fn read_at(handle: NativeHandle, offset: u64, out: &mut [u8]) -> OsResult<usize> {
        let len = out.len().min(u32::MAX as usize);
        let mut overlapped = overlapped_at(offset);
        let mut read: u32 = 0;
        let result = unsafe {
            ReadFile(
                handle,
                Some(&mut out[..len]),
                Some(addr_of_mut!(read)),
                Some(addr_of_mut!(overlapped)),
            )
        };
        match result {
            Ok(()) => Ok(read as usize),
            Err(err) if win32_code(&err) == ERROR_HANDLE_EOF.0 => Ok(0),
            Err(err) => Err(error_from_windows(err)),
        }
    }

    fn write_at(
        handle: NativeHandle,
        offset: u64,
        data: &[u8],
        append: bool,
    ) -> OsResult<usize> {
        let len = data.len().min(u32::MAX as usize);
        // an offset of all ones writes at the end of the file
        let mut overlapped = overlapped_at(if append { u64::MAX } else { offset });
        let mut written: u32 = 0;
        unsafe {
            WriteFile(
                handle,
                Some(&data[..len]),
                Some(addr_of_mut!(written)),
                Some(addr_of_mut!(overlapped)),
            )
        }
        .map_err(error_from_windows)?;
        Ok(written as usize)
    }

    fn properties(handle: NativeHandle) -> OsResult<FileProperties> {
        let mut info = BY_HANDLE_FILE_INFORMATION::default();
        unsafe { GetFileInformationByHandle(handle, &mut info) }.map_err(error_from_windows)?;

        let mut flags = FilePropertyFlags::empty();
        if info.dwFileAttributes & FILE_ATTRIBUTE_DIRECTORY.0 != 0 {
            flags |= FilePropertyFlags::IS_FOLDER;
        }

        Ok(FileProperties {
            size: (u64::from(info.nFileSizeHigh) << 32) | u64::from(info.nFileSizeLow),
            modified: dense_time(info.ftLastWriteTime),
            created: dense_time(info.ftCreationTime),
            flags,
        })
    }

    fn dir_make(path: Str8<'_>) -> OsResult<bool> {
        let path = wide_path(path)?;
        let err = match unsafe { CreateDirectoryW(PCWSTR(path.as_ptr()), None) } {
            Ok(()) => return Ok(true),
            Err(err) => err,
        };
        if win32_code(&err) != ERROR_ALREADY_EXISTS.0 {
            return Err(error_from_windows(err));
        }

        let attributes = unsafe { GetFileAttributesW(PCWSTR(path.as_ptr())) };
        if attributes == INVALID_FILE_ATTRIBUTES {
            return Err(last_error());
        }
        if attributes & FILE_ATTRIBUTE_DIRECTORY.0 != 0 {
            Ok(false)
        } else {
            Err(OsError::AlreadyExists)
        }
    }
}

impl PlatformProcess for Platform {
    fn exit(code: i32) -> ! {
        unsafe { ExitProcess(code as u32) }
    }

    fn now_unix() -> u64 {
        let filetime = unsafe { GetSystemTimeAsFileTime() };
        let ticks =
            (u64::from(filetime.dwHighDateTime) << 32) | u64::from(filetime.dwLowDateTime);
        ((ticks / TICKS_PER_SECOND) as i64 - EPOCH_DIFFERENCE_SECONDS).max(0) as u64
    }

    fn sleep(duration: Duration) {
        // round up so a sub-millisecond remainder still sleeps
        let msec = duration.as_nanos().div_ceil(1_000_000);
        // u32::MAX is INFINITE
        let msec = msec.min(u128::from(u32::MAX - 1)) as u32;
        unsafe { Sleep(msec) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_mapping() {
        assert_eq!(error_from_code(ERROR_FILE_NOT_FOUND.0), OsError::NotFound);
        assert_eq!(error_from_code(ERROR_ACCESS_DENIED.0), OsError::PermissionDenied);
        assert_eq!(error_from_code(ERROR_ALREADY_EXISTS.0), OsError::AlreadyExists);
        assert_eq!(error_from_code(ERROR_INVALID_HANDLE.0), OsError::InvalidHandle);
        assert_eq!(error_from_code(ERROR_OUTOFMEMORY.0), OsError::OutOfMemory);
    }

    #[test]
    fn access_translation() {
        let access = desired_access(AccessFlags::READ | AccessFlags::WRITE);
        assert_eq!(access, GENERIC_READ.0 | GENERIC_WRITE.0);
        assert_eq!(share_mode(AccessFlags::READ), FILE_SHARE_MODE(0));
        assert_eq!(
            share_mode(AccessFlags::SHARE_READ | AccessFlags::SHARE_WRITE),
            FILE_SHARE_READ | FILE_SHARE_WRITE
        );
        assert_eq!(creation_disposition(AccessFlags::READ), OPEN_EXISTING);
        assert_eq!(creation_disposition(AccessFlags::WRITE), CREATE_ALWAYS);
        assert_eq!(
            creation_disposition(AccessFlags::WRITE | AccessFlags::APPEND),
            OPEN_ALWAYS
        );
    }

    #[test]
    fn filetime_epoch() {
        let ticks = EPOCH_DIFFERENCE_SECONDS as u64 * TICKS_PER_SECOND;
        let filetime = FILETIME {
            dwLowDateTime: ticks as u32,
            dwHighDateTime: (ticks >> 32) as u32,
        };
        assert_eq!(dense_time(filetime), DenseTime::from_unix(0, 0));
    }
}
