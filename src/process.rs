use crate::platform::{Platform, PlatformProcess};

/// Terminates the process with `code`.
///
/// Nothing is flushed or closed on the caller's behalf: buffered output and
/// open [`File`](crate::file::File)s that still need their contents on disk
/// must be dealt with before calling this. Destructors of live values do not
/// run.
pub fn exit(code: i32) -> ! {
    Platform::exit(code)
}
