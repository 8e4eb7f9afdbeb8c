use thiserror::Error;

/// Errors that may be returned from any OS layer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OsError {
    #[error("invalid handle")]
    InvalidHandle,
    #[error("permission denied")]
    PermissionDenied,
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("out of memory")]
    OutOfMemory,
    #[error("operation not supported on this platform")]
    Unsupported,
    /// The caller broke an argument contract (range outside a reservation,
    /// interior NUL in a path, buffer shorter than the requested range)
    #[error("invalid argument")]
    InvalidArgument,
    /// A native error code with no mapping to the kinds above
    #[error("os error {0}")]
    Os(i32),
}

pub type OsResult<T> = Result<T, OsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(OsError::NotFound.to_string(), "not found");
        assert_eq!(OsError::Os(1234).to_string(), "os error 1234");
    }
}
