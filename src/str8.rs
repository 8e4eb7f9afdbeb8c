use core::{fmt, ops::Range};
use std::ffi::{c_char, CStr};

use crate::errors::{OsError, OsResult};

/// A non-owning view of bytes with an explicit length.
///
/// The bytes are never assumed to be NUL terminated. Two spans are equal when
/// they have the same length and the same bytes, regardless of where the bytes
/// live.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Str8<'a> {
    bytes: &'a [u8],
}

impl<'a> Str8<'a> {
    pub const fn new(bytes: &'a [u8]) -> Str8<'a> {
        Str8 { bytes }
    }

    /// Span over a string literal
    pub const fn lit(s: &'a str) -> Str8<'a> {
        Str8 {
            bytes: s.as_bytes(),
        }
    }

    /// Span over the bytes of `cstr`, terminator excluded
    pub fn from_cstr(cstr: &'a CStr) -> Str8<'a> {
        Str8 {
            bytes: cstr.to_bytes(),
        }
    }

    /// Builds a span by scanning a terminated native string for its length.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null, point to a NUL terminated string, and that
    /// string must stay alive and unmodified for `'a`.
    pub unsafe fn from_cstr_ptr(ptr: *const c_char) -> Str8<'a> {
        Str8::from_cstr(CStr::from_ptr(ptr))
    }

    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn to_str(&self) -> OsResult<&'a str> {
        core::str::from_utf8(self.bytes).map_err(|_| OsError::InvalidArgument)
    }

    /// First `count` bytes
    pub fn prefix(&self, count: usize) -> Str8<'a> {
        let count = count.min(self.len());
        Str8::new(&self.bytes[..count])
    }

    /// Last `count` bytes
    pub fn postfix(&self, count: usize) -> Str8<'a> {
        let count = count.min(self.len());
        Str8::new(&self.bytes[self.len() - count..])
    }

    /// Everything after the first `count` bytes
    pub fn skip(&self, count: usize) -> Str8<'a> {
        let count = count.min(self.len());
        Str8::new(&self.bytes[count..])
    }

    /// Everything before the last `count` bytes
    pub fn chop(&self, count: usize) -> Str8<'a> {
        let count = count.min(self.len());
        Str8::new(&self.bytes[..self.len() - count])
    }

    /// Bytes in `range`, clamped to the span
    pub fn substr(&self, range: Range<usize>) -> Str8<'a> {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Str8::new(&self.bytes[start..end])
    }

    pub fn starts_with(&self, other: Str8<'_>) -> bool {
        self.bytes.starts_with(other.bytes)
    }

    pub fn ends_with(&self, other: Str8<'_>) -> bool {
        self.bytes.ends_with(other.bytes)
    }

    /// Offset of the first occurrence of `needle`. An empty needle matches at 0.
    pub fn find(&self, needle: Str8<'_>) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        self.bytes
            .windows(needle.len())
            .position(|window| window == needle.bytes)
    }
}

impl<'a> From<&'a str> for Str8<'a> {
    fn from(s: &'a str) -> Self {
        Str8::lit(s)
    }
}

impl<'a> From<&'a [u8]> for Str8<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Str8::new(bytes)
    }
}

impl<'a> From<&'a CStr> for Str8<'a> {
    fn from(cstr: &'a CStr) -> Self {
        Str8::from_cstr(cstr)
    }
}

impl fmt::Display for Str8<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.bytes))
    }
}

impl fmt::Debug for Str8<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.bytes))
    }
}
