//! A small OS layer: the same memory, file, process and time primitives on
//! Windows, Linux and macOS.
//!
//! Every call is synchronous. Nothing here locks; sharing one [`file::File`]
//! or [`memory::Region`] between threads needs the caller's own
//! synchronization.

pub mod context;
pub mod errors;
pub mod file;
pub mod memory;
pub mod platform;
pub mod process;
pub mod str8;
pub mod time;

#[cfg(test)]
#[path = "../build/target.rs"]
mod build_target;

pub use errors::{OsError, OsResult};
pub use file::{dir_make, AccessFlags, File, FileProperties};
pub use memory::{alloc, reserve, Allocation, Region};
pub use str8::Str8;
pub use time::{DateTime, DenseTime};
