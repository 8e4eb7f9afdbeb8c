//! Virtual memory: reserve address space up front, back it with physical
//! pages only where needed.

use core::{
    ops::{Deref, DerefMut},
    ptr::NonNull,
    slice,
};

use tracing::{debug, trace, warn};

use crate::{
    errors::{OsError, OsResult},
    platform::{Platform, PlatformMemory},
};

pub fn page_size() -> usize {
    Platform::get_page_size()
}

/// Rounds `size` up to a whole number of pages. `page` must be a power of two.
fn round_up(size: usize, page: usize) -> Option<usize> {
    size.checked_add(page - 1).map(|size| size & !(page - 1))
}

/// A reservation of contiguous address space.
///
/// Pages start out reserved but not committed; touching them before
/// [`Region::commit`] faults. The whole reservation is released when the
/// region is dropped.
#[derive(Debug)]
pub struct Region {
    base: NonNull<u8>,
    size: usize,
}

unsafe impl Send for Region {}

impl Region {
    /// Reserves at least `size` bytes, rounded up to the page size
    pub fn reserve(size: usize) -> OsResult<Region> {
        if size == 0 {
            return Err(OsError::InvalidArgument);
        }
        let size = round_up(size, page_size()).ok_or(OsError::OutOfMemory)?;
        let base = unsafe { Platform::reserve(size) }.map_err(|err| {
            debug!(size, %err, "failed to reserve address space");
            err
        })?;
        debug!(size, base = ?base, "reserved address space");
        Ok(Region { base, size })
    }

    pub fn base(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    /// Reserved size in bytes, always a multiple of the page size
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether `[offset, offset + size)` lies inside the reservation
    pub fn contains(&self, offset: usize, size: usize) -> bool {
        offset
            .checked_add(size)
            .map_or(false, |end| end <= self.size)
    }

    /// The whole pages covering `[offset, offset + size)`, as (start, len)
    fn page_span(&self, offset: usize, size: usize) -> (usize, usize) {
        let page = page_size();
        let start = offset & !(page - 1);
        // the reservation is page aligned, so this never passes its end
        let end = round_up(offset + size, page).unwrap_or(self.size).min(self.size);
        (start, end - start)
    }

    /// Backs `[offset, offset + size)` with zeroed, readable and writable
    /// memory. The range is widened to whole pages. Committing pages that are
    /// already committed leaves their contents alone.
    pub fn commit(&self, offset: usize, size: usize) -> OsResult<()> {
        if !self.contains(offset, size) {
            debug!(offset, size, reserved = self.size, "commit outside reservation");
            return Err(OsError::InvalidArgument);
        }
        if size == 0 {
            return Ok(());
        }

        let (start, len) = self.page_span(offset, size);
        unsafe { Platform::commit(self.base().add(start), len) }?;
        trace!(start, len, "committed pages");
        Ok(())
    }

    /// Drops the physical backing of the pages covering
    /// `[offset, offset + size)`, keeping the address space reserved.
    /// Decommitting pages that are not committed does nothing.
    pub fn decommit(&self, offset: usize, size: usize) {
        if !self.contains(offset, size) {
            warn!(offset, size, reserved = self.size, "decommit outside reservation ignored");
            return;
        }
        if size == 0 {
            return;
        }

        let (start, len) = self.page_span(offset, size);
        match unsafe { Platform::decommit(self.base().add(start), len) } {
            Ok(()) => trace!(start, len, "decommitted pages"),
            Err(err) => warn!(start, len, %err, "failed to decommit pages"),
        }
    }

    /// Releases the reservation. Same as dropping it.
    pub fn free(self) {
        drop(self)
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        match unsafe { Platform::release(self.base(), self.size) } {
            Ok(()) => debug!(size = self.size, "released address space"),
            Err(err) => warn!(size = self.size, %err, "failed to release address space"),
        }
    }
}

/// Zeroed, committed memory of a fixed length.
#[derive(Debug)]
pub struct Allocation {
    region: Region,
    len: usize,
}

unsafe impl Send for Allocation {}
unsafe impl Sync for Allocation {}

impl Allocation {
    pub fn new(size: usize) -> OsResult<Allocation> {
        let region = Region::reserve(size)?;
        region.commit(0, size)?;
        Ok(Allocation { region, len: size })
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.region.base()
    }

    /// Bytes reserved behind the allocation (the length rounded up to pages)
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Releases the memory. Same as dropping it.
    pub fn free(self) {
        drop(self)
    }
}

impl Deref for Allocation {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.region.base(), self.len) }
    }
}

impl DerefMut for Allocation {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.region.base(), self.len) }
    }
}

/// Reserves address space without committing it
pub fn reserve(size: usize) -> OsResult<Region> {
    Region::reserve(size)
}

/// Reserves and commits `size` zeroed bytes
pub fn alloc(size: usize) -> OsResult<Allocation> {
    Allocation::new(size)
}
