//! Memory shared across `fork`.

use std::mem::size_of;
use std::ptr::{self, NonNull};
use std::slice;

use crate::error::{MatmulError, Result};

/// A flat buffer of `i32` cells in an anonymous `MAP_SHARED` mapping.
///
/// Children forked while the region is alive write into the same physical
/// pages the parent reads. The mapping is created zero-filled and unmapped
/// on drop, so its lifetime is exactly the scope that owns it.
#[derive(Debug)]
pub struct SharedRegion {
    ptr: NonNull<i32>,
    len: usize,
}

impl SharedRegion {
    /// Map `len` zeroed cells.
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(MatmulError::InvalidArgument(
                "shared region must hold at least one cell".to_string(),
            ));
        }
        let bytes = len
            .checked_mul(size_of::<i32>())
            .ok_or(MatmulError::Allocation { bytes: usize::MAX })?;

        // SAFETY: an anonymous mapping with no address hint touches no
        // existing memory.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                bytes,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            log::error!(
                "mmap of {} bytes failed: {}",
                bytes,
                std::io::Error::last_os_error()
            );
            return Err(MatmulError::Allocation { bytes });
        }
        let ptr = NonNull::new(addr.cast::<i32>()).ok_or(MatmulError::Allocation { bytes })?;

        Ok(Self { ptr, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[i32] {
        // SAFETY: the mapping is `len` cells long, page-aligned and lives
        // until drop.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        // SAFETY: as above, and `&mut self` makes this the only live view in
        // this process.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        // SAFETY: `ptr` and the byte length came from a successful mmap.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), self.len * size_of::<i32>());
        }
    }
}
