use crate::error::PointerError;
use std::{
    alloc::{alloc_zeroed, dealloc, Layout},
    ptr::NonNull,
};

/// Zeroed heap memory owned by exactly one accessor. Released on drop.
#[derive(Debug)]
pub struct OwnedAllocation {
    base: NonNull<u8>,
    layout: Layout,
}

impl OwnedAllocation {
    /// Alignment generous enough for any scalar the accessor reads.
    const ALIGN: usize = 16;

    pub fn new(size: usize) -> Result<Self, PointerError> {
        debug_assert!(size > 0, "zero-sized allocations are address-less accessors");
        let layout = Layout::from_size_align(size, Self::ALIGN)
            .map_err(|_| PointerError::Allocation { size })?;

        // SAFETY: layout has a nonzero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        let base = NonNull::new(ptr).ok_or(PointerError::Allocation { size })?;
        tracing::debug!("allocated {} bytes at {:p}", size, base);
        Ok(Self { base, layout })
    }

    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for OwnedAllocation {
    fn drop(&mut self) {
        tracing::debug!("releasing {} bytes at {:p}", self.layout.size(), self.base);
        // SAFETY: base came from alloc_zeroed with this exact layout and is released only here.
        unsafe { dealloc(self.base.as_ptr(), self.layout) };
    }
}
