//! Raw byte storage that an [`AlignedArray`](crate::AlignedArray) can
//! be laid over.

/// A contiguous, exclusively owned byte region with a stable address.
///
/// # Safety
///
/// Implementors must guarantee that `as_mut_ptr` returns a pointer valid
/// for reads and writes of `len()` bytes, and that the address does not
/// change while the storage is alive, even if the storage value itself
/// is moved.
pub unsafe trait RawStorage: Send {
    /// Base address of the region.
    fn as_mut_ptr(&mut self) -> *mut u8;

    /// Length of the region in bytes.
    fn len(&self) -> usize;

    /// Whether the region holds zero bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// SAFETY: a Vec's heap buffer does not move when the Vec is moved, and
// nothing here can reallocate it.
unsafe impl RawStorage for Vec<u8> {
    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.as_mut_slice().as_mut_ptr()
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

// SAFETY: boxed slices have a fixed heap address for their lifetime.
unsafe impl RawStorage for Box<[u8]> {
    fn as_mut_ptr(&mut self) -> *mut u8 {
        <[u8]>::as_mut_ptr(self)
    }

    fn len(&self) -> usize {
        <[u8]>::len(self)
    }
}
