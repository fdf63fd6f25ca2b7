//! Unchecked loads and stores against raw addresses.
//!
//! Everything in here trusts the caller about the extent of the memory behind
//! an address. No alignment is assumed: all accesses go through byte copies,
//! so scalars may sit at any offset.
use std::{ffi::CStr, mem::size_of, ptr};

/// A fixed-width value that can be copied in and out of raw memory in native
/// byte order.
pub trait Scalar: Copy {
    const WIDTH: usize;
    const NAME: &'static str;

    /// # Safety
    /// `src` must be valid for reads of `Self::WIDTH` bytes.
    unsafe fn load(src: *const u8) -> Self;

    /// # Safety
    /// `dst` must be valid for writes of `Self::WIDTH` bytes.
    unsafe fn store(self, dst: *mut u8);
}

macro_rules! impl_scalar {
    ($($t:ty => $name:literal),+ $(,)?) => {
        $(
            impl Scalar for $t {
                const WIDTH: usize = size_of::<$t>();
                const NAME: &'static str = $name;

                #[inline]
                unsafe fn load(src: *const u8) -> Self {
                    let mut bytes = [0u8; size_of::<$t>()];
                    ptr::copy_nonoverlapping(src, bytes.as_mut_ptr(), bytes.len());
                    <$t>::from_ne_bytes(bytes)
                }

                #[inline]
                unsafe fn store(self, dst: *mut u8) {
                    let bytes = self.to_ne_bytes();
                    ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
                }
            }
        )+
    };
}

impl_scalar! {
    u8 => "UInt8",
    i8 => "Int8",
    u16 => "UInt16",
    i16 => "Int16",
    u32 => "UInt32",
    i32 => "Int32",
    u64 => "UInt64",
    i64 => "Int64",
    f32 => "Float",
    f64 => "Double",
    usize => "Pointer",
}

/// Width of a stored address.
pub const POINTER_WIDTH: usize = size_of::<*mut u8>();

/// # Safety
/// `src` must point to a readable, NUL-terminated byte sequence.
pub unsafe fn read_c_str(src: *const u8) -> (String, usize) {
    let c_str = CStr::from_ptr(src.cast());
    let len = c_str.to_bytes().len();
    (c_str.to_string_lossy().into_owned(), len)
}

/// Copies `text` up to its first NUL byte, then a terminator. Returns the
/// number of bytes copied, not counting the terminator.
///
/// # Safety
/// `dst` must be valid for writes of the returned length plus one.
pub unsafe fn write_c_str(dst: *mut u8, text: &[u8]) -> usize {
    let len = text.iter().position(|&b| b == 0).unwrap_or(text.len());
    ptr::copy_nonoverlapping(text.as_ptr(), dst, len);
    *dst.add(len) = 0;
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unaligned_store_and_load() {
        let mut buf = [0u8; 16];
        unsafe {
            let at = buf.as_mut_ptr().add(3);
            0x1122_3344_u32.store(at);
            assert_eq!(u32::load(at), 0x1122_3344);
        }
        assert_eq!(&buf[3..7], &0x1122_3344_u32.to_ne_bytes());
    }

    #[test]
    fn test_widths() {
        assert_eq!(<u8 as Scalar>::WIDTH, 1);
        assert_eq!(<i16 as Scalar>::WIDTH, 2);
        assert_eq!(<f32 as Scalar>::WIDTH, 4);
        assert_eq!(<u64 as Scalar>::WIDTH, 8);
        assert_eq!(<usize as Scalar>::WIDTH, POINTER_WIDTH);
    }

    #[test]
    fn test_c_str_stops_at_interior_nul() {
        let mut buf = [0xffu8; 8];
        let written = unsafe { write_c_str(buf.as_mut_ptr(), b"ab\0cd") };
        assert_eq!(written, 2);
        assert_eq!(&buf[..4], b"ab\0\xff");

        let (text, len) = unsafe { read_c_str(buf.as_ptr()) };
        assert_eq!(text, "ab");
        assert_eq!(len, 2);
    }
}
