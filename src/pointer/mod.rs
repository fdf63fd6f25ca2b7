//! The memory accessor.
//!
//! A [`Pointer`] is a cursor over raw process memory. It either owns a zeroed
//! allocation it made itself or is a view of memory owned by someone else.
//! Construction, [`Pointer::seek`] and the metadata getters are safe; every
//! operation that touches the memory behind the cursor is an `unsafe fn`,
//! because nothing here knows how large that memory is.
//!
//! ```
//! use ffi_pointer::Pointer;
//!
//! let mut buf = Pointer::new(8).unwrap();
//! let mut reader = buf.seek(0);
//! unsafe {
//!     buf.put_uint32(7, true);
//!     buf.put_uint32(9, true);
//!     assert_eq!(reader.get_uint32(true), 7);
//!     assert_eq!(reader.get_uint32(true), 9);
//! }
//! ```
pub mod alloc;
pub mod raw;

use crate::error::PointerError;
use alloc::OwnedAllocation;
use std::fmt::{self, Debug, Formatter};

pub use raw::{Scalar, POINTER_WIDTH};

/// How far a CString operation moves the cursor when asked to advance.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CStringAdvance {
    /// `put_c_string` advances by the text length without the terminator and
    /// `get_c_string` advances by [`POINTER_WIDTH`], whatever the string length.
    Compatible,
    /// Both advance past the terminator of the string written or read.
    Terminated,
}

impl Default for CStringAdvance {
    fn default() -> Self {
        if cfg!(feature = "terminated-cstring-advance") {
            Self::Terminated
        } else {
            Self::Compatible
        }
    }
}

#[derive(Debug)]
enum Storage {
    Owned(OwnedAllocation),
    View,
}

pub struct Pointer {
    cursor: *mut u8,
    storage: Storage,
    cstring_advance: CStringAdvance,
}

impl Debug for Pointer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.storage {
            Storage::Owned(a) => write!(f, "Pointer({:p}, owns {} bytes)", self.cursor, a.size()),
            Storage::View => write!(f, "Pointer({:p})", self.cursor),
        }
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::null()
    }
}

macro_rules! typed_access {
    ($($put:ident / $get:ident : $t:ty),+ $(,)?) => {
        $(
            /// # Safety
            /// The cursor must be valid for a write of this kind's width.
            #[inline]
            pub unsafe fn $put(&mut self, value: impl Into<Option<$t>>, advance: bool) {
                self.put::<$t>(value, advance)
            }

            /// # Safety
            /// The cursor must be valid for a read of this kind's width.
            #[inline]
            pub unsafe fn $get(&mut self, advance: bool) -> $t {
                self.get::<$t>(advance)
            }
        )+
    };
}

impl Pointer {
    /// An address-less accessor.
    pub fn null() -> Self {
        Self::view(std::ptr::null_mut())
    }

    /// Allocates `size` zeroed bytes owned by the new accessor. A size of zero
    /// allocates nothing and yields an address-less accessor.
    pub fn new(size: usize) -> Result<Self, PointerError> {
        if size == 0 {
            return Ok(Self::null());
        }
        let allocation = OwnedAllocation::new(size)?;
        Ok(Self {
            cursor: allocation.base().as_ptr(),
            storage: Storage::Owned(allocation),
            cstring_advance: CStringAdvance::default(),
        })
    }

    /// A non-owning accessor over memory someone else manages.
    pub fn view(address: *mut u8) -> Self {
        Self {
            cursor: address,
            storage: Storage::View,
            cstring_advance: CStringAdvance::default(),
        }
    }

    pub fn address(&self) -> usize {
        self.cursor as usize
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.cursor
    }

    /// Size of the allocation this accessor owns, or 0 for a view.
    pub fn allocated(&self) -> usize {
        match &self.storage {
            Storage::Owned(a) => a.size(),
            Storage::View => 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.cursor.is_null()
    }

    pub fn cstring_advance(&self) -> CStringAdvance {
        self.cstring_advance
    }

    pub fn set_cstring_advance(&mut self, policy: CStringAdvance) {
        self.cstring_advance = policy;
    }

    /// A view `offset` bytes away from the cursor. `self` is left untouched.
    pub fn seek(&self, offset: isize) -> Pointer {
        self.derive(self.cursor.wrapping_offset(offset))
    }

    fn derive(&self, address: *mut u8) -> Pointer {
        let mut view = Pointer::view(address);
        view.cstring_advance = self.cstring_advance;
        view
    }

    fn advance(&mut self, bytes: usize) {
        self.cursor = self.cursor.wrapping_add(bytes);
    }

    /// Stores `value` at the cursor, if there is one, then moves the cursor
    /// past it when `advance` is set.
    ///
    /// # Safety
    /// When a value is given, the cursor must be valid for writes of `T::WIDTH` bytes.
    pub unsafe fn put<T: Scalar>(&mut self, value: impl Into<Option<T>>, advance: bool) {
        if let Some(value) = value.into() {
            value.store(self.cursor);
        }
        if advance {
            self.advance(T::WIDTH);
        }
    }

    /// # Safety
    /// The cursor must be valid for reads of `T::WIDTH` bytes.
    pub unsafe fn get<T: Scalar>(&mut self, advance: bool) -> T {
        let value = T::load(self.cursor);
        if advance {
            self.advance(T::WIDTH);
        }
        value
    }

    /// Stores a byte. Values above 255 are rejected before anything is written.
    ///
    /// # Safety
    /// When a value is given, the cursor must be valid for a one-byte write.
    pub unsafe fn put_uint8(
        &mut self,
        value: impl Into<Option<u32>>,
        advance: bool,
    ) -> Result<(), PointerError> {
        let value = value
            .into()
            .map(|v| {
                u8::try_from(v).map_err(|_| PointerError::Range {
                    kind: u8::NAME,
                    value: v as f64,
                })
            })
            .transpose()?;
        self.put::<u8>(value, advance);
        Ok(())
    }

    /// Stores a signed byte. Only -127..=127 is accepted; -128 is rejected
    /// along with everything outside the byte range.
    ///
    /// # Safety
    /// When a value is given, the cursor must be valid for a one-byte write.
    pub unsafe fn put_int8(
        &mut self,
        value: impl Into<Option<i32>>,
        advance: bool,
    ) -> Result<(), PointerError> {
        let value = match value.into() {
            Some(v) if (-(i8::MAX as i32)..=i8::MAX as i32).contains(&v) => Some(v as i8),
            Some(v) => {
                return Err(PointerError::Range {
                    kind: i8::NAME,
                    value: v as f64,
                })
            }
            None => None,
        };
        self.put::<i8>(value, advance);
        Ok(())
    }

    typed_access! {
        put_int16 / get_int16: i16,
        put_uint16 / get_uint16: u16,
        put_int32 / get_int32: i32,
        put_uint32 / get_uint32: u32,
        put_int64 / get_int64: i64,
        put_uint64 / get_uint64: u64,
        put_float / get_float32: f32,
        put_double / get_double: f64,
    }

    /// # Safety
    /// The cursor must be valid for a one-byte read.
    pub unsafe fn get_uint8(&mut self, advance: bool) -> u8 {
        self.get::<u8>(advance)
    }

    /// # Safety
    /// The cursor must be valid for a one-byte read.
    pub unsafe fn get_int8(&mut self, advance: bool) -> i8 {
        self.get::<i8>(advance)
    }

    /// Reads a 32-bit float, widened to `f64`.
    ///
    /// # Safety
    /// The cursor must be valid for a four-byte read.
    pub unsafe fn get_float(&mut self, advance: bool) -> f64 {
        self.get_float32(advance) as f64
    }

    /// Stores the address `target` currently points at.
    ///
    /// # Safety
    /// The cursor must be valid for a pointer-width write.
    pub unsafe fn put_address(&mut self, target: &Pointer, advance: bool) {
        self.put::<usize>(target.address(), advance);
    }

    /// Reads a stored address and returns a view of it.
    ///
    /// # Safety
    /// The cursor must be valid for a pointer-width read.
    pub unsafe fn get_pointer(&mut self, advance: bool) -> Pointer {
        let address = self.get::<usize>(advance);
        self.derive(address as *mut u8)
    }

    /// Copies `text` (up to any interior NUL) and a terminator to the cursor.
    /// The destination size is not checked.
    ///
    /// # Safety
    /// The cursor must be valid for writes of `text.len() + 1` bytes.
    pub unsafe fn put_c_string(&mut self, text: &str, advance: bool) {
        let written = raw::write_c_str(self.cursor, text.as_bytes());
        if advance {
            match self.cstring_advance {
                CStringAdvance::Compatible => self.advance(written),
                CStringAdvance::Terminated => self.advance(written + 1),
            }
        }
    }

    /// Reads a NUL-terminated string at the cursor, replacing invalid UTF-8.
    ///
    /// # Safety
    /// The cursor must point to a readable, NUL-terminated byte sequence.
    pub unsafe fn get_c_string(&mut self, advance: bool) -> String {
        let (text, len) = raw::read_c_str(self.cursor);
        if advance {
            match self.cstring_advance {
                CStringAdvance::Compatible => self.advance(POINTER_WIDTH),
                CStringAdvance::Terminated => self.advance(len + 1),
            }
        }
        text
    }
}
