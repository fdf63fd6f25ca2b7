//! Adapter between the accessor and a dynamically typed script host.
//!
//! Accessor objects live on a `gc_arena` heap as [`PointerRef`]s, so an
//! owning accessor releases its allocation when the host collects it. All
//! argument coercion and method lookup happens here; the accessor itself
//! never sees a [`HostValue`].
pub mod convert;

use crate::{
    error::PointerError,
    pointer::{Pointer, Scalar},
};
use convert::{check_byte, check_wide, to_int32, to_integer, to_uint32};
use gc_arena::{lock::RefLock, unsafe_empty_collect, Collect, Gc, Mutation};
use std::fmt::{self, Debug, Display, Formatter};

unsafe_empty_collect!(Pointer);

pub type PointerRef<'gc> = Gc<'gc, RefLock<Pointer>>;

pub type GCHandle<'gc> = &'gc Mutation<'gc>;

#[derive(Clone, Collect)]
#[collect(no_drop)]
pub enum HostValue<'gc> {
    Undefined,
    Boolean(bool),
    Number(f64),
    String(String),
    Pointer(PointerRef<'gc>),
}

impl<'gc> HostValue<'gc> {
    pub fn wrap(gc: GCHandle<'gc>, pointer: Pointer) -> Self {
        Self::Pointer(Gc::new(gc, RefLock::new(pointer)))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<PointerRef<'gc>> {
        match self {
            Self::Pointer(p) => Some(*p),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Pointer(_) => "Pointer",
        }
    }
}

impl Debug for HostValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Pointer(p) => write!(f, "[Pointer {:p}]", p.borrow().as_ptr()),
        }
    }
}

impl Display for HostValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

macro_rules! expect_arg {
    (let $variant:ident($inner:ident) = $args:ident[$idx:literal], $msg:literal) => {
        let $inner = match $args.get($idx) {
            Some(HostValue::$variant(v)) => v.clone(),
            _ => return Err(PointerError::Argument($msg.into())),
        };
    };
}

/// Put methods advance only for exactly `(value, true)`.
fn put_advance(args: &[HostValue<'_>]) -> bool {
    args.len() == 2 && matches!(args[1], HostValue::Boolean(true))
}

/// Get methods advance only for exactly `(true)`.
fn get_advance(args: &[HostValue<'_>]) -> bool {
    args.len() == 1 && matches!(args[0], HostValue::Boolean(true))
}

fn number_arg(args: &[HostValue<'_>]) -> Option<f64> {
    args.first().and_then(HostValue::as_number)
}

fn ensure_addressable(pointer: &Pointer, operation: &'static str) -> Result<(), PointerError> {
    if pointer.is_null() {
        tracing::warn!("rejected {} through a null Pointer", operation);
        return Err(PointerError::NullDereference { operation });
    }
    Ok(())
}

/// `new Pointer(size?)`. Exactly one numeric argument allocates; anything else
/// produces an address-less accessor.
pub fn construct<'gc>(
    gc: GCHandle<'gc>,
    args: &[HostValue<'gc>],
) -> Result<HostValue<'gc>, PointerError> {
    let pointer = match args {
        [HostValue::Number(n)] => Pointer::new(to_uint32(*n) as usize)?,
        _ => Pointer::null(),
    };
    Ok(HostValue::wrap(gc, pointer))
}

pub fn get_property<'gc>(
    this: PointerRef<'gc>,
    name: &str,
) -> Result<HostValue<'gc>, PointerError> {
    let pointer = this.borrow();
    match name {
        "address" => Ok(HostValue::Number(pointer.address() as f64)),
        "allocated" => Ok(HostValue::Number(pointer.allocated() as f64)),
        _ => Err(PointerError::Argument(format!(
            "Pointer has no property named {name}"
        ))),
    }
}

fn put_scalar<'gc, T: Scalar>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    args: &[HostValue<'gc>],
    coerce: impl FnOnce(f64) -> Result<T, PointerError>,
) -> Result<HostValue<'gc>, PointerError> {
    let value = number_arg(args).map(coerce).transpose()?;
    let mut pointer = this.borrow_mut(gc);
    if value.is_some() {
        ensure_addressable(&pointer, "write")?;
    }
    // SAFETY: the host vouches for the extent of the memory behind the cursor.
    unsafe { pointer.put::<T>(value, put_advance(args)) };
    Ok(HostValue::Undefined)
}

fn get_scalar<'gc, T: Scalar>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    args: &[HostValue<'gc>],
    lift: impl FnOnce(T) -> f64,
) -> Result<HostValue<'gc>, PointerError> {
    let mut pointer = this.borrow_mut(gc);
    ensure_addressable(&pointer, "read")?;
    // SAFETY: the host vouches for the extent of the memory behind the cursor.
    let value = unsafe { pointer.get::<T>(get_advance(args)) };
    Ok(HostValue::Number(lift(value)))
}

fn put_byte<'gc>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    args: &[HostValue<'gc>],
    signed: bool,
) -> Result<HostValue<'gc>, PointerError> {
    let (kind, min, max) = if signed {
        ("Int8", -(i8::MAX as f64), i8::MAX as f64)
    } else {
        ("UInt8", 0.0, u8::MAX as f64)
    };
    let value = number_arg(args)
        .map(|n| check_byte(kind, n, min, max))
        .transpose()?;
    let advance = put_advance(args);
    let mut pointer = this.borrow_mut(gc);
    if value.is_some() {
        ensure_addressable(&pointer, "write")?;
    }
    // SAFETY: the host vouches for the extent of the memory behind the cursor.
    unsafe {
        if signed {
            pointer.put_int8(value.map(to_int32), advance)?;
        } else {
            pointer.put_uint8(value.map(to_uint32), advance)?;
        }
    }
    Ok(HostValue::Undefined)
}

fn seek<'gc>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    args: &[HostValue<'gc>],
) -> Result<HostValue<'gc>, PointerError> {
    expect_arg!(let Number(offset) = args[0], "Must specify an offset");
    let derived = this.borrow().seek(to_integer(offset) as isize);
    Ok(HostValue::wrap(gc, derived))
}

fn put_pointer<'gc>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    args: &[HostValue<'gc>],
) -> Result<HostValue<'gc>, PointerError> {
    if args.is_empty() {
        return Ok(HostValue::Undefined);
    }
    expect_arg!(let Pointer(target) = args[0], "Expected a Pointer to store");
    // Read the target first: it may be `this` itself.
    let target = Pointer::view(target.borrow().as_ptr());
    let mut pointer = this.borrow_mut(gc);
    ensure_addressable(&pointer, "write")?;
    // SAFETY: the host vouches for the extent of the memory behind the cursor.
    unsafe { pointer.put_address(&target, put_advance(args)) };
    Ok(HostValue::Undefined)
}

fn get_pointer<'gc>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    args: &[HostValue<'gc>],
) -> Result<HostValue<'gc>, PointerError> {
    let derived = {
        let mut pointer = this.borrow_mut(gc);
        ensure_addressable(&pointer, "read")?;
        // SAFETY: the host vouches for the extent of the memory behind the cursor.
        unsafe { pointer.get_pointer(get_advance(args)) }
    };
    Ok(HostValue::wrap(gc, derived))
}

fn put_c_string<'gc>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    args: &[HostValue<'gc>],
) -> Result<HostValue<'gc>, PointerError> {
    let Some(HostValue::String(text)) = args.first() else {
        return Ok(HostValue::Undefined);
    };
    let mut pointer = this.borrow_mut(gc);
    ensure_addressable(&pointer, "write")?;
    // SAFETY: the host vouches that the destination holds the text and its terminator.
    unsafe { pointer.put_c_string(text, put_advance(args)) };
    Ok(HostValue::Undefined)
}

fn get_c_string<'gc>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    args: &[HostValue<'gc>],
) -> Result<HostValue<'gc>, PointerError> {
    let mut pointer = this.borrow_mut(gc);
    ensure_addressable(&pointer, "read")?;
    // SAFETY: the host vouches that a terminated string sits at the cursor.
    let text = unsafe { pointer.get_c_string(get_advance(args)) };
    Ok(HostValue::String(text))
}

/// Invokes a method on an accessor object.
pub fn call_method<'gc>(
    gc: GCHandle<'gc>,
    this: PointerRef<'gc>,
    name: &str,
    args: &[HostValue<'gc>],
) -> Result<HostValue<'gc>, PointerError> {
    tracing::trace!("{:?}.{}({:?})", this.borrow(), name, args);

    match name {
        "seek" => seek(gc, this, args),
        "isNull" => Ok(HostValue::Boolean(this.borrow().is_null())),

        "putUInt8" => put_byte(gc, this, args, false),
        "getUInt8" => get_scalar::<u8>(gc, this, args, f64::from),
        "putInt8" => put_byte(gc, this, args, true),
        "getInt8" => get_scalar::<i8>(gc, this, args, f64::from),

        "putInt16" => put_scalar::<i16>(gc, this, args, |n| {
            check_wide("Int16", n, i16::MIN as f64, i16::MAX as f64).map(|n| to_int32(n) as i16)
        }),
        "getInt16" => get_scalar::<i16>(gc, this, args, f64::from),
        "putUInt16" => put_scalar::<u16>(gc, this, args, |n| {
            check_wide("UInt16", n, 0.0, u16::MAX as f64).map(|n| to_uint32(n) as u16)
        }),
        "getUInt16" => get_scalar::<u16>(gc, this, args, f64::from),
        "putInt32" => put_scalar::<i32>(gc, this, args, |n| {
            check_wide("Int32", n, i32::MIN as f64, i32::MAX as f64).map(to_int32)
        }),
        "getInt32" => get_scalar::<i32>(gc, this, args, f64::from),
        "putUInt32" => put_scalar::<u32>(gc, this, args, |n| {
            check_wide("UInt32", n, 0.0, u32::MAX as f64).map(to_uint32)
        }),
        "getUInt32" => get_scalar::<u32>(gc, this, args, f64::from),
        "putInt64" => put_scalar::<i64>(gc, this, args, |n| {
            check_wide("Int64", n, i64::MIN as f64, i64::MAX as f64).map(to_integer)
        }),
        "getInt64" => get_scalar::<i64>(gc, this, args, |v| v as f64),
        "putUInt64" => put_scalar::<u64>(gc, this, args, |n| {
            check_wide("UInt64", n, 0.0, u64::MAX as f64).map(|n| to_integer(n) as u64)
        }),
        "getUInt64" => get_scalar::<u64>(gc, this, args, |v| v as f64),

        "putFloat" => put_scalar::<f32>(gc, this, args, |n| Ok(n as f32)),
        "getFloat" => get_scalar::<f32>(gc, this, args, f64::from),
        "putDouble" => put_scalar::<f64>(gc, this, args, Ok),
        "getDouble" => get_scalar::<f64>(gc, this, args, |v| v),

        "_putPointer" => put_pointer(gc, this, args),
        "getPointer" => get_pointer(gc, this, args),
        "putCString" => put_c_string(gc, this, args),
        "getCString" => get_c_string(gc, this, args),

        _ => Err(PointerError::Argument(format!(
            "Pointer has no method named {name}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc_arena::{Arena, Rootable};

    type TestArena = Arena<Rootable![()]>;

    fn num<'gc>(n: f64) -> HostValue<'gc> {
        HostValue::Number(n)
    }

    fn pointer_of<'gc>(result: Result<HostValue<'gc>, PointerError>) -> PointerRef<'gc> {
        result.unwrap().as_pointer().unwrap()
    }

    #[test]
    fn test_construct_shapes() {
        let arena = TestArena::new(|_| ());
        arena.mutate(|gc, _| {
            let owned = pointer_of(construct(gc, &[num(5.0)]));
            assert_eq!(owned.borrow().allocated(), 5);

            let empty = pointer_of(construct(gc, &[]));
            assert!(empty.borrow().is_null());

            let ignored = pointer_of(construct(gc, &[num(5.0), num(6.0)]));
            assert_eq!(ignored.borrow().allocated(), 0);

            let not_a_size = pointer_of(construct(gc, &[HostValue::String("5".into())]));
            assert!(not_a_size.borrow().is_null());
        });
    }

    #[test]
    fn test_advance_requires_exact_arity() {
        let arena = TestArena::new(|_| ());
        arena.mutate(|gc, _| {
            let p = pointer_of(construct(gc, &[num(16.0)]));
            let start = p.borrow().address();

            let args = [num(1.0), HostValue::Boolean(true), num(0.0)];
            call_method(gc, p, "putUInt16", &args).unwrap();
            assert_eq!(p.borrow().address(), start);

            let args = [num(1.0), HostValue::Boolean(true)];
            call_method(gc, p, "putUInt16", &args).unwrap();
            assert_eq!(p.borrow().address(), start + 2);

            let args = [HostValue::Boolean(true), num(0.0)];
            call_method(gc, p, "getUInt16", &args).unwrap();
            assert_eq!(p.borrow().address(), start + 2);

            call_method(gc, p, "getUInt16", &[HostValue::Boolean(true)]).unwrap();
            assert_eq!(p.borrow().address(), start + 4);
        });
    }

    #[test]
    fn test_non_numeric_value_skips_write_but_advances() {
        let arena = TestArena::new(|_| ());
        arena.mutate(|gc, _| {
            let p = pointer_of(construct(gc, &[num(8.0)]));
            let start = p.borrow().address();
            let args = [HostValue::String("9".into()), HostValue::Boolean(true)];
            call_method(gc, p, "putInt32", &args).unwrap();
            assert_eq!(p.borrow().address(), start + 4);

            let back = pointer_of(call_method(gc, p, "seek", &[num(-4.0)]));
            let value = call_method(gc, back, "getInt32", &[]).unwrap();
            assert_eq!(value.as_number(), Some(0.0));
        });
    }

    #[test]
    fn test_byte_range_is_checked_before_wrapping() {
        let arena = TestArena::new(|_| ());
        arena.mutate(|gc, _| {
            let p = pointer_of(construct(gc, &[num(1.0)]));
            call_method(gc, p, "putUInt8", &[num(7.0)]).unwrap();

            assert_eq!(
                call_method(gc, p, "putUInt8", &[num(256.0)]).unwrap_err(),
                PointerError::Range {
                    kind: "UInt8",
                    value: 256.0
                }
            );
            assert!(call_method(gc, p, "putInt8", &[num(-129.0)]).is_err());

            let value = call_method(gc, p, "getUInt8", &[]).unwrap();
            assert_eq!(value.as_number(), Some(7.0));
        });
    }

    #[test]
    fn test_unknown_members_are_argument_errors() {
        let arena = TestArena::new(|_| ());
        arena.mutate(|gc, _| {
            let p = pointer_of(construct(gc, &[num(1.0)]));
            assert!(matches!(
                call_method(gc, p, "free", &[]),
                Err(PointerError::Argument(_))
            ));
            assert!(matches!(
                get_property(p, "length"),
                Err(PointerError::Argument(_))
            ));
        });
    }

    #[test]
    fn test_null_access_is_reported() {
        let arena = TestArena::new(|_| ());
        arena.mutate(|gc, _| {
            let p = pointer_of(construct(gc, &[]));
            assert_eq!(
                call_method(gc, p, "getUInt8", &[]).unwrap_err(),
                PointerError::NullDereference { operation: "read" }
            );
            let text = [HostValue::String("x".into())];
            assert_eq!(
                call_method(gc, p, "putCString", &text).unwrap_err(),
                PointerError::NullDereference { operation: "write" }
            );
            // advancing without writing never touches memory
            let args = [HostValue::Undefined, HostValue::Boolean(true)];
            call_method(gc, p, "putUInt32", &args).unwrap();
            assert_eq!(p.borrow().address(), 4);
        });
    }

    #[test]
    fn test_put_pointer_into_itself() {
        let arena = TestArena::new(|_| ());
        arena.mutate(|gc, _| {
            let p = pointer_of(construct(gc, &[num(8.0)]));
            call_method(gc, p, "_putPointer", &[HostValue::Pointer(p)]).unwrap();
            let read = pointer_of(call_method(gc, p, "getPointer", &[]));
            assert_eq!(read.borrow().address(), p.borrow().address());
            assert_eq!(read.borrow().allocated(), 0);
        });
    }
}
