use std::mem::{align_of, size_of, MaybeUninit};

use static_assertions::const_assert_eq;

/// Amount of inline storage, in bytes, available to a callable held by a [`Function`].
///
/// x86: 4b, x64: 8b - exactly one pointer.
///
/// [`Function`]: struct.Function.html
pub const INLINE_CAPACITY: usize = size_of::<*mut ()>();

/// Alignment of the inline storage.
pub const INLINE_ALIGN: usize = align_of::<*mut ()>();

/// Returns `true` if values of type `T` are stored inline (without allocation).
///
/// The type must fit into one pointer and its alignment must divide the pointer alignment.
/// Zero-sized types (non-capturing closures, function items) always fit.
pub const fn is_small<T>() -> bool {
    size_of::<T>() <= INLINE_CAPACITY && INLINE_ALIGN % align_of::<T>() == 0
}

/// Raw one-pointer buffer.
///
/// Holds either a small callable (written in place)
/// or the pointer to a heap-allocated large callable.
/// Which one is encoded in the operation table paired with the buffer.
#[repr(transparent)]
pub(crate) struct InlineBuffer {
    bytes: MaybeUninit<*mut ()>,
}

const_assert_eq!(size_of::<InlineBuffer>(), INLINE_CAPACITY);
const_assert_eq!(align_of::<InlineBuffer>(), INLINE_ALIGN);

impl InlineBuffer {
    /// Creates a buffer without initializing anything in it.
    pub(crate) const fn uninit() -> Self {
        InlineBuffer {
            bytes: MaybeUninit::uninit(),
        }
    }

    /// Returns a pointer to the potentially uninitialized value of type `T`.
    ///
    /// `T` must fit (see [`is_small`]).
    pub(crate) fn as_ptr<T>(&self) -> *const T {
        // Can't be a const assert: it is evaluated in branches that are never taken.
        debug_assert!(is_small::<T>());
        self.bytes.as_ptr().cast()
    }

    /// Mutable counterpart of [`as_ptr`](#method.as_ptr).
    pub(crate) fn as_mut_ptr<T>(&mut self) -> *mut T {
        debug_assert!(is_small::<T>());
        self.bytes.as_mut_ptr().cast()
    }

    /// Writes `value` into the buffer, overwriting (without dropping) whatever was there.
    pub(crate) fn write<T>(&mut self, value: T) {
        assert!(is_small::<T>(), "value does not fit into the inline buffer");

        // SAFETY: size and alignment are checked above; the buffer is exclusively borrowed.
        unsafe { self.as_mut_ptr::<T>().write(value) }
    }

    /// Returns the address of the `T` held by the buffer at `this`,
    /// following the heap pointer if `T` is too large to be stored inline.
    ///
    /// # Safety
    ///
    /// The buffer must currently hold a `T` (inline or boxed, per [`is_small`]).
    /// Mutating through the result requires `this` to be derived from a unique borrow.
    pub(crate) unsafe fn locate<T>(this: *mut Self) -> *mut T {
        if is_small::<T>() {
            this.cast()
        } else {
            unsafe { this.cast::<*mut T>().read() }
        }
    }

    /// Stores a heap pointer to a large value.
    pub(crate) fn write_heap<T>(&mut self, ptr: *mut T) {
        self.write::<*mut T>(ptr);
    }

    /// Reads the heap pointer stored by [`write_heap`](#method.write_heap).
    ///
    /// # Safety
    ///
    /// The buffer must currently hold a `*mut T` written by [`write_heap`](#method.write_heap).
    pub(crate) unsafe fn read_heap<T>(&self) -> *mut T {
        unsafe { self.as_ptr::<*mut T>().read() }
    }
}
