use std::{
    alloc::{self, Layout},
    any::{type_name, TypeId},
    mem,
    ptr::NonNull,
};

use tracing::{debug, trace};

use crate::{
    buffer::{is_small, InlineBuffer},
    callable::Callable,
    error::{AllocError, Error},
    vtable::{LargeOps, SmallOps, VTable},
};

/// Moves `value` into a fresh heap block allocated with the layout of `T`.
///
/// Blocks are released through `Box::from_raw`, which matches the global allocator and layout.
fn allocate<T>(value: T) -> Result<NonNull<T>, AllocError> {
    let layout = Layout::new::<T>();

    if layout.size() == 0 {
        // Over-aligned zero-sized types are "large" but need no memory.
        return Ok(NonNull::from(Box::leak(Box::new(value))));
    }

    // Safety: the layout has non-zero size.
    let Some(ptr) = NonNull::new(unsafe { alloc::alloc(layout) }.cast::<T>()) else {
        debug!(
            size = layout.size(),
            align = layout.align(),
            "failed to allocate storage for an out-of-line callable"
        );
        return Err(AllocError { layout });
    };

    // Safety: freshly allocated for a `T`.
    unsafe { ptr.as_ptr().write(value) };

    trace!(
        size = layout.size(),
        callable = type_name::<T>(),
        "allocated out-of-line callable"
    );

    Ok(ptr)
}

/// Inline buffer paired with the operation table which knows what the buffer holds.
///
/// Owns the buffer contents exclusively.
/// The table is never dangling: an empty storage points at the empty table.
pub(crate) struct Storage<Args: 'static, R: 'static> {
    buffer: InlineBuffer,
    vtable: &'static VTable<Args, R>,
}

impl<Args: 'static, R: 'static> Storage<Args, R> {
    pub(crate) fn empty() -> Self {
        Storage {
            buffer: InlineBuffer::uninit(),
            vtable: VTable::empty(),
        }
    }

    /// Places `f` inline or on the heap according to its classification.
    ///
    /// Only the heap path can fail, and it fails before any table is set.
    pub(crate) fn new<F>(f: F) -> Result<Self, AllocError>
    where
        F: Callable<Args, R>,
    {
        if is_small::<F>() {
            Ok(Self::inline(f))
        } else {
            Self::boxed(f)
        }
    }

    /// Places a small `f` directly into the buffer.
    pub(crate) fn inline<F>(f: F) -> Self
    where
        F: Callable<Args, R>,
    {
        let mut buffer = InlineBuffer::uninit();
        buffer.write(f);

        Storage {
            buffer,
            vtable: &SmallOps::<F, Args, R>::VTABLE,
        }
    }

    /// Moves a large `f` into a new heap block.
    pub(crate) fn boxed<F>(f: F) -> Result<Self, AllocError>
    where
        F: Callable<Args, R>,
    {
        let ptr = allocate(f)?;

        // Safety: `ptr` is a fresh, owned allocation.
        Ok(unsafe { Self::from_heap(ptr) })
    }

    /// Takes ownership of a heap block holding a large `F`.
    ///
    /// # Safety
    ///
    /// `ptr` must be owned by the caller, and releasable with `Box::<F>::from_raw`.
    pub(crate) unsafe fn from_heap<F>(ptr: NonNull<F>) -> Self
    where
        F: Callable<Args, R>,
    {
        debug_assert!(!is_small::<F>());

        let mut buffer = InlineBuffer::uninit();
        buffer.write_heap(ptr.as_ptr());

        Storage {
            buffer,
            vtable: &LargeOps::<F, Args, R>::VTABLE,
        }
    }

    /// Unboxes small callables; large ones keep the box allocation.
    pub(crate) fn from_box<F>(boxed: Box<F>) -> Self
    where
        F: Callable<Args, R>,
    {
        if is_small::<F>() {
            Self::inline(*boxed)
        } else {
            // Safety: the block comes from a `Box<F>`.
            unsafe { Self::from_heap(NonNull::from(Box::leak(boxed))) }
        }
    }

    pub(crate) fn buffer(&self) -> &InlineBuffer {
        &self.buffer
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.vtable.same(VTable::empty())
    }

    pub(crate) fn is_inline(&self) -> bool {
        self.vtable.inline
    }

    /// Returns `true` if the held value is of type `T`.
    pub(crate) fn holds<T: 'static>(&self) -> bool {
        (self.vtable.type_id)() == TypeId::of::<T>()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        (self.vtable.type_name)()
    }

    pub(crate) fn invoke(&mut self, args: Args) -> Result<R, Error> {
        // Safety: the table belongs to this buffer.
        unsafe { (self.vtable.invoke)(&mut self.buffer, args) }
    }

    /// Builds an independent copy; `self` is untouched on failure.
    pub(crate) fn try_clone(&self) -> Result<Self, AllocError> {
        // Safety: the table belongs to this storage.
        unsafe { (self.vtable.copy)(self) }
    }

    /// Moves the held value out into a new storage, leaving `self` empty.
    pub(crate) fn take(&mut self) -> Self {
        // Safety: the table belongs to this storage.
        let taken = unsafe { (self.vtable.relocate)(self) };
        debug_assert!(self.is_empty());
        taken
    }

    /// Exchanges contents. The buffer is never self-referential, so moving its bits moves ownership.
    pub(crate) fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.buffer, &mut other.buffer);
        mem::swap(&mut self.vtable, &mut other.vtable);
    }

    /// Marks the storage empty without dropping what it holds.
    ///
    /// # Safety
    ///
    /// The held value (and heap block, if any) must have been moved out.
    pub(crate) unsafe fn forget(&mut self) {
        self.vtable = VTable::empty();
    }

    pub(crate) fn object<T: 'static>(&self) -> Option<&T> {
        if self.holds::<T>() {
            let this = &self.buffer as *const InlineBuffer as *mut InlineBuffer;
            // Safety: the buffer holds a `T`; it is only read through the shared borrow.
            Some(unsafe { &*InlineBuffer::locate::<T>(this) })
        } else {
            None
        }
    }

    pub(crate) fn object_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.holds::<T>() {
            // Safety: the buffer holds a `T`, and is uniquely borrowed.
            Some(unsafe { &mut *InlineBuffer::locate::<T>(&mut self.buffer) })
        } else {
            None
        }
    }

    /// Moves the held `T` out, unboxing it if necessary. Returns `self` if it holds another type.
    pub(crate) fn into_inner<T: 'static>(mut self) -> Result<T, Self> {
        if !self.holds::<T>() {
            return Err(self);
        }

        // Safety: the buffer holds a `T`; the storage forgets it right after the move.
        let value = unsafe {
            let ptr = InlineBuffer::locate::<T>(&mut self.buffer);

            if is_small::<T>() {
                ptr.read()
            } else {
                *Box::from_raw(ptr)
            }
        };

        unsafe { self.forget() };

        Ok(value)
    }
}

impl<Args: 'static, R: 'static> Drop for Storage<Args, R> {
    #[inline(always)]
    fn drop(&mut self) {
        // Safety: the table belongs to this buffer; drop runs once.
        unsafe { (self.vtable.destroy)(&mut self.buffer) }
    }
}
