use std::{
    any::{type_name, TypeId},
    marker::PhantomData,
    ptr::{self, NonNull},
};

use crate::{
    buffer::{is_small, InlineBuffer},
    callable::Callable,
    error::{AllocError, Error},
    storage::Storage,
};

/// Calls the held value with the packed arguments.
type InvokeFn<Args, R> = unsafe fn(&mut InlineBuffer, Args) -> Result<R, Error>;

/// Builds an independent copy of the held value in a fresh storage.
/// Produces nothing on failure, so no half-initialized destination is ever observable.
type CopyFn<Args, R> = unsafe fn(&Storage<Args, R>) -> Result<Storage<Args, R>, AllocError>;

/// Moves the held value into a fresh storage; the source is left empty.
type RelocateFn<Args, R> = unsafe fn(&mut Storage<Args, R>) -> Storage<Args, R>;

/// Drops the held value, freeing its heap block if it has one.
type DestroyFn = unsafe fn(&mut InlineBuffer);

/// Operation table for one concrete callable type and one call signature.
///
/// A `'static` reference to the table is stored next to the [`InlineBuffer`]
/// and is the only thing that knows how to interpret the buffer's bytes.
///
/// All functions are `unsafe`: the caller guarantees the buffer / storage passed in
/// is the one the table was paired with.
pub(crate) struct VTable<Args: 'static, R: 'static> {
    pub(crate) invoke: InvokeFn<Args, R>,
    pub(crate) copy: CopyFn<Args, R>,
    pub(crate) relocate: RelocateFn<Args, R>,
    pub(crate) destroy: DestroyFn,
    /// Type key of the held type. Tables compare equal iff their keys do.
    pub(crate) type_id: fn() -> TypeId,
    pub(crate) type_name: fn() -> &'static str,
    /// `true` if the held type lives in the inline buffer.
    pub(crate) inline: bool,
}

impl<Args: 'static, R: 'static> VTable<Args, R> {
    /// The sentinel table of an empty storage.
    #[inline(always)]
    pub(crate) fn empty() -> &'static Self {
        &EmptyOps::<Args, R>::VTABLE
    }

    /// The table for the callable type `F`, picked by its classification.
    #[inline(always)]
    pub(crate) fn of<F>() -> &'static Self
    where
        F: Callable<Args, R>,
    {
        if is_small::<F>() {
            &SmallOps::<F, Args, R>::VTABLE
        } else {
            &LargeOps::<F, Args, R>::VTABLE
        }
    }

    /// Table identity.
    ///
    /// Address comparison is the fast path. A promoted constant may be instantiated
    /// once per codegen unit, so distinct addresses fall back to the type key.
    #[inline]
    pub(crate) fn same(&self, other: &Self) -> bool {
        ptr::eq(self, other) || (self.type_id)() == (other.type_id)()
    }
}

/// Type key of the empty table. Private, and not callable, so no user type can collide with it.
enum Empty {}

fn empty_type_name() -> &'static str {
    "<empty>"
}

struct EmptyOps<Args, R>(PhantomData<fn(Args) -> R>);

impl<Args: 'static, R: 'static> EmptyOps<Args, R> {
    const VTABLE: VTable<Args, R> = VTable {
        invoke: Self::invoke,
        copy: Self::copy,
        relocate: Self::relocate,
        destroy: Self::destroy,
        type_id: TypeId::of::<Empty>,
        type_name: empty_type_name,
        inline: false,
    };

    unsafe fn invoke(_: &mut InlineBuffer, _: Args) -> Result<R, Error> {
        Err(Error::Empty)
    }

    unsafe fn copy(_: &Storage<Args, R>) -> Result<Storage<Args, R>, AllocError> {
        Ok(Storage::empty())
    }

    unsafe fn relocate(_: &mut Storage<Args, R>) -> Storage<Args, R> {
        Storage::empty()
    }

    unsafe fn destroy(_: &mut InlineBuffer) {}
}

/// Operations for callables stored directly in the inline buffer.
pub(crate) struct SmallOps<F, Args, R>(PhantomData<(F, fn(Args) -> R)>);

impl<F, Args: 'static, R: 'static> SmallOps<F, Args, R>
where
    F: Callable<Args, R>,
{
    pub(crate) const VTABLE: VTable<Args, R> = VTable {
        invoke: Self::invoke,
        copy: Self::copy,
        relocate: Self::relocate,
        destroy: Self::destroy,
        type_id: TypeId::of::<F>,
        type_name: type_name::<F>,
        inline: true,
    };

    unsafe fn invoke(buffer: &mut InlineBuffer, args: Args) -> Result<R, Error> {
        // Safety: the buffer holds an `F` in place.
        let f = unsafe { &mut *buffer.as_mut_ptr::<F>() };
        Ok(f.call_with(args))
    }

    unsafe fn copy(from: &Storage<Args, R>) -> Result<Storage<Args, R>, AllocError> {
        // Safety: the buffer holds an `F` in place.
        let f = unsafe { &*from.buffer().as_ptr::<F>() };
        Ok(Storage::inline(f.clone()))
    }

    unsafe fn relocate(from: &mut Storage<Args, R>) -> Storage<Args, R> {
        // Safety: the buffer holds an `F` in place; it is forgotten right after the read.
        let f = unsafe { from.buffer().as_ptr::<F>().read() };
        unsafe { from.forget() };
        Storage::inline(f)
    }

    unsafe fn destroy(buffer: &mut InlineBuffer) {
        // Safety: the buffer holds an `F` in place.
        unsafe { ptr::drop_in_place(buffer.as_mut_ptr::<F>()) }
    }
}

/// Operations for callables which don't fit the buffer;
/// the buffer stores a pointer to a heap block holding the callable.
pub(crate) struct LargeOps<F, Args, R>(PhantomData<(F, fn(Args) -> R)>);

impl<F, Args: 'static, R: 'static> LargeOps<F, Args, R>
where
    F: Callable<Args, R>,
{
    pub(crate) const VTABLE: VTable<Args, R> = VTable {
        invoke: Self::invoke,
        copy: Self::copy,
        relocate: Self::relocate,
        destroy: Self::destroy,
        type_id: TypeId::of::<F>,
        type_name: type_name::<F>,
        inline: false,
    };

    unsafe fn invoke(buffer: &mut InlineBuffer, args: Args) -> Result<R, Error> {
        // Safety: the buffer holds a pointer to a live `F`.
        let f = unsafe { &mut *buffer.read_heap::<F>() };
        Ok(f.call_with(args))
    }

    unsafe fn copy(from: &Storage<Args, R>) -> Result<Storage<Args, R>, AllocError> {
        // Clone before allocating: a panicking `clone` must not leak the new block.
        let f = unsafe { &*from.buffer().read_heap::<F>() }.clone();
        Storage::boxed(f)
    }

    unsafe fn relocate(from: &mut Storage<Args, R>) -> Storage<Args, R> {
        let ptr = unsafe { from.buffer().read_heap::<F>() };
        unsafe { from.forget() };
        // Safety: ownership of the block moved from `from`, which no longer refers to it.
        unsafe { Storage::from_heap(NonNull::new_unchecked(ptr)) }
    }

    unsafe fn destroy(buffer: &mut InlineBuffer) {
        // Safety: the block was allocated with the layout of `F` by the global allocator.
        drop(unsafe { Box::from_raw(buffer.read_heap::<F>()) });
    }
}
