use std::fmt;

use static_assertions::{assert_eq_size, assert_not_impl_any};
use tracing::debug;

use crate::{
    buffer::is_small,
    callable::Callable,
    error::Result,
    storage::Storage,
};

/// Type-erased callable with a fixed signature: takes the argument tuple `Args`, returns `R`.
///
/// Holds any cloneable `FnMut` closure or function of that signature.
/// Callables of up to one pointer in size (see [`fits`]) are stored inline, without allocation;
/// larger ones are boxed.
///
/// The container is `!Send` and `!Sync`.
///
/// ```
/// use minifunction::Function;
///
/// let mut count = 0u32;
/// let mut next = Function::<(), u32>::new(move || {
///     count += 1;
///     count
/// });
///
/// assert_eq!(next.call(()), 1);
///
/// // Copies are independent.
/// let mut copy = next.clone();
/// assert_eq!(copy.call(()), 2);
/// assert_eq!(next.call(()), 2);
///
/// // Moving out leaves the source empty.
/// let mut moved = next.take();
/// assert!(next.is_none());
/// assert_eq!(moved.call(()), 3);
/// ```
///
/// [`fits`]: #method.fits
pub struct Function<Args: 'static, R: 'static = ()> {
    storage: Storage<Args, R>,
}

assert_eq_size!(Function<(u32,), u32>, [*const (); 2]);
assert_not_impl_any!(Function<(), ()>: Send, Sync);

impl<Args: 'static, R: 'static> Function<Args, R> {
    /// Returns `true` if the callable type `F` is stored inline.
    /// If `true`, then [`new`] is guaranteed to not allocate.
    ///
    /// [`new`]: #method.new
    pub const fn fits<F>() -> bool {
        is_small::<F>()
    }

    /// Creates an empty [`Function`].
    ///
    /// Calling it fails with [`Error::Empty`](crate::Error::Empty).
    pub fn empty() -> Self {
        Function {
            storage: Storage::empty(),
        }
    }

    /// Creates a [`Function`] holding `f`.
    ///
    /// Aborts like `Box::new` if `f` needs heap storage and the allocation fails.
    /// See [`try_new`](#method.try_new) for the fallible version.
    pub fn new<F>(f: F) -> Self
    where
        F: Callable<Args, R>,
    {
        Function {
            storage: Storage::new(f).unwrap_or_else(|err| err.handle()),
        }
    }

    /// Creates a [`Function`] holding `f`, reporting allocation failure as [`Error::Alloc`](crate::Error::Alloc).
    pub fn try_new<F>(f: F) -> Result<Self>
    where
        F: Callable<Args, R>,
    {
        Ok(Function {
            storage: Storage::new(f)?,
        })
    }

    /// Creates a [`Function`] from an already boxed callable.
    ///
    /// Callables which fit are unboxed; others keep the box and no allocation is performed.
    pub fn from_box<F>(boxed: Box<F>) -> Self
    where
        F: Callable<Args, R>,
    {
        Function {
            storage: Storage::from_box(boxed),
        }
    }

    /// Replaces the held callable with `f`.
    ///
    /// The previous callable is dropped only once `f` has been stored.
    pub fn set<F>(&mut self, f: F)
    where
        F: Callable<Args, R>,
    {
        *self = Self::new(f);
    }

    /// Drops the held callable, if any; the [`Function`] becomes empty.
    pub fn clear(&mut self) {
        drop(self.take());
    }

    /// Calls the held callable.
    ///
    /// # Panics
    ///
    /// Panics if the [`Function`] is empty.
    #[inline]
    pub fn call(&mut self, args: Args) -> R {
        match self.try_call(args) {
            Ok(result) => result,
            Err(err) => panic!("{}", err),
        }
    }

    /// Calls the held callable, or returns [`Error::Empty`](crate::Error::Empty) if there is none.
    #[inline]
    pub fn try_call(&mut self, args: Args) -> Result<R> {
        let result = self.storage.invoke(args);

        if let Err(err) = &result {
            debug!(%err, "call failed");
        }

        result
    }

    /// Returns `true` if the [`Function`] holds a callable.
    pub fn is_some(&self) -> bool {
        !self.storage.is_empty()
    }

    /// Returns `true` if the [`Function`] is empty.
    pub fn is_none(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns `true` if the held callable is stored inline.
    /// Empty [`Function`]s store nothing and return `false`.
    pub fn is_inline(&self) -> bool {
        self.storage.is_inline()
    }

    /// Returns `true` if the held callable is of type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.storage.holds::<T>()
    }

    /// Returns a reference to the held callable if it is of type `T`.
    ///
    /// ```
    /// use minifunction::Function;
    ///
    /// fn double(x: u32) -> u32 {
    ///     x * 2
    /// }
    ///
    /// let f = Function::<(u32,), u32>::new(double as fn(u32) -> u32);
    ///
    /// assert!(f.target::<fn(u32) -> u32>().is_some());
    /// assert!(f.target::<u32>().is_none());
    /// ```
    pub fn target<T: 'static>(&self) -> Option<&T> {
        self.storage.object()
    }

    /// Returns a mutable reference to the held callable if it is of type `T`.
    pub fn target_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.storage.object_mut()
    }

    /// Moves the held callable out if it is of type `T`, unboxing it if necessary.
    /// Otherwise returns `self` back.
    pub fn downcast<T: 'static>(self) -> std::result::Result<T, Self> {
        self.storage
            .into_inner()
            .map_err(|storage| Function { storage })
    }

    /// Clones the held callable, reporting allocation failure as [`Error::Alloc`](crate::Error::Alloc).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Function {
            storage: self.storage.try_clone()?,
        })
    }

    /// Replaces the held callable with a clone of `source`'s.
    ///
    /// The clone is built first; if building it fails or panics, `self` is unchanged.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<()> {
        let mut fresh = source.storage.try_clone()?;
        self.storage.swap(&mut fresh);
        Ok(())
    }

    /// Moves the held callable out; `self` is left empty.
    pub fn take(&mut self) -> Self {
        Function {
            storage: self.storage.take(),
        }
    }

    /// Drops the held callable and moves `source`'s in; `source` is left empty.
    pub fn move_from(&mut self, source: &mut Self) {
        *self = source.take();
    }

    /// Exchanges the held callables.
    pub fn swap(&mut self, other: &mut Self) {
        self.storage.swap(&mut other.storage);
    }
}

impl<Args: 'static, R: 'static> Clone for Function<Args, R> {
    fn clone(&self) -> Self {
        Function {
            storage: self.storage.try_clone().unwrap_or_else(|err| err.handle()),
        }
    }

    /// Copy-then-swap: a panicking `clone` of the callable leaves `self` unchanged.
    fn clone_from(&mut self, source: &Self) {
        let mut fresh = source.storage.try_clone().unwrap_or_else(|err| err.handle());
        self.storage.swap(&mut fresh);
    }
}

impl<Args: 'static, R: 'static> Default for Function<Args, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<Args: 'static, R: 'static> fmt::Debug for Function<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("callable", &format_args!("{}", self.storage.type_name()))
            .field("inline", &self.is_inline())
            .finish()
    }
}
