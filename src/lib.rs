//! Type-erased callable container with small function optimization.
//!
//! [`Function<Args, R>`] holds any cloneable closure or function taking the argument tuple `Args`
//! and returning `R`. Callables of up to one pointer in size are stored inline;
//! larger ones are stored on the heap. Either way the container is two pointers in size
//! and is called, cloned, moved and dropped through a per-type operation table.
//!
//! ## Usage
//!
//! ```
//! use minifunction::{Error, Function};
//!
//! // A non-capturing closure fits inline storage, so no allocation is performed.
//! let mut add = Function::<(u32, u32), u32>::new(|a: u32, b: u32| a + b);
//! assert!(add.is_inline());
//! assert_eq!(add.call((2, 3)), 5);
//!
//! // Larger captures are boxed.
//! let weights = [1u32, 2, 3, 4];
//! let mut dot = Function::<(u32, u32), u32>::new(move |a: u32, b: u32| a * weights[0] + b * weights[3]);
//! assert!(!dot.is_inline());
//! assert_eq!(dot.call((2, 3)), 14);
//!
//! // An empty container reports the call instead of invoking anything.
//! let mut empty = Function::<(u32, u32), u32>::empty();
//! assert_eq!(empty.try_call((1, 1)), Err(Error::Empty));
//!
//! // Typed access to the held callable.
//! fn sub(a: u32, b: u32) -> u32 {
//!     a - b
//! }
//!
//! let sub = Function::<(u32, u32), u32>::new(sub as fn(u32, u32) -> u32);
//! assert!(sub.target::<fn(u32, u32) -> u32>().is_some());
//! assert!(sub.target::<u32>().is_none());
//! ```

mod buffer;
mod callable;
mod error;
mod function;
mod storage;
mod vtable;

#[cfg(test)]
mod testing;

pub use self::{
    buffer::{INLINE_ALIGN, INLINE_CAPACITY},
    callable::Callable,
    error::{AllocError, Error},
    function::Function,
};
