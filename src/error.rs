use std::alloc::Layout;

use thiserror::Error;

/// Errors reported by [`Function`](struct.Function.html) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The container holds no callable.
    #[error("called an empty `Function`")]
    Empty,

    /// Heap storage for a large callable could not be allocated.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Heap storage for a callable which does not fit inline could not be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to allocate {} bytes (align {}) for an out-of-line callable", .layout.size(), .layout.align())]
pub struct AllocError {
    /// Layout of the allocation that failed.
    pub layout: Layout,
}

impl AllocError {
    /// Diverges the way `Box::new` does on allocation failure.
    pub(crate) fn handle(self) -> ! {
        std::alloc::handle_alloc_error(self.layout)
    }
}

/// A specialized `Result` type for container operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
