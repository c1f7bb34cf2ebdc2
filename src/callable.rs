/// A cloneable callable which accepts its arguments packed in the tuple `Args` and returns `R`.
///
/// Implemented for every `FnMut(A0, .., An) -> R + Clone + 'static` with up to eight arguments,
/// so closures and function items never need to implement it by hand.
///
/// ```
/// use minifunction::Callable;
///
/// let mut add = |a: u32, b: u32| a + b;
/// assert_eq!(add.call_with((2, 3)), 5);
/// ```
pub trait Callable<Args, R>: Clone + 'static {
    /// Calls the callable with the unpacked `args`.
    fn call_with(&mut self, args: Args) -> R;
}

macro_rules! impl_callable {
    ($($arg:ident $val:ident),*) => {
        impl<F, R, $($arg,)*> Callable<($($arg,)*), R> for F
        where
            F: FnMut($($arg),*) -> R + Clone + 'static,
        {
            #[inline(always)]
            fn call_with(&mut self, ($($val,)*): ($($arg,)*)) -> R {
                self($($val),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A0 a0);
impl_callable!(A0 a0, A1 a1);
impl_callable!(A0 a0, A1 a1, A2 a2);
impl_callable!(A0 a0, A1 a1, A2 a2, A3 a3);
impl_callable!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4);
impl_callable!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_callable!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_callable!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
