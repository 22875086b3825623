mod fpa;

#[doc(inline)]
pub use fpa::FPA;

use rayon::prelude::*;

/// Maps `f` over `slice`, in parallel when `parallel` is set, sequentially in index order otherwise.
/// Output order always matches input order.
pub(crate) fn switch_par_map<T, R, F>(slice: &[T], parallel: bool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Send + Sync,
{
    match parallel {
        true => slice.par_iter().map(f).collect(),
        false => slice.iter().map(f).collect(),
    }
}
