mod first_fit;

#[doc(inline)]
pub use first_fit::{
    FirstFitConfig, FirstFitSelection, ProgressCallback, StopCondition,
};
