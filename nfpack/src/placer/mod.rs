mod config;
mod edge_cache;
mod nfp_builder;
mod nfp_placer;

#[doc(inline)]
pub use config::{Alignment, ObjectiveFn, PackingCallback, PlacerConfig, PreloadCallback};
#[doc(inline)]
pub use edge_cache::EdgeCache;
#[doc(inline)]
pub use nfp_builder::{calc_nfp, pair_nfp};
#[doc(inline)]
pub use nfp_placer::{NfpPlacer, PackResult};
