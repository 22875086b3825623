//! `nfpack`: no-fit-polygon placement and first-fit selection for 2D irregular bin packing.
//!
//! Items (polygons with optional holes) are placed one by one into rectangular, circular or
//! polygonal bins. For every candidate the [`placer::NfpPlacer`] searches the boundary of the
//! merged no-fit polygon against the already placed pile, seeding a 1-D local minimizer at a
//! configurable density of boundary corners. The [`selector::FirstFitSelection`] sequences
//! candidates across a dynamic set of bins.

/// Entities to model packing problems: items and bins
pub mod entities;

/// Geometric primitives and base algorithms
pub mod geometry;

/// Debug export of packed layouts
pub mod io;

/// Bounded 1-D black-box minimizer
pub mod opt;

/// The no-fit-polygon placer
pub mod placer;

/// Selection heuristics sequencing items over bins
pub mod selector;

/// Helper functions which do not belong to any specific module
pub mod util;
