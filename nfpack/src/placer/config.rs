use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entities::Item;
use crate::geometry::geo_traits::Shape;
use crate::geometry::primitives::{Point, Polygon, Rect};

/// Anchor on a bounding box, used both for the initial position of the first item and for the
/// final alignment of the packed pile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Center,
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
    /// No alignment pass; the objective then penalizes placements outside the bin directly.
    DontAlign,
}

impl Alignment {
    /// The anchor point of `bb` for this alignment, `None` for [`Alignment::DontAlign`].
    pub fn anchor(&self, bb: &Rect) -> Option<Point> {
        match self {
            Alignment::Center => Some(bb.centroid()),
            Alignment::BottomLeft => Some(bb.min_corner()),
            Alignment::BottomRight => Some(Point(bb.x_max, bb.y_min)),
            Alignment::TopLeft => Some(Point(bb.x_min, bb.y_max)),
            Alignment::TopRight => Some(bb.max_corner()),
            Alignment::DontAlign => None,
        }
    }
}

/// Scores a candidate placement; lower is better.
pub type ObjectiveFn = Arc<dyn Fn(&Item) -> f64 + Send + Sync>;

/// Observer invoked with (merged pile, packed items, remaining items).
pub type PackingCallback = Arc<dyn Fn(&[Polygon], &[Item], &[Item]) + Send + Sync>;

/// Observer invoked with the preloaded items and a mutable view of the configuration.
pub type PreloadCallback = Arc<dyn Fn(&[Item], &mut PlacerConfig) + Send + Sync>;

/// Configuration of the [`NfpPlacer`](crate::placer::NfpPlacer).
#[derive(Clone)]
pub struct PlacerConfig {
    /// Which rotation angles to try out, in order
    pub rotations: Vec<f64>,
    /// Where to align the resulting packed pile
    pub alignment: Alignment,
    /// Where to put the first item in the bin
    pub starting_point: Alignment,
    /// Custom scoring of candidate placements; a pack-density default is used when absent
    pub object_function: Option<ObjectiveFn>,
    /// Compromise slider between speed (0.0) and placement quality (1.0);
    /// governs both the seed density and the minimizer's iteration cap
    pub accuracy: f64,
    /// Permit placements whose reference rides inside a hole of the merged NFP
    pub explore_holes: bool,
    /// If true, use all CPUs available; run the fan-outs on a single core otherwise
    pub parallel: bool,
    /// Called just before the search for a new item's position starts
    pub before_packing: Option<PackingCallback>,
    /// Called after the search, regardless of its outcome
    pub after_packing: Option<PackingCallback>,
    /// Called when pre-placed items are installed
    pub on_preload: Option<PreloadCallback>,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        PlacerConfig {
            rotations: vec![0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2],
            alignment: Alignment::Center,
            starting_point: Alignment::Center,
            object_function: None,
            accuracy: 0.65,
            explore_holes: false,
            parallel: true,
            before_packing: None,
            after_packing: None,
            on_preload: None,
        }
    }
}

impl Debug for PlacerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacerConfig")
            .field("rotations", &self.rotations)
            .field("alignment", &self.alignment)
            .field("starting_point", &self.starting_point)
            .field("object_function", &self.object_function.is_some())
            .field("accuracy", &self.accuracy)
            .field("explore_holes", &self.explore_holes)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}
