use anyhow::Result;
use log::warn;

use crate::entities::Item;
use crate::geometry::Transformation;
use crate::geometry::boolean;
use crate::geometry::geo_traits::Transformable;
use crate::geometry::nfp::no_fit_polygon_convex;
use crate::geometry::primitives::{Polygon, SPolygon};
use crate::util::switch_par_map;

/// Computes the no-fit polygon of `orbiter` around `stationary` and anchors it in place:
/// after the positional correction, translating the orbiter so that its reference vertex lies
/// on any point of the returned polygon produces a touching, non-overlapping configuration.
pub fn pair_nfp(stationary: &Item, orbiter: &Item) -> Result<SPolygon> {
    let stat = stationary.transformed();
    let orb = orbiter.transformed();

    let nfp = no_fit_polygon_convex(&stat.shape.outer, &orb.shape.outer)?;

    //The raw nfp is positioned arbitrarily; anchor it around the stationary shape.
    //The orbiter's leftmost-bottom vertex touching the stationary's rightmost-top vertex is a
    //known valid configuration; in it the orbiter's reference vertex must coincide with the
    //nfp's own reference point. (Jonas Lindmark, "No fit polygon problem", section 2.1.9)
    let touch = stat.reference_vertex - orb.leftmost_bottom_vertex;
    let top_other = orb.reference_vertex + touch;
    let d = top_other - nfp.reference;

    let mut shape = nfp.shape;
    shape.transform(&Transformation::from_translation(d.into()));
    Ok(shape)
}

/// Builds the merged no-fit polygon of `candidate` against every placed item:
/// the union of all pair NFPs, i.e. the set of forbidden reference positions.
///
/// Pair NFPs are computed in parallel when `parallel` is set. Degenerate pairs are skipped
/// with a diagnostic; they merely thin out the seed set.
pub fn calc_nfp(placed: &[Item], candidate: &Item, parallel: bool) -> Vec<Polygon> {
    let nfps = switch_par_map(placed, parallel, |item| pair_nfp(item, candidate));

    let shapes: Vec<Polygon> = nfps
        .into_iter()
        .filter_map(|nfp| match nfp {
            Ok(shape) => Some(Polygon::from_outer(shape)),
            Err(e) => {
                warn!("skipping no-fit polygon of a degenerate pair: {e}");
                None
            }
        })
        .collect();

    boolean::union_all(&shapes)
}
