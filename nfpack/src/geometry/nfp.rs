use std::borrow::Cow;

use anyhow::Result;
use log::warn;
use ordered_float::OrderedFloat;

use crate::geometry::convex_hull::convex_hull_from_points;
use crate::geometry::primitives::{Point, SPolygon};

/// A no-fit polygon together with its reference point, the rightmost-top vertex of the raw
/// NFP. Anchoring this point to a known touching configuration positions the whole NFP.
#[derive(Clone, Debug)]
pub struct NfpResult {
    pub shape: SPolygon,
    pub reference: Point,
}

/// Computes the no-fit polygon of `orbiter` around `stationary` for convex shapes:
/// the boundary of the Minkowski sum `stationary ⊕ −orbiter`, built by merging the
/// edges of both contours in polar-angle order.
///
/// The returned polygon is positioned arbitrarily; callers are expected to anchor it
/// through its reference point. Non-convex inputs are substituted by their convex hulls.
pub fn no_fit_polygon_convex(stationary: &SPolygon, orbiter: &SPolygon) -> Result<NfpResult> {
    let stationary = convexified(stationary);
    let orbiter = convexified(orbiter);

    //edge vectors of the stationary contour (counterclockwise)
    //and of the orbiter traversed in reverse
    let mut edges: Vec<(OrderedFloat<f64>, Point)> = stationary
        .edge_iter()
        .map(|e| e.end - e.start)
        .chain(orbiter.edge_iter().map(|e| e.start - e.end))
        .map(|v| (OrderedFloat(v.1.atan2(v.0)), v))
        .collect();

    edges.sort_by_key(|&(angle, _)| angle);

    //merge runs of parallel edges, they would only produce collinear vertices
    let mut merged: Vec<(OrderedFloat<f64>, Point)> = Vec::with_capacity(edges.len());
    for (angle, v) in edges {
        match merged.last_mut() {
            Some((last_angle, last_v)) if *last_angle == angle => *last_v = *last_v + v,
            _ => merged.push((angle, v)),
        }
    }

    //chain the sorted edges into a closed convex contour
    let mut points = Vec::with_capacity(merged.len());
    let mut cursor = Point(0.0, 0.0);
    for (_, v) in merged {
        points.push(cursor);
        cursor = cursor + v;
    }

    let shape = SPolygon::new(points)?;
    let reference = shape.rightmost_top_vertex();

    Ok(NfpResult { shape, reference })
}

fn convexified(shape: &SPolygon) -> Cow<'_, SPolygon> {
    match shape.is_convex() {
        true => Cow::Borrowed(shape),
        false => {
            warn!("non-convex shape in convex NFP construction, substituting its convex hull");
            let hull = convex_hull_from_points(shape.points.clone());
            Cow::Owned(SPolygon::new(hull).expect("convex hull of a valid polygon is valid"))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::geo_traits::Shape;

    fn square(side: f64, offset: Point) -> SPolygon {
        SPolygon::new(vec![
            Point(offset.0, offset.1),
            Point(offset.0 + side, offset.1),
            Point(offset.0 + side, offset.1 + side),
            Point(offset.0, offset.1 + side),
        ])
        .unwrap()
    }

    #[test]
    fn nfp_of_two_squares_is_their_size_sum() {
        let stat = square(20.0, Point(0.0, 0.0));
        let orb = square(10.0, Point(100.0, 50.0));

        let nfp = no_fit_polygon_convex(&stat, &orb).unwrap();
        let bb = nfp.shape.bbox();
        assert_eq!(bb.width(), 30.0);
        assert_eq!(bb.height(), 30.0);
        assert_eq!(nfp.reference, nfp.shape.rightmost_top_vertex());
    }

    #[test]
    fn nfp_of_triangle_and_square() {
        let stat = SPolygon::new(vec![Point(0.0, 0.0), Point(10.0, 0.0), Point(0.0, 10.0)]).unwrap();
        let orb = square(10.0, Point(0.0, 0.0));

        let nfp = no_fit_polygon_convex(&stat, &orb).unwrap();
        //the Minkowski sum of a triangle and a square is a pentagon
        assert_eq!(nfp.shape.n_vertices(), 5);
        let bb = nfp.shape.bbox();
        assert_eq!(bb.width(), 20.0);
        assert_eq!(bb.height(), 20.0);
    }
}
