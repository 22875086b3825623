use geo::BooleanOps;
use geo_types::{LineString, MultiPolygon as GeoMultiPolygon, Polygon as GeoPolygon};
use log::warn;

use crate::geometry::primitives::{Point, Polygon, SPolygon};

/// Returns the union of a set of polygons as a set of disjoint polygons (with holes).
///
/// Degenerate rings coming back from the boolean backend are dropped with a diagnostic,
/// never propagated.
pub fn union_all(shapes: &[Polygon]) -> Vec<Polygon> {
    match shapes {
        [] => vec![],
        [single] => vec![single.clone()],
        [first, rest @ ..] => {
            let mut acc = GeoMultiPolygon::new(vec![to_geo(first)]);
            for shape in rest {
                acc = acc.union(&GeoMultiPolygon::new(vec![to_geo(shape)]));
            }
            acc.0.iter().filter_map(from_geo).collect()
        }
    }
}

/// Unions one additional shape into an already-merged pile.
pub fn merge(pile: &[Polygon], extra: &Polygon) -> Vec<Polygon> {
    let mut shapes = pile.to_vec();
    shapes.push(extra.clone());
    union_all(&shapes)
}

fn to_geo(p: &Polygon) -> GeoPolygon<f64> {
    GeoPolygon::new(ring(&p.outer), p.holes.iter().map(ring).collect())
}

fn ring(sp: &SPolygon) -> LineString<f64> {
    LineString::from(
        sp.points
            .iter()
            .map(|&Point(x, y)| (x, y))
            .collect::<Vec<_>>(),
    )
}

fn from_geo(gp: &GeoPolygon<f64>) -> Option<Polygon> {
    let outer = ring_to_spolygon(gp.exterior())?;
    let holes = gp.interiors().iter().filter_map(ring_to_spolygon).collect();
    match Polygon::new(outer, holes) {
        Ok(p) => Some(p),
        Err(e) => {
            warn!("dropping degenerate polygon from union result: {e}");
            None
        }
    }
}

fn ring_to_spolygon(ls: &LineString<f64>) -> Option<SPolygon> {
    let mut points: Vec<Point> = ls.0.iter().map(|c| Point(c.x, c.y)).collect();
    if points.len() >= 2 && points.first() == points.last() {
        points.pop();
    }
    points.dedup();

    match SPolygon::new(points) {
        Ok(sp) => Some(sp),
        Err(e) => {
            warn!("dropping degenerate ring from union result: {e}");
            None
        }
    }
}
