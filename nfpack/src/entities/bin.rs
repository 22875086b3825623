use log::warn;

use crate::geometry::geo_traits::{CollidesWith, Shape};
use crate::geometry::primitives::{Circle, Point, Rect, SPolygon};

/// A bin to pack items into, hidden behind a uniform contain/overfit interface.
///
/// The overfit conventions differ per bin type and are relied upon by the placer:
/// * box bins report a magnitude (sum of positive width/height excesses),
/// * circle bins report a signed radius excess,
/// * polygon bins report a ±1 containment sentinel.
#[derive(Clone, Debug)]
pub enum Bin {
    Rect(Rect),
    Circle(Circle),
    Polygon(SPolygon),
}

impl Bin {
    pub fn bbox(&self) -> Rect {
        match self {
            Bin::Rect(r) => *r,
            Bin::Circle(c) => c.bbox(),
            Bin::Polygon(p) => p.bbox(),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Bin::Rect(r) => r.area(),
            Bin::Circle(c) => c.area(),
            Bin::Polygon(p) => p.area(),
        }
    }

    /// How far a bounding box overfits this bin; zero or negative when it fits.
    ///
    /// Box bins compare dimensions only, independent of position.
    pub fn overfit_bbox(&self, bb: Rect) -> f64 {
        match self {
            Bin::Rect(bin) => {
                let w_diff = bb.width() - bin.width();
                let h_diff = bb.height() - bin.height();
                let mut diff = 0.0;
                if w_diff > 0.0 {
                    diff += w_diff;
                }
                if h_diff > 0.0 {
                    diff += h_diff;
                }
                diff
            }
            Bin::Circle(bin) => 0.5 * bb.diameter() - bin.radius,
            Bin::Polygon(bin) => {
                //center the box in the bin's bounding box, then check containment
                let d = bin.bbox.centroid() - bb.centroid();
                let inside = bb
                    .corners()
                    .iter()
                    .all(|&corner| bin.collides_with(&(corner + d)));
                if inside { -1.0 } else { 1.0 }
            }
        }
    }

    /// How far a point set (typically a convex hull) overfits this bin.
    pub fn overfit_hull(&self, hull: &[Point]) -> f64 {
        let Some(hull_bbox) = Rect::from_points(hull) else {
            warn!("overfit check on an empty point set");
            return f64::INFINITY;
        };
        match self {
            Bin::Rect(_) => self.overfit_bbox(hull_bbox),
            Bin::Circle(bin) => Circle::bounding_circle(hull).radius - bin.radius,
            Bin::Polygon(bin) => {
                let d = bin.bbox.centroid() - hull_bbox.centroid();
                let inside = hull.iter().all(|&p| bin.collides_with(&(p + d)));
                if inside { -1.0 } else { 1.0 }
            }
        }
    }

    /// Strict positional containment of a point set, without any re-centering.
    pub fn contains_hull(&self, hull: &[Point]) -> bool {
        match self {
            Bin::Rect(bin) => hull.iter().all(|p| bin.collides_with(p)),
            Bin::Circle(bin) => hull.iter().all(|p| bin.collides_with(p)),
            Bin::Polygon(bin) => hull.iter().all(|p| bin.collides_with(p)),
        }
    }
}
