use std::f64::consts::PI;

use crate::geometry::Transformation;
use crate::geometry::geo_traits::{CollidesWith, DistanceTo, Shape, Transformable};
use crate::geometry::primitives::{Point, Rect};

/// Circle
#[derive(Clone, Debug, PartialEq, Copy)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        debug_assert!(
            radius.is_finite() && radius >= 0.0,
            "invalid circle radius: {radius}",
        );
        debug_assert!(
            center.0.is_finite() && center.1.is_finite(),
            "invalid circle center: {center:?}",
        );

        Self { center, radius }
    }

    /// Returns a circle that contains all `points` by incremental expansion.
    /// Deterministic and never under-estimating, but not necessarily minimal.
    /// An empty set yields a zero circle at the origin.
    pub fn bounding_circle(points: &[Point]) -> Circle {
        let mut points = points.iter();
        let mut bounding = match points.next() {
            Some(&p) => Circle::new(p, 0.0),
            None => return Circle::new(Point(0.0, 0.0), 0.0),
        };

        for point in points {
            let d = bounding.center.distance_to(point);
            if d > bounding.radius {
                // point not contained, expand towards it
                let new_radius = (d + bounding.radius) / 2.0;
                let shift = (new_radius - bounding.radius) / d;
                let Point(cx, cy) = bounding.center;
                let new_center = Point(
                    cx + (point.0 - cx) * shift,
                    cy + (point.1 - cy) * shift,
                );
                bounding = Circle::new(new_center, new_radius);
            }
        }
        bounding
    }
}

impl Transformable for Circle {
    fn transform(&mut self, t: &Transformation) -> &mut Self {
        let Circle { center, radius: _ } = self;
        center.transform(t);
        self
    }
}

impl CollidesWith<Point> for Circle {
    fn collides_with(&self, point: &Point) -> bool {
        point.sq_distance_to(&self.center) <= self.radius.powi(2)
    }
}

impl Shape for Circle {
    fn centroid(&self) -> Point {
        self.center
    }

    fn area(&self) -> f64 {
        self.radius * self.radius * PI
    }

    fn bbox(&self) -> Rect {
        let (r, x, y) = (self.radius, self.center.0, self.center.1);
        Rect {
            x_min: x - r,
            y_min: y - r,
            x_max: x + r,
            y_max: y + r,
        }
    }

    fn diameter(&self) -> f64 {
        self.radius * 2.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounding_circle_contains_all_points() {
        let points = [
            Point(0.0, 0.0),
            Point(10.0, 0.0),
            Point(10.0, 10.0),
            Point(0.0, 10.0),
            Point(5.0, 12.0),
        ];
        let bc = Circle::bounding_circle(&points);
        for p in &points {
            assert!(bc.center.distance_to(p) <= bc.radius + 1e-9, "{p:?} outside {bc:?}");
        }
    }
}
