use anyhow::{Result, ensure};

use crate::geometry::Transformation;
use crate::geometry::geo_traits::{CollidesWith, Transformable, TransformableFrom};
use crate::geometry::primitives::{Point, Rect, SPolygon};

/// A polygon with holes: an outer simple polygon and a set of inner simple polygons.
#[derive(Clone, Debug)]
pub struct Polygon {
    pub outer: SPolygon,
    pub holes: Vec<SPolygon>,
}

impl Polygon {
    pub fn new(outer: SPolygon, holes: Vec<SPolygon>) -> Result<Self> {
        ensure!(
            holes.iter().all(|h| outer.bbox.contains(&h.bbox)),
            "hole extends beyond the outer boundary"
        );
        Ok(Polygon { outer, holes })
    }

    pub fn from_outer(outer: SPolygon) -> Self {
        Polygon {
            outer,
            holes: vec![],
        }
    }

    pub fn area(&self) -> f64 {
        self.outer.area - self.holes.iter().map(|h| h.area).sum::<f64>()
    }

    pub fn bbox(&self) -> Rect {
        self.outer.bbox
    }
}

impl Transformable for Polygon {
    fn transform(&mut self, t: &Transformation) -> &mut Self {
        let Polygon { outer, holes } = self;
        outer.transform(t);
        holes.iter_mut().for_each(|h| {
            h.transform(t);
        });
        self
    }
}

impl TransformableFrom for Polygon {
    fn transform_from(&mut self, reference: &Self, t: &Transformation) -> &mut Self {
        let Polygon { outer, holes } = self;
        outer.transform_from(&reference.outer, t);
        for (h, ref_h) in holes.iter_mut().zip(&reference.holes) {
            h.transform_from(ref_h, t);
        }
        self
    }
}

impl CollidesWith<Point> for Polygon {
    fn collides_with(&self, point: &Point) -> bool {
        self.outer.collides_with(point) && !self.holes.iter().any(|h| h.collides_with(point))
    }
}
