use std::sync::OnceLock;

use crate::geometry::DTransformation;
use crate::geometry::geo_traits::Transformable;
use crate::geometry::primitives::{Point, Polygon, Rect};

/// An item to be packed: a polygon (with optional holes) carrying its current placement.
#[derive(Clone, Debug)]
pub struct Item {
    pub id: usize,
    /// Contour of the item as defined in the input, prior to any placement
    pub shape: Polygon,
    /// Items with a higher priority are packed first
    pub priority: i32,
    /// Fixed items are preloaded into their declared bin and never moved
    pub fixed: bool,
    /// Index of the bin this item was packed into, `None` while unpacked
    pub bin_id: Option<usize>,
    translation: Point,
    rotation: f64,
    transformed: OnceLock<TransformedShape>,
}

/// Derived quantities of an [`Item`] under its current rotation and translation.
///
/// Filled at most once per placement through [`Item::transformed`]; the placer warms it on
/// every participant before fanning out, so parallel readers never contend with a writer.
#[derive(Clone, Debug)]
pub struct TransformedShape {
    pub shape: Polygon,
    pub bbox: Rect,
    /// Rightmost-top vertex of the transformed contour, the anchor that rides along an NFP
    pub reference_vertex: Point,
    pub leftmost_bottom_vertex: Point,
}

impl Item {
    pub fn new(id: usize, shape: Polygon, priority: i32) -> Self {
        Item {
            id,
            shape,
            priority,
            fixed: false,
            bin_id: None,
            translation: Point(0.0, 0.0),
            rotation: 0.0,
            transformed: OnceLock::new(),
        }
    }

    /// Marks the item as pre-placed in `bin_id` with its current transformation.
    pub fn into_fixed(mut self, bin_id: usize) -> Self {
        self.fixed = true;
        self.bin_id = Some(bin_id);
        self
    }

    pub fn translation(&self) -> Point {
        self.translation
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn set_translation(&mut self, translation: Point) {
        if self.translation != translation {
            self.translation = translation;
            self.transformed = OnceLock::new();
        }
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.transformed = OnceLock::new();
        }
    }

    /// Shifts the item by `d`, keeping its rotation.
    pub fn translate(&mut self, d: Point) {
        self.set_translation(self.translation + d);
    }

    /// Area of the item's shape, invariant under placement.
    pub fn area(&self) -> f64 {
        self.shape.area()
    }

    /// The shape under the current rotation and translation, with its derived vertices.
    pub fn transformed(&self) -> &TransformedShape {
        self.transformed.get_or_init(|| {
            let t = DTransformation::new(self.rotation, self.translation.into()).compose();
            let shape = self.shape.transform_clone(&t);
            let bbox = shape.bbox();
            let reference_vertex = shape.outer.rightmost_top_vertex();
            let leftmost_bottom_vertex = shape.outer.leftmost_bottom_vertex();
            TransformedShape {
                shape,
                bbox,
                reference_vertex,
                leftmost_bottom_vertex,
            }
        })
    }

    /// Bounding box of the transformed shape.
    pub fn bbox(&self) -> Rect {
        self.transformed().bbox
    }
}
