use std::sync::OnceLock;

use crate::geometry::primitives::{Edge, Point, Polygon, SPolygon};

/// Maps a normalized parameter in `[0, 1]` to a point on a polygon's circumference in log time.
///
/// The optimizer works on a 1-D domain; this cache transforms its parameter into a boundary
/// coordinate: 0.0 yields the first vertex and 1.0 wraps back around to it. The same mapping is
/// kept separately for each hole of the captured polygon.
pub struct EdgeCache {
    contour: ContourCache,
    holes: Vec<ContourCache>,
    accuracy: f64,
}

struct ContourCache {
    edges: Vec<Edge>,
    /// Cumulative arc length at the end of each edge
    distances: Vec<f64>,
    full_distance: f64,
    corners: OnceLock<Vec<f64>>,
}

impl ContourCache {
    fn new(shape: &SPolygon) -> Self {
        let edges: Vec<Edge> = shape.edge_iter().collect();
        let mut distances = Vec::with_capacity(edges.len());
        let mut full_distance = 0.0;
        for edge in &edges {
            full_distance += edge.length();
            distances.push(full_distance);
        }
        ContourCache {
            edges,
            distances,
            full_distance,
            corners: OnceLock::new(),
        }
    }

    fn coords(&self, u: f64) -> Point {
        if self.edges.is_empty() || self.full_distance == 0.0 {
            return Point(0.0, 0.0);
        }
        let u = match (0.0..=1.0).contains(&u) {
            true => u,
            false => u.rem_euclid(1.0),
        };

        //scale up to the full length of the circumference
        let d = u * self.full_distance;

        //find the edge this distance falls on in log time
        let idx = self
            .distances
            .partition_point(|&cum| cum < d)
            .min(self.edges.len() - 1);

        //remaining distance on the target edge
        let remainder = d - if idx > 0 { self.distances[idx - 1] } else { 0.0 };
        let edge = self.edges[idx];
        let angle = edge.angle();

        Point(
            edge.start.0 + remainder * angle.cos(),
            edge.start.1 + remainder * angle.sin(),
        )
    }

    fn corners(&self, accuracy: f64) -> &[f64] {
        self.corners.get_or_init(|| {
            let n = self.distances.len();
            if n == 0 || self.full_distance == 0.0 {
                return vec![];
            }
            let stride = stride(n, accuracy);

            let mut corners = Vec::with_capacity(n / stride + 1);
            corners.push(0.0);
            //distances[i] is the parameter of vertex i+1
            for i in (0..n.saturating_sub(1)).step_by(stride) {
                corners.push(self.distances[i] / self.full_distance);
            }
            corners
        })
    }
}

/// Subsampling step for the corner seeds: accuracy 1.0 keeps every vertex,
/// lower accuracies drop seeds exponentially in the cube root of the exponent.
fn stride(n: usize, accuracy: f64) -> usize {
    let n = n as f64;
    ((n / n.powf(accuracy.powf(1.0 / 3.0))).round() as usize).max(1)
}

impl EdgeCache {
    pub fn new(shape: &Polygon, accuracy: f64) -> Self {
        EdgeCache {
            contour: ContourCache::new(&shape.outer),
            holes: shape.holes.iter().map(ContourCache::new).collect(),
            accuracy,
        }
    }

    /// `true` when the contour carries no usable edges; such a cache yields no seeds.
    pub fn is_degenerate(&self) -> bool {
        self.contour.edges.is_empty() || self.contour.full_distance == 0.0
    }

    /// The point lying at relative distance `u` along the contour.
    pub fn coords(&self, u: f64) -> Point {
        self.contour.coords(u)
    }

    /// The point lying at relative distance `u` along hole `hidx`.
    pub fn hole_coords(&self, hidx: usize, u: f64) -> Point {
        self.holes[hidx].coords(u)
    }

    pub fn circumference(&self) -> f64 {
        self.contour.full_distance
    }

    /// Normalized parameter values seeding the minimizer, one per stride of contour vertices.
    pub fn corners(&self) -> &[f64] {
        self.contour.corners(self.accuracy)
    }

    pub fn hole_corners(&self, hidx: usize) -> &[f64] {
        self.holes[hidx].corners(self.accuracy)
    }

    pub fn n_holes(&self) -> usize {
        self.holes.len()
    }
}
