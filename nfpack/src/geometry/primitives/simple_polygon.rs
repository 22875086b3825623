use anyhow::{Result, ensure};
use ordered_float::OrderedFloat;

use crate::geometry::Transformation;
use crate::geometry::geo_traits::{CollidesWith, Shape, Transformable, TransformableFrom};
use crate::geometry::primitives::{Edge, Point, Rect};
use crate::util::FPA;

/// Geometric primitive representing a simple polygon: <https://en.wikipedia.org/wiki/Simple_polygon>
///
/// Vertices are stored counterclockwise, without a duplicated closing vertex.
#[derive(Clone, Debug)]
pub struct SPolygon {
    pub points: Vec<Point>,
    pub bbox: Rect,
    pub area: f64,
}

impl SPolygon {
    /// Creates a new simple polygon; reverses the vertex order if it is clockwise.
    pub fn new(mut points: Vec<Point>) -> Result<Self> {
        ensure!(
            points.len() >= 3,
            "simple polygon must have at least 3 points: {points:?}"
        );
        ensure!(
            points
                .iter()
                .zip(points.iter().cycle().skip(1))
                .all(|(a, b)| a != b),
            "simple polygon contains duplicate consecutive points: {points:?}"
        );

        let area = match SPolygon::calculate_area(&points) {
            a if a == 0.0 => anyhow::bail!("simple polygon has no area: {points:?}"),
            a if a < 0.0 => {
                //vertices should always be ordered counterclockwise (positive area)
                points.reverse();
                -a
            }
            a => a,
        };

        let bbox = Rect::from_points(&points).expect("at least 3 points");

        Ok(SPolygon { points, bbox, area })
    }

    pub fn vertex(&self, i: usize) -> Point {
        self.points[i]
    }

    pub fn n_vertices(&self) -> usize {
        self.points.len()
    }

    pub fn edge(&self, i: usize) -> Edge {
        let j = (i + 1) % self.n_vertices();
        Edge::new(self.points[i], self.points[j])
    }

    pub fn edge_iter(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.n_vertices()).map(move |i| self.edge(i))
    }

    /// Vertex with the highest x-coordinate, ties broken by the highest y-coordinate.
    pub fn rightmost_top_vertex(&self) -> Point {
        *self
            .points
            .iter()
            .max_by_key(|p| (OrderedFloat(p.0), OrderedFloat(p.1)))
            .expect("polygon has vertices")
    }

    /// Vertex with the lowest x-coordinate, ties broken by the lowest y-coordinate.
    pub fn leftmost_bottom_vertex(&self) -> Point {
        *self
            .points
            .iter()
            .min_by_key(|p| (OrderedFloat(p.0), OrderedFloat(p.1)))
            .expect("polygon has vertices")
    }

    /// `true` iff every corner turns counterclockwise (collinear corners allowed).
    pub fn is_convex(&self) -> bool {
        let n = self.n_vertices();
        (0..n).all(|i| {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let c = self.points[(i + 2) % n];
            (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0) >= 0.0
        })
    }

    //https://en.wikipedia.org/wiki/Shoelace_formula
    //counterclockwise = positive area, clockwise = negative area
    pub fn calculate_area(points: &[Point]) -> f64 {
        let mut sigma: f64 = 0.0;
        for i in 0..points.len() {
            let j = (i + 1) % points.len();

            let (x_i, y_i) = points[i].into();
            let (x_j, y_j) = points[j].into();

            sigma += (y_i + y_j) * (x_i - x_j)
        }

        0.5 * sigma
    }
}

impl Shape for SPolygon {
    fn centroid(&self) -> Point {
        //based on: https://en.wikipedia.org/wiki/Centroid#Of_a_polygon
        let area = self.area;
        let mut c_x = 0.0;
        let mut c_y = 0.0;

        for i in 0..self.n_vertices() {
            let j = (i + 1) % self.n_vertices();
            let Point(x_i, y_i) = self.vertex(i);
            let Point(x_j, y_j) = self.vertex(j);
            c_x += (x_i + x_j) * (x_i * y_j - x_j * y_i);
            c_y += (y_i + y_j) * (x_i * y_j - x_j * y_i);
        }

        Point(c_x / (6.0 * area), c_y / (6.0 * area))
    }

    fn area(&self) -> f64 {
        self.area
    }

    fn bbox(&self) -> Rect {
        self.bbox
    }

    fn diameter(&self) -> f64 {
        self.bbox.diameter()
    }
}

impl Transformable for SPolygon {
    fn transform(&mut self, t: &Transformation) -> &mut Self {
        //destructuring pattern to ensure that the code is updated when the struct changes
        let SPolygon {
            points,
            bbox,
            area: _,
        } = self;

        points.iter_mut().for_each(|p| {
            p.transform(t);
        });

        //regenerate the bounding box
        *bbox = Rect::from_points(points).expect("at least 3 points");

        self
    }
}

impl TransformableFrom for SPolygon {
    fn transform_from(&mut self, reference: &Self, t: &Transformation) -> &mut Self {
        let SPolygon {
            points,
            bbox,
            area: _,
        } = self;

        for (p, ref_p) in points.iter_mut().zip(&reference.points) {
            p.transform_from(ref_p, t);
        }

        *bbox = Rect::from_points(points).expect("at least 3 points");

        self
    }
}

impl CollidesWith<Point> for SPolygon {
    fn collides_with(&self, point: &Point) -> bool {
        //based on the ray casting algorithm: https://en.wikipedia.org/wiki/Point_in_polygon#Ray_casting_algorithm
        match self.bbox.collides_with(point) {
            false => false,
            true => {
                //horizontal ray shot to the right,
                //starting from the point to another point that is certainly outside the shape
                let point_outside = Point(self.bbox.x_max + self.bbox.width(), point.1);
                let ray = Edge::new(*point, point_outside);

                let mut n_intersections = 0;
                for edge in self.edge_iter() {
                    //Check if the ray does not go through (or almost through) a vertex.
                    //This can give unreliable results, therefore we handle it as a separate case.
                    let (s_x, s_y) = (FPA(edge.start.0), FPA(edge.start.1));
                    let (e_x, e_y) = (FPA(edge.end.0), FPA(edge.end.1));
                    let (p_x, p_y) = (FPA(point.0), FPA(point.1));

                    if (s_y == p_y && s_x > p_x) || (e_y == p_y && e_x > p_x) {
                        //the ray passes through (or dangerously close to) a vertex,
                        //only count an intersection if the edge is below the ray
                        if s_y < p_y || e_y < p_y {
                            n_intersections += 1;
                        }
                    } else if ray_intersects_edge(&ray, &edge) {
                        n_intersections += 1;
                    }
                }

                n_intersections % 2 == 1
            }
        }
    }
}

fn ray_intersects_edge(ray: &Edge, edge: &Edge) -> bool {
    //based on: https://en.wikipedia.org/wiki/Line%E2%80%93line_intersection#Given_two_points_on_each_line_segment
    let Point(x1, y1) = ray.start;
    let Point(x2, y2) = ray.end;
    let Point(x3, y3) = edge.start;
    let Point(x4, y4) = edge.end;

    let t_nom = (x2 - x4) * (y4 - y3) - (y2 - y4) * (x4 - x3);
    let t_denom = (x2 - x1) * (y4 - y3) - (y2 - y1) * (x4 - x3);
    let u_nom = (x2 - x4) * (y2 - y1) - (y2 - y4) * (x2 - x1);
    let u_denom = (x2 - x1) * (y4 - y3) - (y2 - y1) * (x4 - x3);

    if t_denom == 0.0 || u_denom == 0.0 {
        //parallel
        return false;
    }

    let t = t_nom / t_denom;
    let u = u_nom / u_denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

impl TryFrom<Rect> for SPolygon {
    type Error = anyhow::Error;

    fn try_from(r: Rect) -> Result<Self> {
        SPolygon::new(r.corners().to_vec())
    }
}
