use std::borrow::Borrow;
use std::ops::{Add, Mul};

use ordered_float::NotNan;

use crate::geometry::DTransformation;

/// The matrix form of [`DTransformation`].
/// [read more](https://pages.mtu.edu/~shene/COURSES/cs3621/NOTES/geometry/geo-tran.html)
#[derive(Clone, Debug, PartialEq)]
pub struct Transformation {
    matrix: [[NotNan<f64>; 3]; 3],
}

impl Transformation {
    /// Creates a transformation with no effect.
    pub const fn empty() -> Self {
        Self {
            matrix: EMPTY_MATRIX,
        }
    }

    pub fn from_translation((tx, ty): (f64, f64)) -> Self {
        Self {
            matrix: transl_m((tx, ty)),
        }
    }

    pub fn from_rotation(angle: f64) -> Self {
        Self {
            matrix: rot_m(angle),
        }
    }

    /// Applies a rotation to `self`.
    pub fn rotate(mut self, angle: f64) -> Self {
        self.matrix = dot_prod(&rot_m(angle), &self.matrix);
        self
    }

    /// Applies a translation to `self`.
    pub fn translate(mut self, (tx, ty): (f64, f64)) -> Self {
        self.matrix = dot_prod(&transl_m((tx, ty)), &self.matrix);
        self
    }

    /// Applies a rotation followed by a translation to `self`.
    pub fn rotate_translate(mut self, angle: f64, (tx, ty): (f64, f64)) -> Self {
        self.matrix = dot_prod(&rot_transl_m(angle, (tx, ty)), &self.matrix);
        self
    }

    /// Applies `other` to `self`.
    pub fn transform(mut self, other: &Self) -> Self {
        self.matrix = dot_prod(&other.matrix, &self.matrix);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.matrix == EMPTY_MATRIX
    }

    pub fn matrix(&self) -> &[[NotNan<f64>; 3]; 3] {
        &self.matrix
    }

    pub fn decompose(&self) -> DTransformation {
        let m = self.matrix();
        let angle = m[1][0].atan2(m[0][0].into_inner());
        let (tx, ty) = (m[0][2].into_inner(), m[1][2].into_inner());
        DTransformation::new(angle, (tx, ty))
    }
}

impl<T> From<T> for Transformation
where
    T: Borrow<DTransformation>,
{
    fn from(dt: T) -> Self {
        let rot = dt.borrow().rotation();
        let transl = dt.borrow().translation();
        Self {
            matrix: rot_transl_m(rot, transl),
        }
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::empty()
    }
}

const _0: NotNan<f64> = unsafe { NotNan::new_unchecked(0.0) };
const _1: NotNan<f64> = unsafe { NotNan::new_unchecked(1.0) };

const EMPTY_MATRIX: [[NotNan<f64>; 3]; 3] = [[_1, _0, _0], [_0, _1, _0], [_0, _0, _1]];

fn rot_m(angle: f64) -> [[NotNan<f64>; 3]; 3] {
    let (sin, cos) = angle.sin_cos();
    let cos = NotNan::new(cos).expect("cos is NaN");
    let sin = NotNan::new(sin).expect("sin is NaN");

    [[cos, -sin, _0], [sin, cos, _0], [_0, _0, _1]]
}

fn transl_m((tx, ty): (f64, f64)) -> [[NotNan<f64>; 3]; 3] {
    let h = NotNan::new(tx).expect("tx is NaN");
    let k = NotNan::new(ty).expect("ty is NaN");

    [[_1, _0, h], [_0, _1, k], [_0, _0, _1]]
}

//rotation followed by translation
fn rot_transl_m(angle: f64, (tx, ty): (f64, f64)) -> [[NotNan<f64>; 3]; 3] {
    let (sin, cos) = angle.sin_cos();
    let cos = NotNan::new(cos).expect("cos is NaN");
    let sin = NotNan::new(sin).expect("sin is NaN");
    let h = NotNan::new(tx).expect("tx is NaN");
    let k = NotNan::new(ty).expect("ty is NaN");

    [[cos, -sin, h], [sin, cos, k], [_0, _0, _1]]
}

#[inline(always)]
fn dot_prod<T>(l: &[[T; 3]; 3], r: &[[T; 3]; 3]) -> [[T; 3]; 3]
where
    T: Add<Output = T> + Mul<Output = T> + Copy + Default,
{
    [
        [
            l[0][0] * r[0][0] + l[0][1] * r[1][0] + l[0][2] * r[2][0],
            l[0][0] * r[0][1] + l[0][1] * r[1][1] + l[0][2] * r[2][1],
            l[0][0] * r[0][2] + l[0][1] * r[1][2] + l[0][2] * r[2][2],
        ],
        [
            l[1][0] * r[0][0] + l[1][1] * r[1][0] + l[1][2] * r[2][0],
            l[1][0] * r[0][1] + l[1][1] * r[1][1] + l[1][2] * r[2][1],
            l[1][0] * r[0][2] + l[1][1] * r[1][2] + l[1][2] * r[2][2],
        ],
        [
            l[2][0] * r[0][0] + l[2][1] * r[1][0] + l[2][2] * r[2][0],
            l[2][0] * r[0][1] + l[2][1] * r[1][1] + l[2][2] * r[2][1],
            l[2][0] * r[0][2] + l[2][1] * r[1][2] + l[2][2] * r[2][2],
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::{F64Margin, FloatMargin, approx_eq};
    use std::f64::consts::PI;

    #[test]
    fn test_decompose() {
        for dt in data() {
            assert_match(dt, dt.compose().decompose());
        }
    }

    #[test]
    fn test_compose_order() {
        //rotation followed by translation in one matrix must match two chained matrices
        for dt in data() {
            let chained = Transformation::empty()
                .rotate(dt.rotation())
                .translate(dt.translation());
            assert_match(dt, chained.decompose());
        }
    }

    fn assert_match(dt1: DTransformation, dt2: DTransformation) {
        //normalize angles modulo 2π for a proper comparison
        let diff = (dt1.rotation() - dt2.rotation()) % (2.0 * PI);
        let angle_matches =
            diff.abs() <= (2.0 * PI * 1e-9) || (2.0 * PI - diff.abs()) <= (2.0 * PI * 1e-9);
        let (x1, y1) = dt1.translation();
        let (x2, y2) = dt2.translation();
        let x_matches = approx_eq!(f64, x1, x2, F64Margin::default().epsilon(1e-9).ulps(4));
        let y_matches = approx_eq!(f64, y1, y2, F64Margin::default().epsilon(1e-9).ulps(4));

        assert!(
            angle_matches,
            "angles do not match: {} != {}",
            dt1.rotation(),
            dt2.rotation()
        );
        assert!(x_matches, "x translations do not match: {x1} != {x2}");
        assert!(y_matches, "y translations do not match: {y1} != {y2}");
    }

    fn data() -> [DTransformation; 8] {
        [
            DTransformation::new(0.0, (0.0, 0.0)),
            DTransformation::new(1.0, (2.0, 3.0)),
            DTransformation::new(-1.0, (-2.0, -3.0)),
            DTransformation::new(3.14, (1.5, -1.5)),
            DTransformation::new(-3.14, (-1.5, 1.5)),
            DTransformation::new(0.0, (100.0, -100.0)),
            DTransformation::new(2.0, (1.0, 1.0)),
            DTransformation::new(-2.0, (-1.0, -1.0)),
        ]
    }
}
