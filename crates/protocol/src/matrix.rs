use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::types::{Point, Rect};

/// Affine 3×3 matrix, column-major: `[a, b, 0, c, d, 0, tx, ty, 1]`.
///
/// A point maps as `x' = a·x + c·y + tx`, `y' = b·x + d·y + ty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3(pub [f64; 9]);

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    pub fn from_translation(tx: f64, ty: f64) -> Mat3 {
        Mat3([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, tx, ty, 1.0])
    }

    pub fn from_scaling(sx: f64, sy: f64) -> Mat3 {
        Mat3([sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0])
    }

    /// Matrix mapping `from` onto `to`. `None` when `from` has no area,
    /// which would otherwise put infinities into the scale terms.
    pub fn between_rects(from: &Rect, to: &Rect) -> Option<Mat3> {
        if from.w == 0.0 || from.h == 0.0 {
            return None;
        }
        let sx = to.w / from.w;
        let sy = to.h / from.h;
        let m = Mat3([
            sx,
            0.0,
            0.0,
            0.0,
            sy,
            0.0,
            to.x - from.x * sx,
            to.y - from.y * sy,
            1.0,
        ]);
        m.is_finite().then_some(m)
    }

    /// `self · rhs`; `rhs` is applied first.
    pub fn multiply(&self, rhs: &Mat3) -> Mat3 {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [0.0; 9];
        for col in 0..3 {
            for row in 0..3 {
                out[col * 3 + row] = (0..3).map(|k| a[k * 3 + row] * b[col * 3 + k]).sum();
            }
        }
        Mat3(out)
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0] * (m[8] * m[4] - m[5] * m[7]) + m[1] * (-m[8] * m[3] + m[5] * m[6])
            + m[2] * (m[7] * m[3] - m[4] * m[6])
    }

    pub fn invert(&self) -> Option<Mat3> {
        let m = &self.0;
        let (a00, a01, a02) = (m[0], m[1], m[2]);
        let (a10, a11, a12) = (m[3], m[4], m[5]);
        let (a20, a21, a22) = (m[6], m[7], m[8]);

        let b01 = a22 * a11 - a12 * a21;
        let b11 = -a22 * a10 + a12 * a20;
        let b21 = a21 * a10 - a11 * a20;

        let det = a00 * b01 + a01 * b11 + a02 * b21;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        let out = Mat3([
            b01 * inv,
            (-a22 * a01 + a02 * a21) * inv,
            (a12 * a01 - a02 * a11) * inv,
            b11 * inv,
            (a22 * a00 - a02 * a20) * inv,
            (-a12 * a00 + a02 * a10) * inv,
            b21 * inv,
            (-a21 * a00 + a01 * a20) * inv,
            (a11 * a00 - a01 * a10) * inv,
        ]);
        out.is_finite().then_some(out)
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    pub fn transform_point(&self, p: Point) -> Point {
        let m = &self.0;
        Point::new(m[0] * p.x + m[3] * p.y + m[6], m[1] * p.x + m[4] * p.y + m[7])
    }

    pub fn transform_rect(&self, r: &Rect) -> Rect {
        let m = &self.0;
        Rect::new(
            r.x * m[0] + r.y * m[3] + m[6],
            r.x * m[1] + r.y * m[4] + m[7],
            r.w * m[0] + r.h * m[3],
            r.w * m[1] + r.h * m[4],
        )
        .normalized()
    }

    /// Horizontal scale term.
    pub fn scale_x(&self) -> f64 {
        self.0[0]
    }

    /// Vertical scale term.
    pub fn scale_y(&self) -> f64 {
        self.0[4]
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Mat3::IDENTITY
    }
}

impl Mul for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Mat3 {
        self.multiply(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn translation_then_scaling_order() {
        let t = Mat3::from_translation(10.0, 0.0);
        let s = Mat3::from_scaling(2.0, 1.0);
        // s applied first, then t
        let p = (t * s).transform_point(Point::new(1.0, 1.0));
        assert!(approx(p, Point::new(12.0, 1.0)));
        let p = (s * t).transform_point(Point::new(1.0, 1.0));
        assert!(approx(p, Point::new(22.0, 1.0)));
    }

    #[test]
    fn inverse_round_trips() {
        let m = Mat3::from_translation(-3.5, 7.0) * Mat3::from_scaling(4.0, -0.25);
        let inv = m.invert().unwrap_or_default();
        for &(x, y) in &[(0.0, 0.0), (1.0, -2.0), (1234.5, 0.001)] {
            let p = Point::new(x, y);
            assert!(approx(m.transform_point(inv.transform_point(p)), p));
            assert!(approx(inv.transform_point(m.transform_point(p)), p));
        }
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Mat3::from_scaling(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn between_rects_maps_corners() {
        let from = Rect::new(10.0, 0.0, 20.0, 5.0);
        let to = Rect::new(0.0, 0.0, 400.0, 100.0);
        let m = Mat3::between_rects(&from, &to).unwrap_or_default();
        assert!(approx(m.transform_point(Point::new(10.0, 0.0)), Point::new(0.0, 0.0)));
        assert!(approx(
            m.transform_point(Point::new(30.0, 5.0)),
            Point::new(400.0, 100.0)
        ));
        assert_eq!(m.transform_rect(&from), to);
    }

    #[test]
    fn between_degenerate_rects_is_none() {
        let to = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(Mat3::between_rects(&Rect::new(0.0, 0.0, 0.0, 1.0), &to).is_none());
        assert!(Mat3::between_rects(&Rect::new(0.0, 0.0, 1.0, 0.0), &to).is_none());
    }

    #[test]
    fn flipped_rect_is_normalized() {
        let flip = Mat3::from_translation(0.0, 100.0) * Mat3::from_scaling(1.0, -10.0);
        let r = flip.transform_rect(&Rect::new(0.0, 2.0, 5.0, 1.0));
        assert_eq!(r, Rect::new(0.0, 70.0, 5.0, 10.0));
    }
}
