use std::ops::{Index, IndexMut};

use crate::common::error::{QRError, QRResult};

use super::geometry::Point;

// Homographic projection matrix to map logical qr onto image qr
// Stored as the first 8 entries of a 3x3 matrix whose last entry is fixed to 1:
// x' = (h0*u + h1*v + h2) / (h6*u + h7*v + 1)
// y' = (h3*u + h4*v + h5) / (h6*u + h7*v + 1)
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Homography(pub [f64; 8]);

impl Index<usize> for Homography {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for Homography {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl Homography {
    /// Compute homography matrix from 4 point pairs:
    /// source[i] -> destination[i]
    pub fn compute(src: [(f64, f64); 4], dst: [(f64, f64); 4]) -> QRResult<Self> {
        // Two rows per point pair
        let mut a = [[0.0_f64; 8]; 8];
        let mut b = [0.0_f64; 8];

        for i in 0..4 {
            let (x, y) = src[i];
            let (xp, yp) = dst[i];

            a[2 * i] = [-x, -y, -1.0, 0.0, 0.0, 0.0, xp * x, xp * y];
            b[2 * i] = -xp;

            a[2 * i + 1] = [0.0, 0.0, 0.0, -x, -y, -1.0, yp * x, yp * y];
            b[2 * i + 1] = -yp;
        }

        let h = Self::solve_linear_system(a, b)?;

        Ok(Self(h))
    }

    /// Maps the unit square scaled to w x h onto the quadrilateral `rect`, whose corners are
    /// listed clockwise from the one that (0, 0) maps to.
    pub fn from_rect(rect: &[Point; 4], w: f64, h: f64) -> QRResult<Self> {
        let src = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
        let dst = rect.map(|p| (p.x as f64, p.y as f64));
        Self::compute(src, dst)
    }

    /// Solve 8x8 linear system Ax = b by Gaussian elimination
    fn solve_linear_system(mut a: [[f64; 8]; 8], mut b: [f64; 8]) -> QRResult<[f64; 8]> {
        // Forward elimination
        for i in 0..8 {
            // Partial pivot
            let mut max_row = i;
            let mut max_val = a[i][i].abs();
            #[allow(clippy::needless_range_loop)]
            for r in (i + 1)..8 {
                if a[r][i].abs() > max_val {
                    max_val = a[r][i].abs();
                    max_row = r;
                }
            }
            if max_row != i {
                a.swap(i, max_row);
                b.swap(i, max_row);
            }

            if a[i][i].abs() < f64::EPSILON {
                return Err(QRError::SingularMatrix);
            }

            let pivot = a[i][i];
            for c in i..8 {
                a[i][c] /= pivot;
            }
            b[i] /= pivot;

            for r in (i + 1)..8 {
                let factor = a[r][i];
                for c in i..8 {
                    a[r][c] -= factor * a[i][c];
                }
                b[r] -= factor * b[i];
            }
        }

        // Back substitution
        let mut x = [0.0; 8];
        for r in (0..8).rev() {
            let mut sum = 0.0;
            #[allow(clippy::needless_range_loop)]
            for c in (r + 1)..8 {
                sum += a[r][c] * x[c];
            }
            x[r] = (b[r] - sum) / a[r][r];
        }
        Ok(x)
    }

    /// Map a point (u, v) from grid space to the nearest image pixel
    pub fn map(&self, u: f64, v: f64) -> QRResult<Point> {
        let xp = self[0] * u + self[1] * v + self[2];
        let yp = self[3] * u + self[4] * v + self[5];
        let w = self[6] * u + self[7] * v + 1.0;

        if w.abs() <= f64::EPSILON {
            return Err(QRError::PointAtInfinity);
        }

        let x = (xp / w).round();
        let y = (yp / w).round();

        let range = i32::MIN as f64..=i32::MAX as f64;
        if !range.contains(&x) || !range.contains(&y) {
            return Err(QRError::PointAtInfinity);
        }

        Ok(Point { x: x as i32, y: y as i32 })
    }

    /// Inverse mapping from image space back to grid space
    pub fn unmap(&self, p: &Point) -> (f64, f64) {
        let (x, y) = (p.x as f64, p.y as f64);
        let den = (-self[0] * self[7] + self[1] * self[6]) * y
            + (self[3] * self[7] - self[4] * self[6]) * x
            + self[0] * self[4]
            - self[1] * self[3];
        let u = -(self[1] * (y - self[5]) - self[2] * self[7] * y
            + (self[5] * self[7] - self[4]) * x
            + self[2] * self[4])
            / den;
        let v = (self[0] * (y - self[5]) - self[2] * self[6] * y
            + (self[5] * self[6] - self[3]) * x
            + self[2] * self[3])
            / den;

        (u, v)
    }
}
