//! One-sided (Hestenes) Jacobi singular value decomposition of a 3×3 matrix.

use nalgebra::{Matrix3, Vector3};

const MAX_SWEEPS: usize = 64;
const ORTHOGONALITY_EPSILON: f64 = 1e-15;

/// `A = U · diag(singular_values) · Vᵀ` with `U`, `V` orthogonal and the
/// singular values non-negative and sorted in descending order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Svd3 {
    pub u: Matrix3<f64>,
    pub singular_values: Vector3<f64>,
    pub v: Matrix3<f64>,
}

impl Svd3 {
    pub fn recompose(&self) -> Matrix3<f64> {
        self.u * Matrix3::from_diagonal(&self.singular_values) * self.v.transpose()
    }
}

pub fn svd3(a: &Matrix3<f64>) -> Svd3 {
    let mut w = *a;
    let mut v = Matrix3::identity();

    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            let alpha = w.column(p).norm_squared();
            let beta = w.column(q).norm_squared();
            let gamma = w.column(p).dot(&w.column(q));

            if gamma == 0.0 || gamma.abs() <= ORTHOGONALITY_EPSILON * (alpha * beta).sqrt() {
                continue;
            }
            rotated = true;

            let zeta = (beta - alpha) / (2.0 * gamma);
            let sign = if zeta >= 0.0 { 1.0 } else { -1.0 };
            let t = sign / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
            let c = 1.0 / (1.0 + t * t).sqrt();
            let s = c * t;

            rotate_columns(&mut w, p, q, c, s);
            rotate_columns(&mut v, p, q, c, s);
        }
        if !rotated {
            break;
        }
    }

    let mut order = [0usize, 1, 2];
    let norms = Vector3::new(w.column(0).norm(), w.column(1).norm(), w.column(2).norm());
    order.sort_by(|&i, &j| norms[j].total_cmp(&norms[i]));

    let mut u = Matrix3::zeros();
    let mut v_sorted = Matrix3::zeros();
    let mut singular_values = Vector3::zeros();
    for (dst, &src) in order.iter().enumerate() {
        singular_values[dst] = norms[src];
        v_sorted.set_column(dst, &v.column(src));
        if norms[src] > 0.0 {
            u.set_column(dst, &(w.column(src) / norms[src]));
        }
    }

    let tolerance = 1e-12 * singular_values[0].max(1.0);
    complete_basis(&mut u, &singular_values, tolerance);

    Svd3 {
        u,
        singular_values,
        v: v_sorted,
    }
}

fn rotate_columns(m: &mut Matrix3<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..3 {
        let mp = m[(k, p)];
        let mq = m[(k, q)];
        m[(k, p)] = c * mp - s * mq;
        m[(k, q)] = s * mp + c * mq;
    }
}

/// Replaces columns of `u` belonging to vanishing singular values so that
/// `u` stays orthonormal for rank-deficient input.
fn complete_basis(u: &mut Matrix3<f64>, singular_values: &Vector3<f64>, tolerance: f64) {
    if singular_values[0] <= tolerance {
        *u = Matrix3::identity();
        return;
    }
    if singular_values[1] <= tolerance {
        let u0 = u.column(0).into_owned();
        u.set_column(1, &any_orthogonal(&u0));
    }
    if singular_values[2] <= tolerance {
        let u0 = u.column(0).into_owned();
        let u1 = u.column(1).into_owned();
        u.set_column(2, &u0.cross(&u1).normalize());
    }
}

fn any_orthogonal(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    (helper - v * v.dot(&helper)).normalize()
}
