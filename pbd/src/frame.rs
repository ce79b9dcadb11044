/*!
Centroid and principal-axis frames for particle clusters.

A frame is a centroid plus an orthonormal right-handed basis whose columns are
the principal axes of the cluster's offset covariance, ordered by decreasing
spread. Eigenvectors are only defined up to sign and, for repeated
eigenvalues, up to a rotation inside the repeated subspace, so every estimate
is made relative to a previous basis:

- axes that match a different previous axis better are re-ordered,
- axes pointing against their previous axis are re-signed,
- axes inside a repeated subspace are taken from the previous basis.

The caller keeps the previous basis across solver passes; at construction the
identity serves as the reference.
*/

use nalgebra as na;

use crate::settings::FrameTolerances;
use crate::types::{Mat3, Quat, Real, Vec3};

/// Smallest norm accepted when normalizing a constructed axis.
const AXIS_EPS: Real = 1.0e-12;

/// Centroid plus principal basis (columns are axes).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub centroid: Vec3,
    pub basis: Mat3,
}

impl Frame {
    /// Map a local offset (expressed in this basis) to world space.
    #[inline]
    pub fn to_world(&self, local: &Vec3) -> Vec3 {
        self.basis * local + self.centroid
    }

    /// Express a world point as an offset in this basis.
    #[inline]
    pub fn to_local(&self, world: &Vec3) -> Vec3 {
        self.basis.transpose() * (world - self.centroid)
    }
}

/// What had to be repaired to keep a basis continuous with its predecessor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AxisCorrection {
    /// Number of axes that were re-signed.
    pub flipped: u8,
    /// Axes were re-ordered to follow the previous basis.
    pub permuted: bool,
    /// The spectrum had repeated eigenvalues; some axes come from the previous basis.
    pub degenerate: bool,
}

impl AxisCorrection {
    /// True when a sign flip or a permutation was repaired.
    #[inline]
    pub fn is_repair(&self) -> bool {
        self.flipped > 0 || self.permuted
    }
}

/// Mean of the given points, `None` when empty.
pub fn centroid<I>(points: I) -> Option<Vec3>
where
    I: IntoIterator<Item = Vec3>,
{
    let mut sum = Vec3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p;
        count += 1;
    }
    (count > 0).then(|| sum / count as Real)
}

/// Covariance of the points about `centroid`, normalized by the point count.
pub fn covariance<I>(points: I, centroid: &Vec3) -> Mat3
where
    I: IntoIterator<Item = Vec3>,
{
    let mut cov = Mat3::zeros();
    let mut count = 0usize;
    for p in points {
        let r = p - centroid;
        cov += r * r.transpose();
        count += 1;
    }
    if count > 0 {
        cov /= count as Real;
    }
    cov
}

/// Estimate the frame of a cluster, continuing from `previous_basis`.
pub fn estimate<I>(points: I, previous_basis: &Mat3, tol: &FrameTolerances) -> Option<(Frame, AxisCorrection)>
where
    I: IntoIterator<Item = Vec3> + Clone,
{
    let centroid = centroid(points.clone())?;
    let cov = covariance(points, &centroid);
    let (basis, correction) = principal_basis(&cov, previous_basis, tol);
    Some((Frame { centroid, basis }, correction))
}

/// Right-handed principal basis of a symmetric covariance matrix.
///
/// Columns are ordered by decreasing eigenvalue, then repaired against `previous`
/// (see module docs). Non-finite or vanishing covariances return `previous`.
pub fn principal_basis(cov: &Mat3, previous: &Mat3, tol: &FrameTolerances) -> (Mat3, AxisCorrection) {
    let degenerate = AxisCorrection {
        degenerate: true,
        ..AxisCorrection::default()
    };

    if cov.iter().any(|v| !v.is_finite()) {
        return (*previous, degenerate);
    }

    let eig = cov.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));
    let values = order.map(|i| eig.eigenvalues[i]);
    let vectors = order.map(|i| eig.eigenvectors.column(i).into_owned());

    let scale = values[0].abs().max(values[2].abs());
    if !(scale > Real::MIN_POSITIVE) {
        return (*previous, degenerate);
    }

    let top_repeated = (values[0] - values[1]) / scale <= tol.degenerate_ratio;
    let bottom_repeated = (values[1] - values[2]) / scale <= tol.degenerate_ratio;

    let result = match (top_repeated, bottom_repeated) {
        (true, true) => None,
        (true, false) => complete_from_previous(vectors[2], previous, tol),
        (false, true) => complete_from_previous(vectors[0], previous, tol),
        (false, false) => right_handed(vectors[0], vectors[1])
            .map(|axes| align_to_previous(axes, previous, tol)),
    };

    result.unwrap_or((*previous, degenerate))
}

/// Rotation quaternion of an orthonormal basis (or of a product of such bases).
pub fn basis_to_quat(basis: &Mat3) -> Quat {
    let mut q = Quat::from_rotation_matrix(&na::Rotation3::from_matrix_unchecked(*basis));
    q.renormalize();
    q
}

/// `x = e0`, `z = x × e1`, `y = z × x`.
fn right_handed(e0: Vec3, e1: Vec3) -> Option<[Vec3; 3]> {
    let x = e0.try_normalize(AXIS_EPS)?;
    let z = x.cross(&e1).try_normalize(AXIS_EPS)?;
    let y = z.cross(&x);
    Some([x, y, z])
}

fn columns(m: &Mat3) -> [Vec3; 3] {
    [0, 1, 2].map(|j| m.column(j).into_owned())
}

/// Index of the previous axis best aligned (ignoring sign) with `axis`.
fn best_match(axis: &Vec3, previous: &[Vec3; 3]) -> usize {
    let mut best = 0;
    for j in 1..3 {
        if axis.dot(&previous[j]).abs() > axis.dot(&previous[best]).abs() {
            best = j;
        }
    }
    best
}

fn align_to_previous(candidate: [Vec3; 3], previous: &Mat3, tol: &FrameTolerances) -> (Mat3, AxisCorrection) {
    let prev = columns(previous);
    let mut correction = AxisCorrection::default();

    let assignment = candidate.map(|axis| best_match(&axis, &prev));
    let is_permutation = assignment[0] != assignment[1]
        && assignment[1] != assignment[2]
        && assignment[0] != assignment[2];

    let mut axes = candidate;
    if is_permutation && assignment != [0, 1, 2] {
        for (i, &slot) in assignment.iter().enumerate() {
            axes[slot] = candidate[i];
        }
        correction.permuted = true;
    }

    for (axis, reference) in axes.iter_mut().zip(prev.iter()) {
        if axis.dot(reference) < tol.flip_dot {
            *axis = -*axis;
            correction.flipped += 1;
        }
    }

    // Re-signing or re-ordering can leave a left-handed set; rebuild z and y from x and y.
    let x = axes[0];
    let z = match x.cross(&axes[1]).try_normalize(AXIS_EPS) {
        Some(z) => z,
        None => return (*previous, AxisCorrection { degenerate: true, ..correction }),
    };
    let y = z.cross(&x);

    (Mat3::from_columns(&[x, y, z]), correction)
}

/// Basis from one well-defined axis plus the previous axes projected into its normal plane.
fn complete_from_previous(distinct: Vec3, previous: &Mat3, tol: &FrameTolerances) -> Option<(Mat3, AxisCorrection)> {
    let prev = columns(previous);
    let mut correction = AxisCorrection {
        degenerate: true,
        ..AxisCorrection::default()
    };

    let mut a = distinct.try_normalize(AXIS_EPS)?;
    let k = best_match(&a, &prev);
    if a.dot(&prev[k]) < tol.flip_dot {
        a = -a;
        correction.flipped += 1;
    }

    let (m, n) = ((k + 1) % 3, (k + 2) % 3);
    let project = |v: &Vec3| (v - a * a.dot(v)).try_normalize(AXIS_EPS);
    let u = match project(&prev[m]) {
        Some(u) => u,
        // prev[m] lies along `a`: derive it from prev[n] instead (n × k = m cyclically).
        None => project(&prev[n])?.cross(&a),
    };

    let mut cols = [Vec3::zeros(); 3];
    cols[k] = a;
    cols[m] = u;
    // (k, m, n) is a cyclic permutation of (0, 1, 2), so col_k × col_m = col_n.
    cols[n] = a.cross(&u);

    Some((Mat3::from_columns(&cols), correction))
}
