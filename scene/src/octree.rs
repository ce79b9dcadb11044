/*!
Octree voxelization of point clouds.

The cloud's bounding box is enclosed in a cube whose edge is `leaf_edge`
doubled until it covers the largest extent. The cube is split into octants
recursively; every occupied leaf (edge equal to `leaf_edge`) yields its center.

Output order is deterministic: octants are visited x-major, then y, then z,
lower half first.
*/

use pbd::{Real, Vec3};

/// One center per occupied leaf. Non-finite points are ignored.
pub fn voxelize(points: &[Vec3], leaf_edge: Real) -> Vec<Vec3> {
    let finite: Vec<Vec3> = points.iter().copied().filter(|p| p.iter().all(|v| v.is_finite())).collect();
    if finite.is_empty() || !(leaf_edge > 0.0 && leaf_edge.is_finite()) {
        return Vec::new();
    }

    let (min, max) = bounds(&finite);
    let extent = (max - min).max();

    let mut edge = leaf_edge;
    while edge < extent {
        edge *= 2.0;
    }

    let mut centers = Vec::new();
    subdivide(min, edge, leaf_edge, finite, &mut centers);
    centers
}

fn bounds(points: &[Vec3]) -> (Vec3, Vec3) {
    let mut min = points[0];
    let mut max = points[0];
    for p in &points[1..] {
        min = min.inf(p);
        max = max.sup(p);
    }
    (min, max)
}

fn subdivide(origin: Vec3, edge: Real, leaf_edge: Real, points: Vec<Vec3>, out: &mut Vec<Vec3>) {
    if points.is_empty() {
        return;
    }
    // Doubling from `leaf_edge` makes halving land back on it; the slack absorbs rounding.
    if edge <= leaf_edge * 1.5 {
        out.push(origin + Vec3::repeat(edge * 0.5));
        return;
    }

    let half = edge * 0.5;
    let mid = origin + Vec3::repeat(half);

    let mut octants: [Vec<Vec3>; 8] = Default::default();
    for p in points {
        let slot =
            (usize::from(p.x >= mid.x) << 2) | (usize::from(p.y >= mid.y) << 1) | usize::from(p.z >= mid.z);
        octants[slot].push(p);
    }

    for (slot, bucket) in octants.into_iter().enumerate() {
        let corner = Vec3::new(
            if slot & 4 != 0 { mid.x } else { origin.x },
            if slot & 2 != 0 { mid.y } else { origin.y },
            if slot & 1 != 0 { mid.z } else { origin.z },
        );
        subdivide(corner, half, leaf_edge, bucket, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_invalid_input_yields_nothing() {
        assert!(voxelize(&[], 0.1).is_empty());
        assert!(voxelize(&[Vec3::zeros()], 0.0).is_empty());
        assert!(voxelize(&[Vec3::new(Real::NAN, 0.0, 0.0)], 0.1).is_empty());
    }

    #[test]
    fn single_point_is_one_leaf() {
        let centers = voxelize(&[Vec3::new(1.0, 1.0, 1.0)], 0.2);
        assert_eq!(centers.len(), 1);
        assert!((centers[0] - Vec3::new(1.1, 1.1, 1.1)).norm() < 1.0e-12);
    }

    #[test]
    fn nearby_points_share_a_leaf() {
        let points = [
            Vec3::new(0.01, 0.01, 0.01),
            Vec3::new(0.02, 0.03, 0.01),
            Vec3::new(0.05, 0.05, 0.05),
            Vec3::new(0.95, 0.01, 0.01),
        ];
        let centers = voxelize(&points, 0.1);
        assert_eq!(centers.len(), 2);
        // Lower-x octants come first.
        assert!(centers[0].x < centers[1].x);
    }

    #[test]
    fn leaves_cover_their_points() {
        let points: Vec<Vec3> = (0..200)
            .map(|k| {
                let t = k as Real * 0.37;
                Vec3::new(t.sin(), (t * 1.3).cos(), (t * 0.7).sin() * 0.5)
            })
            .collect();
        let leaf = 0.15;
        let centers = voxelize(&points, leaf);

        assert!(!centers.is_empty());
        assert!(centers.len() <= points.len());
        for p in &points {
            let covered = centers
                .iter()
                .any(|c| (p - c).iter().all(|d| d.abs() <= leaf * 0.5 + 1.0e-9));
            assert!(covered, "{p:?} not covered");
        }
        // Distinct leaves.
        for (i, a) in centers.iter().enumerate() {
            for b in &centers[i + 1..] {
                assert!((a - b).norm() > leaf * 0.5);
            }
        }
    }

    #[test]
    fn output_is_deterministic() {
        let points = [Vec3::new(0.3, 0.1, 0.0), Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.1, 0.3, 0.2)];
        let reversed: Vec<Vec3> = points.iter().rev().copied().collect();
        assert_eq!(voxelize(&points, 0.1), voxelize(&reversed, 0.1));
    }
}
