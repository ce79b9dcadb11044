//! Regular particle lattices for solid primitives.

use pbd::{Real, Vec3};

/// Slack so that dimensions that are exact multiples of the spacing are not
/// shortened by floating-point division.
const COUNT_SLACK: Real = 1.0e-6;

/// Particles per axis for a span filled at `spacing`; at least one.
fn count_along(span: Real, spacing: Real) -> usize {
    ((span / spacing) + COUNT_SLACK).floor().max(1.0) as usize
}

/// Centers filling the box `[origin, origin + dimensions]`, first center at `origin + spacing/2`.
///
/// Order is x-major (x outermost, z innermost).
pub fn solid_cube(origin: Vec3, dimensions: Vec3, spacing: Real) -> Vec<Vec3> {
    let (nx, ny, nz) = (
        count_along(dimensions.x, spacing),
        count_along(dimensions.y, spacing),
        count_along(dimensions.z, spacing),
    );
    let first = origin + Vec3::repeat(spacing * 0.5);

    let mut centers = Vec::with_capacity(nx * ny * nz);
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                centers.push(first + Vec3::new(i as Real, j as Real, k as Real) * spacing);
            }
        }
    }
    centers
}

/// Lattice points at `spacing` around `center` whose distance to it is at most `radius`.
///
/// Always contains `center` itself.
pub fn solid_sphere(center: Vec3, radius: Real, spacing: Real) -> Vec<Vec3> {
    let reach = ((radius / spacing) + COUNT_SLACK).floor().max(0.0) as i64;
    let limit = radius + spacing * COUNT_SLACK;

    let mut centers = Vec::new();
    for i in -reach..=reach {
        for j in -reach..=reach {
            for k in -reach..=reach {
                let offset = Vec3::new(i as Real, j as Real, k as Real) * spacing;
                if offset.norm() <= limit {
                    centers.push(center + offset);
                }
            }
        }
    }
    centers
}
