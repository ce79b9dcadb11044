//! Body descriptions: a shape, a particle size and mass, and a collision group.

use pbd::{GroupId, Real, Vec3};

use crate::error::SceneError;
use crate::{lattice, octree};

#[derive(Clone, Debug, PartialEq)]
pub enum BodyShape {
    /// Axis-aligned box with its minimum corner at `origin`.
    SolidCube { origin: Vec3, dimensions: Vec3 },
    SolidSphere { center: Vec3, radius: Real },
    /// Raw points, voxelized at the particle size and shifted by `offset`.
    PointCloud { offset: Vec3, points: Vec<Vec3> },
}

/// Whether a dynamic body is held together by shape matching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyKind {
    #[default]
    Rigid,
    /// Independent particles sharing a group (granular material).
    Loose,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodySpec {
    pub shape: BodyShape,
    /// Particle diameter and lattice spacing.
    pub particle_size: Real,
    /// Mass of each particle; `<= 0` makes the whole body static.
    pub particle_mass: Real,
    pub group: GroupId,
    pub kind: BodyKind,
}

impl BodySpec {
    pub fn solid_cube(origin: Vec3, dimensions: Vec3, particle_size: Real, particle_mass: Real, group: GroupId) -> Self {
        Self {
            shape: BodyShape::SolidCube { origin, dimensions },
            particle_size,
            particle_mass,
            group,
            kind: BodyKind::Rigid,
        }
    }

    pub fn solid_sphere(center: Vec3, radius: Real, particle_size: Real, particle_mass: Real, group: GroupId) -> Self {
        Self {
            shape: BodyShape::SolidSphere { center, radius },
            particle_size,
            particle_mass,
            group,
            kind: BodyKind::Rigid,
        }
    }

    pub fn point_cloud(
        offset: Vec3,
        points: Vec<Vec3>,
        particle_size: Real,
        particle_mass: Real,
        group: GroupId,
    ) -> Self {
        Self {
            shape: BodyShape::PointCloud { offset, points },
            particle_size,
            particle_mass,
            group,
            kind: BodyKind::Rigid,
        }
    }

    pub fn loose(mut self) -> Self {
        self.kind = BodyKind::Loose;
        self
    }

    pub fn is_static(&self) -> bool {
        !(self.particle_mass > 0.0)
    }

    /// Particle centers for this body. `body` is only used in error messages.
    pub fn particle_centers(&self, body: usize) -> Result<Vec<Vec3>, SceneError> {
        let invalid = |reason| SceneError::InvalidBody { body, reason };

        if !(self.particle_size > 0.0 && self.particle_size.is_finite()) {
            return Err(invalid("particle size must be finite and positive"));
        }
        if self.particle_mass.is_nan() {
            return Err(invalid("particle mass is NaN"));
        }

        let centers = match &self.shape {
            BodyShape::SolidCube { origin, dimensions } => {
                if !dimensions.iter().all(|d| d.is_finite() && *d > 0.0) {
                    return Err(invalid("cube dimensions must be finite and positive"));
                }
                lattice::solid_cube(*origin, *dimensions, self.particle_size)
            }
            BodyShape::SolidSphere { center, radius } => {
                if !(radius.is_finite() && *radius >= 0.0) {
                    return Err(invalid("sphere radius must be finite and non-negative"));
                }
                lattice::solid_sphere(*center, *radius, self.particle_size)
            }
            BodyShape::PointCloud { offset, points } => octree::voxelize(points, self.particle_size)
                .into_iter()
                .map(|c| c + offset)
                .collect(),
        };

        if centers.is_empty() {
            return Err(invalid("shape produced no particles"));
        }
        Ok(centers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_centers_come_from_lattice() {
        let body = BodySpec::solid_cube(Vec3::zeros(), Vec3::repeat(0.2), 0.1, 1.0, 0);
        assert_eq!(body.particle_centers(0).unwrap().len(), 8);
        assert!(!body.is_static());
        assert_eq!(body.kind, BodyKind::Rigid);
    }

    #[test]
    fn point_cloud_is_offset() {
        let body = BodySpec::point_cloud(Vec3::new(0.0, 0.0, 5.0), vec![Vec3::zeros()], 0.1, 0.02, 1);
        let centers = body.particle_centers(0).unwrap();
        assert_eq!(centers.len(), 1);
        assert!((centers[0] - Vec3::new(0.05, 0.05, 5.05)).norm() < 1.0e-12);
    }

    #[test]
    fn empty_cloud_is_invalid() {
        let body = BodySpec::point_cloud(Vec3::zeros(), Vec::new(), 0.1, 1.0, 1);
        assert!(matches!(body.particle_centers(3), Err(SceneError::InvalidBody { body: 3, .. })));
    }

    #[test]
    fn bad_sizes_are_invalid() {
        let zero = BodySpec::solid_cube(Vec3::zeros(), Vec3::repeat(1.0), 0.0, 1.0, 0);
        assert!(zero.particle_centers(0).is_err());

        let flat = BodySpec::solid_cube(Vec3::zeros(), Vec3::new(1.0, 0.0, 1.0), 0.1, 1.0, 0);
        assert!(flat.particle_centers(0).is_err());
    }

    #[test]
    fn zero_mass_is_static() {
        let floor = BodySpec::solid_cube(Vec3::zeros(), Vec3::new(1.0, 1.0, 0.1), 0.1, 0.0, 0).loose();
        assert!(floor.is_static());
        assert_eq!(floor.kind, BodyKind::Loose);
    }
}
