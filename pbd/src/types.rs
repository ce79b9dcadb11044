/*!
Core math aliases and identifiers shared by the engine modules.

This module holds no solver logic. It defines the data types
exchanged between:
- particle (per-particle kinematic state)
- frame (centroid/principal-axis estimation for clusters)
- constraint (projection of predicted state)
- world (arena ownership and the step pipeline)

Notes
- The engine works in double precision. Shape matching runs an
  eigen-decomposition every solver pass and single precision makes the
  principal axes wobble at rest.
- Particles are addressed by index into the world's arena. Indices are stable
  for the lifetime of a `World` because the arena is append-only.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Real = f64;
pub type Vec3 = na::Vector3<Real>;
pub type Mat3 = na::Matrix3<Real>;
pub type Quat = na::UnitQuaternion<Real>;

/// Index of a particle inside a [`World`](crate::World) arena.
pub type ParticleId = usize;

/// Collision group tag. Particles sharing a group never collide with each other.
pub type GroupId = u32;

/// Mean of two particle sizes: the center distance at which they touch.
#[inline]
pub fn contact_distance(size_a: Real, size_b: Real) -> Real {
    (size_a + size_b) * 0.5
}
