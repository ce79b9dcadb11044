//! Point-mass state and the per-particle phases of a step.

use crate::types::{GroupId, Quat, Real, Vec3};

/// One point mass.
///
/// A particle with `mass <= 0` is static: it never integrates, never commits,
/// and constraints never displace it. Its predicted state always mirrors its
/// committed state.
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec3,
    /// Tentative position for the step in progress. Equal to `position` outside a step.
    pub predicted_position: Vec3,
    pub orientation: Quat,
    /// Tentative orientation for the step in progress. Equal to `orientation` outside a step.
    pub predicted_orientation: Quat,
    pub velocity: Vec3,
    /// World-frame angular velocity (rad/s).
    pub angular_velocity: Vec3,
    /// Force accumulator, cleared once per step after integration.
    pub external_force: Vec3,
    /// Collision diameter proxy (meters).
    pub size: Real,
    pub group: GroupId,
    /// Set when the particle took part in a contact during the last collision detection.
    pub colliding: bool,
    mass: Real,
    mass_inv: Real,
}

impl Particle {
    /// A particle at rest at `position`.
    pub fn new(position: Vec3, mass: Real, size: Real, group: GroupId) -> Self {
        Self::with_velocity(position, Vec3::zeros(), mass, size, group)
    }

    pub fn with_velocity(
        position: Vec3,
        velocity: Vec3,
        mass: Real,
        size: Real,
        group: GroupId,
    ) -> Self {
        let mut particle = Self {
            position,
            predicted_position: position,
            orientation: Quat::identity(),
            predicted_orientation: Quat::identity(),
            velocity,
            angular_velocity: Vec3::zeros(),
            external_force: Vec3::zeros(),
            size,
            group,
            colliding: false,
            mass: 0.0,
            mass_inv: 0.0,
        };
        particle.set_mass(mass);
        particle
    }

    /// Set the mass and keep the cached inverse consistent.
    /// Non-positive (or NaN) masses make the particle static.
    pub fn set_mass(&mut self, mass: Real) {
        self.mass = mass;
        self.mass_inv = if mass > 0.0 { 1.0 / mass } else { 0.0 };
    }

    #[inline]
    pub fn mass(&self) -> Real {
        self.mass
    }

    /// `1 / mass` for dynamic particles, 0 for static ones.
    #[inline]
    pub fn mass_inv(&self) -> Real {
        self.mass_inv
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        !(self.mass > 0.0)
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        !self.is_static()
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.external_force += force;
    }

    pub fn clear_external_forces(&mut self) {
        self.external_force = Vec3::zeros();
    }

    /// Predict the unconstrained state after `dt` (semi-implicit Euler).
    ///
    /// Orientation integrates only when `|angular_velocity| > min_angular_speed`.
    pub fn symplectic_euler_update(&mut self, dt: Real, min_angular_speed: Real) {
        if self.is_static() {
            self.predicted_position = self.position;
            self.predicted_orientation = self.orientation;
            return;
        }

        self.velocity += self.external_force * (dt * self.mass_inv);
        self.predicted_position = self.position + self.velocity * dt;

        self.predicted_orientation = if self.angular_velocity.norm() > min_angular_speed {
            // from_scaled_axis builds the half-angle quaternion of ω·dt.
            Quat::from_scaled_axis(self.angular_velocity * dt) * self.orientation
        } else {
            self.orientation
        };
    }

    /// Derive velocities from the corrected prediction.
    ///
    /// `damping` in [0, 1] scales the linear velocity only.
    pub fn update_velocity(&mut self, dt: Real, damping: Real) {
        if self.is_static() {
            return;
        }

        self.velocity = (self.predicted_position - self.position) / dt * damping;

        let delta = self.predicted_orientation * self.orientation.inverse();
        self.angular_velocity = delta.scaled_axis() / dt;
    }

    /// Accept the predicted state as the new current state.
    pub fn commit(&mut self) {
        if self.is_static() {
            return;
        }
        self.position = self.predicted_position;
        self.orientation = self.predicted_orientation;
    }

    /// Discard any stale prediction so it starts from the current state.
    pub fn sync_prediction(&mut self) {
        self.predicted_position = self.position;
        self.predicted_orientation = self.orientation;
    }
}
