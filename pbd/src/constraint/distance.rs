use crate::particle::Particle;
use crate::settings::SolverSettings;
use crate::types::{ParticleId, Real};

/// Equality constraint holding two particles near a rest distance.
///
/// Errors inside `±tolerance` are ignored. Outside the band the pair is pulled
/// just inside the nearest band edge, split evenly between dynamic endpoints
/// and scaled by `stiffness`. The tolerance never drops below `epsilon`.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceConstraint {
    particles: [ParticleId; 2],
    rest_distance: Real,
    tolerance: Real,
    stiffness: Real,
    epsilon: Real,
}

impl DistanceConstraint {
    pub fn new(
        a: ParticleId,
        b: ParticleId,
        rest_distance: Real,
        tolerance: Real,
        stiffness: Real,
        epsilon: Real,
    ) -> Self {
        Self {
            particles: [a, b],
            rest_distance,
            tolerance: tolerance.max(epsilon),
            stiffness,
            epsilon,
        }
    }

    /// Capture the current distance between `a` and `b` as the rest distance.
    pub fn from_current(a: ParticleId, b: ParticleId, particles: &[Particle], settings: &SolverSettings) -> Self {
        let rest = (particles[a].position - particles[b].position).norm();
        Self::new(
            a,
            b,
            rest,
            settings.distance_tolerance,
            settings.distance_stiffness,
            settings.contact_epsilon,
        )
    }

    #[inline]
    pub fn particles(&self) -> &[ParticleId] {
        &self.particles
    }

    pub fn rest_distance(&self) -> Real {
        self.rest_distance
    }

    pub fn tolerance(&self) -> Real {
        self.tolerance
    }

    pub fn stiffness(&self) -> Real {
        self.stiffness
    }

    pub fn set_target_distance(&mut self, distance: Real) {
        self.rest_distance = distance;
    }

    /// Raised to at least `epsilon`; non-finite values are ignored.
    pub fn set_tolerance(&mut self, tolerance: Real) {
        if tolerance.is_finite() {
            self.tolerance = tolerance.max(self.epsilon);
        }
    }

    /// Clamped into (0, 1]; non-finite values are ignored.
    pub fn set_stiffness(&mut self, stiffness: Real) {
        if stiffness.is_finite() && stiffness > 0.0 {
            self.stiffness = stiffness.min(1.0);
        }
    }

    pub fn is_satisfied(&self, particles: &[Particle]) -> bool {
        let [a, b] = self.particles;
        let dist = (particles[a].position - particles[b].position).norm();
        (dist - self.rest_distance).abs() <= self.tolerance
    }

    pub fn is_pred_satisfied(&self, particles: &[Particle]) -> bool {
        let [a, b] = self.particles;
        let dist = (particles[a].predicted_position - particles[b].predicted_position).norm();
        (dist - self.rest_distance).abs() <= self.tolerance
    }

    pub fn project(&self, particles: &mut [Particle]) -> bool {
        let [a, b] = self.particles;
        let (pa, pb) = (&particles[a], &particles[b]);

        let d = pa.predicted_position - pb.predicted_position;
        let len = d.norm();
        let err = len - self.rest_distance;

        if !err.is_finite() || len <= 0.0 {
            return false;
        }
        if err.abs() <= self.tolerance {
            return true;
        }

        let (wa, wb) = match (pa.is_dynamic(), pb.is_dynamic()) {
            (true, true) => (0.5, 0.5),
            (true, false) => (1.0, 0.0),
            (false, true) => (0.0, 1.0),
            (false, false) => return false,
        };

        // Land inside the band, never past its center.
        let overshoot = self.epsilon.min(self.tolerance);
        let correction = if err > self.tolerance {
            err - self.tolerance + overshoot
        } else {
            err + self.tolerance - overshoot
        };
        let n = d / len;
        let step = n * (correction * self.stiffness);

        particles[a].predicted_position -= step * wa;
        particles[b].predicted_position += step * wb;

        self.is_pred_satisfied(particles)
    }
}
