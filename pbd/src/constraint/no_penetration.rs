use crate::particle::Particle;
use crate::types::{ParticleId, Real, contact_distance};

/// Inequality constraint keeping two particles at least their mean size apart.
///
/// Built fresh by collision detection every step; never stored across steps.
#[derive(Clone, Debug, PartialEq)]
pub struct NoPenetration {
    particles: [ParticleId; 2],
    epsilon: Real,
}

impl NoPenetration {
    pub fn new(a: ParticleId, b: ParticleId, epsilon: Real) -> Self {
        Self {
            particles: [a, b],
            epsilon,
        }
    }

    #[inline]
    pub fn particles(&self) -> &[ParticleId] {
        &self.particles
    }

    #[inline]
    pub fn epsilon(&self) -> Real {
        self.epsilon
    }

    pub fn is_satisfied(&self, particles: &[Particle]) -> bool {
        let [a, b] = self.particles;
        let (pa, pb) = (&particles[a], &particles[b]);
        (pa.position - pb.position).norm() > contact_distance(pa.size, pb.size)
    }

    pub fn is_pred_satisfied(&self, particles: &[Particle]) -> bool {
        let [a, b] = self.particles;
        let (pa, pb) = (&particles[a], &particles[b]);
        (pa.predicted_position - pb.predicted_position).norm() > contact_distance(pa.size, pb.size)
    }

    /// Push the predicted positions apart until they sit `epsilon` outside contact.
    pub fn project(&self, particles: &mut [Particle]) -> bool {
        let [a, b] = self.particles;
        let (pa, pb) = (&particles[a], &particles[b]);

        let d = pa.predicted_position - pb.predicted_position;
        let len = d.norm();
        let err = len - contact_distance(pa.size, pb.size);

        if err < self.epsilon && len > 0.0 && len.is_finite() {
            let (wa, wb) = match (pa.is_dynamic(), pb.is_dynamic()) {
                (true, true) => (0.5, 0.5),
                (true, false) => (1.0, 0.0),
                (false, true) => (0.0, 1.0),
                (false, false) => (0.0, 0.0),
            };
            let n = d / len;
            // Negative: the separation still missing.
            let correction = err - self.epsilon;

            particles[a].predicted_position -= n * (correction * wa);
            particles[b].predicted_position += n * (correction * wb);
        }

        self.is_pred_satisfied(particles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    const EPS: Real = 1.0e-5;

    fn pair(za: Real, mass_a: Real, zb: Real, mass_b: Real) -> Vec<Particle> {
        vec![
            Particle::new(Vec3::new(0.0, 0.0, za), mass_a, 0.1, 0),
            Particle::new(Vec3::new(0.0, 0.0, zb), mass_b, 0.1, 1),
        ]
    }

    #[test]
    fn overlapping_dynamic_pair_is_separated_evenly() {
        let mut particles = pair(0.0, 1.0, 0.06, 1.0);
        let c = NoPenetration::new(0, 1, EPS);

        assert!(c.project(&mut particles));

        let gap = (particles[1].predicted_position - particles[0].predicted_position).norm();
        assert!((gap - (0.1 + EPS)).abs() < 1.0e-12, "gap = {gap}");
        // Symmetric split around the starting midpoint.
        let mid = (particles[0].predicted_position.z + particles[1].predicted_position.z) * 0.5;
        assert!((mid - 0.03).abs() < 1.0e-12, "mid = {mid}");
    }

    #[test]
    fn static_partner_takes_no_correction() {
        let mut particles = pair(0.0, 0.0, 0.05, 1.0);
        let c = NoPenetration::new(0, 1, EPS);
        c.project(&mut particles);

        assert_eq!(particles[0].predicted_position, Vec3::zeros());
        assert!((particles[1].predicted_position.z - (0.1 + EPS)).abs() < 1.0e-12);
    }

    #[test]
    fn both_static_is_a_no_op() {
        let mut particles = pair(0.0, 0.0, 0.05, -1.0);
        let c = NoPenetration::new(0, 1, EPS);
        assert!(!c.project(&mut particles));
        assert_eq!(particles[0].predicted_position.z, 0.0);
        assert_eq!(particles[1].predicted_position.z, 0.05);
    }

    #[test]
    fn coincident_particles_are_skipped() {
        let mut particles = pair(0.0, 1.0, 0.0, 1.0);
        let c = NoPenetration::new(0, 1, EPS);
        assert!(!c.project(&mut particles));
        assert_eq!(particles[0].predicted_position, Vec3::zeros());
        assert_eq!(particles[1].predicted_position, Vec3::zeros());
    }

    #[test]
    fn non_finite_separation_is_skipped() {
        let mut particles = pair(0.0, 1.0, 0.05, 1.0);
        particles[1].predicted_position.x = Real::NAN;
        let c = NoPenetration::new(0, 1, EPS);
        c.project(&mut particles);
        assert_eq!(particles[0].predicted_position, Vec3::zeros());
    }

    #[test]
    fn separated_pair_is_untouched() {
        let mut particles = pair(0.0, 1.0, 0.5, 1.0);
        let c = NoPenetration::new(0, 1, EPS);
        assert!(c.project(&mut particles));
        assert_eq!(particles[1].predicted_position.z, 0.5);
        assert!(c.is_satisfied(&particles));
    }

    #[test]
    fn converged_projection_respects_contact_distance() {
        // Arbitrary overlaps along a skewed direction.
        for k in 0..20 {
            let t = k as Real * 0.004;
            let mut particles = vec![
                Particle::new(Vec3::new(0.01, -0.02, 0.0), 2.0, 0.12, 0),
                Particle::new(Vec3::new(0.01 + t, -0.02 + 0.5 * t, t), 0.5, 0.08, 1),
            ];
            let c = NoPenetration::new(0, 1, EPS);
            c.project(&mut particles);

            let gap = (particles[0].predicted_position - particles[1].predicted_position).norm();
            if k > 0 {
                assert!(gap >= 0.1 - EPS, "k={k} gap={gap}");
            }
        }
    }
}
