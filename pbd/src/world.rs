/*!
Particle arena, constraint lists, and the step pipeline.

One call to [`World::step`] runs, in order:
1. pre-stabilization: predictions reset to committed state, contacts, one bounded sweep, commit
2. gravity
3. integration (prediction), then the force accumulators are cleared
4. collision detection on predicted positions
5. contact sweep
6. structural sweep (permanent constraints, then shape-matching clusters)
7. velocity reconstruction
8. commit

All sweeps share the step's wall-clock budget.
*/

use std::time::Duration;

use crate::broad::{self, Snapshot};
use crate::constraint::{Constraint, ConstraintView, DistanceConstraint, NoPenetration, ShapeMatching};
use crate::error::PbdError;
use crate::particle::Particle;
use crate::settings::SolverSettings;
use crate::solver::{self, SweepReport};
use crate::stopwatch::StepStopwatch;
use crate::types::{ParticleId, Real, Vec3};

/// What one step did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    pub prestabilization: SweepReport,
    pub contacts: SweepReport,
    pub structural: SweepReport,
    /// Contacts found on predicted positions.
    pub contact_count: usize,
    /// Principal-axis repairs made by shape-matching clusters during the step.
    pub axis_corrections: u32,
    pub elapsed: Duration,
}

pub struct World {
    particles: Vec<Particle>,
    /// Rebuilt by every collision detection pass.
    contacts: Vec<Constraint>,
    permanent: Vec<Constraint>,
    shape_matching: Vec<Constraint>,
    gravity: Vec3,
    settings: SolverSettings,
    steps: u64,
}

impl World {
    /// Empty world with default solver settings.
    pub fn new(gravity: Vec3) -> Self {
        Self {
            particles: Vec::new(),
            contacts: Vec::new(),
            permanent: Vec::new(),
            shape_matching: Vec::new(),
            gravity,
            settings: SolverSettings::default(),
            steps: 0,
        }
    }

    pub fn with_settings(gravity: Vec3, settings: SolverSettings) -> Result<Self, PbdError> {
        settings.validate()?;
        Ok(Self {
            settings,
            ..Self::new(gravity)
        })
    }

    #[inline]
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    #[inline]
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    /// Number of completed steps since construction or the last [`clear`](Self::clear).
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Append a particle; the returned index stays valid until [`clear`](Self::clear).
    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    /// Link two particles at their current distance, using the world's tolerance and stiffness.
    pub fn add_distance_constraint(&mut self, a: ParticleId, b: ParticleId) -> Result<(), PbdError> {
        self.check_index(a)?;
        self.check_index(b)?;
        let link = DistanceConstraint::from_current(a, b, &self.particles, &self.settings);
        self.permanent.push(Constraint::Distance(link));
        Ok(())
    }

    /// Make `members` one rigid cluster, matched against their current arrangement.
    pub fn add_shape_matching(&mut self, members: Vec<ParticleId>) -> Result<(), PbdError> {
        let cluster = ShapeMatching::new(members, &self.particles, self.settings.frame)?;
        self.shape_matching.push(Constraint::ShapeMatching(cluster));
        Ok(())
    }

    /// Register a prebuilt constraint. Shape matching goes to the cluster list, everything else is permanent.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), PbdError> {
        for &i in constraint.particles() {
            self.check_index(i)?;
        }
        match constraint {
            Constraint::ShapeMatching(_) => self.shape_matching.push(constraint),
            _ => self.permanent.push(constraint),
        }
        Ok(())
    }

    /// Contacts from the most recent collision detection.
    pub fn contacts(&self) -> &[Constraint] {
        &self.contacts
    }

    pub fn permanent_constraints(&self) -> &[Constraint] {
        &self.permanent
    }

    pub fn shape_matching(&self) -> impl Iterator<Item = &ShapeMatching> + '_ {
        self.shape_matching.iter().filter_map(|c| match c {
            Constraint::ShapeMatching(cluster) => Some(cluster),
            _ => None,
        })
    }

    /// Debug snapshot of every constraint: contacts, permanent, then clusters.
    pub fn constraint_views(&self) -> Vec<ConstraintView> {
        self.contacts
            .iter()
            .chain(&self.permanent)
            .chain(&self.shape_matching)
            .map(|c| c.view(&self.particles))
            .collect()
    }

    /// Drop every particle and constraint. Settings and gravity are kept.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.contacts.clear();
        self.permanent.clear();
        self.shape_matching.clear();
        self.steps = 0;
    }

    /// Advance the simulation by `dt` seconds within a soft `timeout`.
    pub fn step(&mut self, dt: Real, timeout: Duration) -> Result<StepReport, PbdError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PbdError::InvalidTimeStep { dt });
        }

        self.steps += 1;
        let settings = self.settings;
        let mut sw = StepStopwatch::new(self.steps, timeout, settings.profile_every);

        sw.span("prestabilization");
        for p in self.particles.iter_mut() {
            p.sync_prediction();
        }
        self.detect_collisions(Snapshot::Current);
        let prestabilization = solver::sweep(
            &mut [self.contacts.as_mut_slice()],
            &mut self.particles,
            settings.prestabilization_iterations,
            &sw,
            "prestabilization",
        );
        for p in self.particles.iter_mut() {
            p.commit();
        }

        sw.span("integrate");
        for p in self.particles.iter_mut() {
            if p.is_dynamic() {
                let weight = self.gravity * p.mass();
                p.add_force(weight);
            }
            p.symplectic_euler_update(dt, settings.min_angular_speed);
            p.clear_external_forces();
        }

        sw.span("collide");
        let contact_count = self.detect_collisions(Snapshot::Predicted);

        sw.span("contacts");
        let contacts = solver::sweep(
            &mut [self.contacts.as_mut_slice()],
            &mut self.particles,
            settings.contact_iterations,
            &sw,
            "contacts",
        );

        sw.span("structural");
        let structural = solver::sweep(
            &mut [self.permanent.as_mut_slice(), self.shape_matching.as_mut_slice()],
            &mut self.particles,
            settings.structural_iterations,
            &sw,
            "structural",
        );

        let axis_corrections: u32 = self
            .shape_matching
            .iter_mut()
            .map(Constraint::take_axis_corrections)
            .sum();
        if axis_corrections > 0 {
            log::warn!(
                "step {}: {axis_corrections} principal-axis corrections in shape matching",
                self.steps
            );
        }

        sw.span("velocity");
        for p in self.particles.iter_mut() {
            p.update_velocity(dt, settings.velocity_damping);
            p.commit();
        }
        sw.end_span();

        Ok(StepReport {
            prestabilization,
            contacts,
            structural,
            contact_count,
            axis_corrections,
            elapsed: sw.elapsed(),
        })
    }

    /// Rebuild the contact list and the `colliding` flags. Returns the contact count.
    fn detect_collisions(&mut self, snapshot: Snapshot) -> usize {
        for p in self.particles.iter_mut() {
            p.colliding = false;
        }

        let pairs = broad::find_pairs(&self.particles, snapshot, self.settings.broad_phase);
        let epsilon = self.settings.contact_epsilon;

        self.contacts.clear();
        self.contacts.reserve(pairs.len());
        for (a, b) in pairs {
            self.particles[a].colliding = true;
            self.particles[b].colliding = true;
            self.contacts.push(Constraint::NoPenetration(NoPenetration::new(a, b, epsilon)));
        }
        self.contacts.len()
    }

    fn check_index(&self, index: ParticleId) -> Result<(), PbdError> {
        if index < self.particles.len() {
            Ok(())
        } else {
            Err(PbdError::ParticleOutOfRange {
                index,
                count: self.particles.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BroadPhase;

    const BUDGET: Duration = Duration::from_secs(5);

    fn cube_world(gravity: Vec3) -> World {
        let mut world = World::new(gravity);
        let mut members = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    let p = Vec3::new(i as Real, j as Real, k as Real) * 0.1 + Vec3::new(0.0, 0.0, 1.0);
                    members.push(world.add_particle(Particle::new(p, 1.0, 0.1, 1)));
                }
            }
        }
        world.add_shape_matching(members).unwrap();
        world
    }

    fn centroid(world: &World) -> Vec3 {
        world.particles().iter().map(|p| p.position).sum::<Vec3>() / world.particles().len() as Real
    }

    #[test]
    fn invalid_time_step_is_rejected() {
        let mut world = World::new(Vec3::zeros());
        for dt in [0.0, -0.01, Real::NAN, Real::INFINITY] {
            assert!(matches!(world.step(dt, BUDGET), Err(PbdError::InvalidTimeStep { .. })));
        }
        assert_eq!(world.step_count(), 0);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = SolverSettings {
            velocity_damping: 1.5,
            ..SolverSettings::default()
        };
        assert!(World::with_settings(Vec3::zeros(), settings).is_err());
    }

    #[test]
    fn constraint_indices_are_validated() {
        let mut world = World::new(Vec3::zeros());
        world.add_particle(Particle::new(Vec3::zeros(), 1.0, 0.1, 0));
        assert_eq!(
            world.add_distance_constraint(0, 3),
            Err(PbdError::ParticleOutOfRange { index: 3, count: 1 })
        );
        assert_eq!(world.add_shape_matching(Vec::new()), Err(PbdError::EmptyCluster));
        assert!(
            world
                .add_constraint(Constraint::NoPenetration(NoPenetration::new(0, 1, 1.0e-5)))
                .is_err()
        );
    }

    #[test]
    fn free_fall_follows_symplectic_euler() {
        let mut world = World::new(Vec3::new(0.0, 0.0, -10.0));
        world.add_particle(Particle::new(Vec3::zeros(), 2.0, 0.1, 0));
        world.step(0.1, BUDGET).unwrap();

        let p = &world.particles()[0];
        assert!((p.velocity.z + 1.0).abs() < 1.0e-12);
        assert!((p.position.z + 0.1).abs() < 1.0e-12);
        assert_eq!(p.external_force, Vec3::zeros());
        assert_eq!(p.predicted_position, p.position);
    }

    #[test]
    fn static_particles_never_move() {
        let mut world = World::new(Vec3::new(0.0, 0.0, -9.8));
        let anchor = world.add_particle(Particle::new(Vec3::new(0.1, 0.2, 0.3), 0.0, 0.1, 0));
        let heavy = world.add_particle(Particle::new(Vec3::new(0.1, 0.2, 0.37), 5.0, 0.1, 1));
        world.particle_mut(anchor).unwrap().velocity = Vec3::new(3.0, 0.0, 0.0);
        world.add_distance_constraint(anchor, heavy).unwrap();

        let start = world.particles()[anchor].clone();
        for _ in 0..100 {
            world.step(0.01, BUDGET).unwrap();
        }
        let end = &world.particles()[anchor];
        assert_eq!(end.position, start.position);
        assert_eq!(end.orientation, start.orientation);
    }

    #[test]
    fn edits_between_steps_are_kept() {
        let mut world = World::new(Vec3::zeros());
        let id = world.add_particle(Particle::new(Vec3::zeros(), 1.0, 0.1, 0));
        world.step(0.01, BUDGET).unwrap();

        world.particle_mut(id).unwrap().position = Vec3::new(5.0, 0.0, 0.0);
        world.step(0.01, BUDGET).unwrap();
        assert!((world.particles()[id].position - Vec3::new(5.0, 0.0, 0.0)).norm() < 1.0e-12);
    }

    #[test]
    fn particle_rests_on_static_particle() {
        let mut world = World::new(Vec3::new(0.0, 0.0, -9.8));
        world.add_particle(Particle::new(Vec3::zeros(), 0.0, 0.1, 0));
        let b = world.add_particle(Particle::new(Vec3::new(0.0, 0.0, 0.21), 1.0, 0.1, 1));

        for _ in 0..200 {
            world.step(0.005, BUDGET).unwrap();
        }

        let pb = &world.particles()[b];
        assert!((pb.position.z - 0.1).abs() < 0.01, "z = {}", pb.position.z);
        assert!(pb.velocity.norm() < 0.01, "v = {:?}", pb.velocity);
        assert!(pb.colliding);
    }

    #[test]
    fn resting_cube_keeps_its_centroid() {
        let mut world = cube_world(Vec3::zeros());
        let start = centroid(&world);

        for _ in 0..50 {
            let report = world.step(0.01, BUDGET).unwrap();
            assert_eq!(report.contact_count, 0);
        }

        let drift = (centroid(&world) - start).norm();
        assert!(drift < 1.0e-6, "drift = {drift}");
    }

    #[test]
    fn falling_cube_keeps_its_shape() {
        let mut world = cube_world(Vec3::new(0.0, 0.0, -9.8));
        let rest: Vec<Vec3> = world.particles().iter().map(|p| p.position).collect();

        for _ in 0..20 {
            world.step(0.01, BUDGET).unwrap();
        }

        let now: Vec<Vec3> = world.particles().iter().map(|p| p.position).collect();
        let d_rest = (rest[0] - rest[26]).norm();
        let d_now = (now[0] - now[26]).norm();
        assert!((d_rest - d_now).abs() < 1.0e-9);
        assert!(centroid(&world).z < 1.1);
    }

    #[test]
    fn same_group_overlap_makes_no_contact() {
        let mut world = World::new(Vec3::zeros());
        world.add_particle(Particle::new(Vec3::zeros(), 1.0, 0.1, 4));
        world.add_particle(Particle::new(Vec3::new(0.02, 0.0, 0.0), 1.0, 0.1, 4));

        let report = world.step(0.01, BUDGET).unwrap();
        assert_eq!(report.contact_count, 0);
        assert!(world.contacts().is_empty());
        assert!(world.particles().iter().all(|p| !p.colliding));
    }

    #[test]
    fn overlap_between_groups_is_resolved() {
        let mut world = World::new(Vec3::zeros());
        world.add_particle(Particle::new(Vec3::zeros(), 1.0, 0.1, 0));
        world.add_particle(Particle::new(Vec3::new(0.05, 0.0, 0.0), 1.0, 0.1, 1));

        world.step(0.01, BUDGET).unwrap();
        let gap = (world.particles()[0].position - world.particles()[1].position).norm();
        assert!(gap >= 0.1 - 1.0e-5, "gap = {gap}");
    }

    #[test]
    fn pendulum_stays_in_tolerance_band() {
        let mut world = World::new(Vec3::new(0.0, 0.0, -9.8));
        let pivot = world.add_particle(Particle::new(Vec3::zeros(), 0.0, 0.1, 0));
        let bob = world.add_particle(Particle::new(Vec3::new(1.0, 0.0, 0.0), 1.0, 0.1, 1));
        world.add_distance_constraint(pivot, bob).unwrap();

        for _ in 0..100 {
            let report = world.step(0.01, BUDGET).unwrap();
            assert!(report.structural.converged);
        }
        let len = world.particles()[bob].position.norm();
        assert!((len - 1.0).abs() <= 0.01 + 1.0e-5, "len = {len}");
        assert!(world.constraint_views().iter().all(|v| v.satisfied));
    }

    #[test]
    fn pendulum_converges_at_tightest_tolerance() {
        let epsilon = SolverSettings::default().contact_epsilon;
        let settings = SolverSettings {
            distance_tolerance: epsilon,
            ..SolverSettings::default()
        };
        let mut world = World::with_settings(Vec3::new(0.0, 0.0, -9.8), settings).unwrap();
        let pivot = world.add_particle(Particle::new(Vec3::zeros(), 0.0, 0.1, 0));
        let bob = world.add_particle(Particle::new(Vec3::new(1.0, 0.0, 0.0), 1.0, 0.1, 1));
        world.add_distance_constraint(pivot, bob).unwrap();

        for _ in 0..100 {
            let report = world.step(0.01, BUDGET).unwrap();
            assert!(report.structural.converged);
        }
        let len = world.particles()[bob].position.norm();
        assert!((len - 1.0).abs() <= epsilon, "len = {len}");

        let loose = SolverSettings {
            distance_tolerance: 0.0,
            ..SolverSettings::default()
        };
        assert!(World::with_settings(Vec3::zeros(), loose).is_err());
    }

    #[test]
    fn broad_phases_step_identically() {
        let build = |broad_phase| {
            let settings = SolverSettings {
                broad_phase,
                ..SolverSettings::default()
            };
            let mut world = World::with_settings(Vec3::new(0.0, 0.0, -9.8), settings).unwrap();
            world.add_particle(Particle::new(Vec3::zeros(), 0.0, 0.2, 0));
            for k in 0..6 {
                let p = Vec3::new(0.03 * k as Real, 0.0, 0.15 + 0.12 * k as Real);
                world.add_particle(Particle::new(p, 1.0, 0.1, k + 1));
            }
            world
        };
        let mut brute = build(BroadPhase::AllPairs);
        let mut hashed = build(BroadPhase::SpatialHash);

        for _ in 0..30 {
            let a = brute.step(0.01, BUDGET).unwrap();
            let b = hashed.step(0.01, BUDGET).unwrap();
            assert_eq!(a.contact_count, b.contact_count);
        }
        for (a, b) in brute.particles().iter().zip(hashed.particles()) {
            assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn clear_resets_everything() {
        let mut world = cube_world(Vec3::zeros());
        world.step(0.01, BUDGET).unwrap();
        world.clear();
        assert!(world.particles().is_empty());
        assert_eq!(world.shape_matching().count(), 0);
        assert!(world.constraint_views().is_empty());
        assert_eq!(world.step_count(), 0);
    }
}
