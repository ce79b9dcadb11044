//! Constraint variants and their common dispatch.
//!
//! Constraints reference particles by arena index and never own them. Every
//! variant answers the same three questions: is the committed state satisfied,
//! is the predicted state satisfied, and project the predicted state.

mod distance;
mod no_penetration;
mod shape_matching;

pub use distance::DistanceConstraint;
pub use no_penetration::NoPenetration;
pub use shape_matching::ShapeMatching;

use crate::particle::Particle;
use crate::types::{ParticleId, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    NoPenetration(NoPenetration),
    Distance(DistanceConstraint),
    ShapeMatching(ShapeMatching),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    NoPenetration,
    Distance,
    ShapeMatching,
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::NoPenetration(_) => ConstraintKind::NoPenetration,
            Self::Distance(_) => ConstraintKind::Distance,
            Self::ShapeMatching(_) => ConstraintKind::ShapeMatching,
        }
    }

    pub fn particles(&self) -> &[ParticleId] {
        match self {
            Self::NoPenetration(c) => c.particles(),
            Self::Distance(c) => c.particles(),
            Self::ShapeMatching(c) => c.particles(),
        }
    }

    pub fn is_satisfied(&self, particles: &[Particle]) -> bool {
        match self {
            Self::NoPenetration(c) => c.is_satisfied(particles),
            Self::Distance(c) => c.is_satisfied(particles),
            Self::ShapeMatching(c) => c.is_satisfied(particles),
        }
    }

    pub fn is_pred_satisfied(&self, particles: &[Particle]) -> bool {
        match self {
            Self::NoPenetration(c) => c.is_pred_satisfied(particles),
            Self::Distance(c) => c.is_pred_satisfied(particles),
            Self::ShapeMatching(c) => c.is_pred_satisfied(particles),
        }
    }

    /// Move predicted state toward satisfaction. Returns the convergence signal.
    pub fn project(&mut self, particles: &mut [Particle]) -> bool {
        match self {
            Self::NoPenetration(c) => c.project(particles),
            Self::Distance(c) => c.project(particles),
            Self::ShapeMatching(c) => c.project(particles),
        }
    }

    /// Principal-axis repairs since the last call (shape matching only).
    pub fn take_axis_corrections(&mut self) -> u32 {
        match self {
            Self::ShapeMatching(c) => c.take_corrections(),
            _ => 0,
        }
    }

    /// Snapshot for debug drawing.
    pub fn view(&self, particles: &[Particle]) -> ConstraintView {
        ConstraintView {
            kind: self.kind(),
            endpoints: self.particles().iter().map(|&i| particles[i].position).collect(),
            satisfied: self.is_satisfied(particles),
        }
    }
}

/// Read-only picture of one constraint against committed positions.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintView {
    pub kind: ConstraintKind,
    /// Positions of the referenced particles, in constraint order.
    pub endpoints: Vec<Vec3>,
    pub satisfied: bool,
}
