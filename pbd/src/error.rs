//! Engine error type.
//!
//! Only construction and argument validation can fail. Numerical trouble inside
//! a step (degenerate separations, ambiguous principal axes) is recovered locally
//! and never surfaces here.

use std::fmt;

use crate::types::{ParticleId, Real};

#[derive(Clone, Debug, PartialEq)]
pub enum PbdError {
    /// A constraint referenced a particle that is not in the arena.
    ParticleOutOfRange {
        index: ParticleId,
        /// Number of particles in the arena at the time of the call.
        count: usize,
    },
    /// A shape-matching cluster was created without particles.
    EmptyCluster,
    /// `step` was called with a non-positive or non-finite time step.
    InvalidTimeStep { dt: Real },
    /// A solver setting is outside its admissible range.
    InvalidSetting {
        name: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for PbdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParticleOutOfRange { index, count } => {
                write!(f, "particle index {index} out of range (count={count})")
            }
            Self::EmptyCluster => write!(f, "shape-matching cluster has no particles"),
            Self::InvalidTimeStep { dt } => {
                write!(f, "time step must be finite and positive, got {dt}")
            }
            Self::InvalidSetting { name, reason } => {
                write!(f, "invalid setting `{name}`: {reason}")
            }
        }
    }
}

impl std::error::Error for PbdError {}
