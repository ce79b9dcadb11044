/*!
Solver settings and tolerances.

The constants centralize the default parameters used by the constraint
projections, the Gauss-Seidel sweeps, and the shape-matching frame estimation.
A `World` never reads them directly: it copies a [`SolverSettings`] at
construction so two worlds can be tuned independently.

Notes
- Distances are in meters, time in seconds.
- Tolerances are world-space lengths sized to the particles, not machine epsilon.
- A distance tolerance tighter than `contact_epsilon` is rejected.
- Damping factors and axis-disambiguation thresholds are tuning knobs, not
  physical constants.
*/

use crate::error::PbdError;
use crate::types::Real;

/// Extra separation pushed into every contact correction (meters).
/// Keeps a resolved contact strictly outside the touching distance.
pub const DEFAULT_CONTACT_EPSILON: Real = 1.0e-5;

/// Dead band around the rest length of a distance constraint (meters).
pub const DEFAULT_DISTANCE_TOLERANCE: Real = 0.01;

/// Fraction of the distance error corrected per projection, in (0, 1].
pub const DEFAULT_DISTANCE_STIFFNESS: Real = 0.99;

/// Multiplier applied to reconstructed linear velocities, in [0, 1].
/// 1.0 keeps the full velocity implied by the position change.
pub const DEFAULT_VELOCITY_DAMPING: Real = 1.0;

/// Angular speeds at or below this (rad/s) do not integrate orientation.
/// Avoids accumulating quaternion noise on particles that barely spin.
pub const DEFAULT_MIN_ANGULAR_SPEED: Real = 1.0e-6;

/// Sweep cap for the contact pass that runs before integration.
pub const DEFAULT_PRESTABILIZATION_ITERATIONS: u32 = 5;

/// Sweep cap for contact resolution after integration.
pub const DEFAULT_CONTACT_ITERATIONS: u32 = 5;

/// Sweep cap for structural and shape-matching constraints.
/// Shape matching has no hard termination test, so it gets a much larger cap.
pub const DEFAULT_STRUCTURAL_ITERATIONS: u32 = 5000;

/// Relative eigenvalue gap under which two principal axes are treated as repeated.
pub const DEFAULT_DEGENERATE_RATIO: Real = 1.0e-3;

/// A new principal axis whose dot product with the previous one falls below this is re-signed.
pub const DEFAULT_FLIP_DOT: Real = -0.5;

/// Candidate pair generation for collision detection.
///
/// Both variants produce the same contact list in the same order; the spatial hash
/// only skips pairs that cannot touch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BroadPhase {
    /// Test every unordered pair of particles.
    #[default]
    AllPairs,
    /// Bucket predicted positions into a uniform grid sized by the largest particle.
    SpatialHash,
}

/// Thresholds used when estimating principal frames for shape matching.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTolerances {
    /// Relative eigenvalue gap under which axes are considered repeated.
    pub degenerate_ratio: Real,
    /// Dot product under which an axis is considered flipped against the previous frame.
    pub flip_dot: Real,
}

impl Default for FrameTolerances {
    fn default() -> Self {
        Self {
            degenerate_ratio: DEFAULT_DEGENERATE_RATIO,
            flip_dot: DEFAULT_FLIP_DOT,
        }
    }
}

/// Per-world solver configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverSettings {
    pub contact_epsilon: Real,
    pub distance_tolerance: Real,
    pub distance_stiffness: Real,
    pub velocity_damping: Real,
    pub min_angular_speed: Real,
    pub prestabilization_iterations: u32,
    pub contact_iterations: u32,
    pub structural_iterations: u32,
    pub frame: FrameTolerances,
    pub broad_phase: BroadPhase,
    /// Log a profiling breakdown every N steps at `debug` level. 0 disables sampling.
    pub profile_every: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            contact_epsilon: DEFAULT_CONTACT_EPSILON,
            distance_tolerance: DEFAULT_DISTANCE_TOLERANCE,
            distance_stiffness: DEFAULT_DISTANCE_STIFFNESS,
            velocity_damping: DEFAULT_VELOCITY_DAMPING,
            min_angular_speed: DEFAULT_MIN_ANGULAR_SPEED,
            prestabilization_iterations: DEFAULT_PRESTABILIZATION_ITERATIONS,
            contact_iterations: DEFAULT_CONTACT_ITERATIONS,
            structural_iterations: DEFAULT_STRUCTURAL_ITERATIONS,
            frame: FrameTolerances::default(),
            broad_phase: BroadPhase::default(),
            profile_every: 0,
        }
    }
}

impl SolverSettings {
    /// Check every field against its admissible range.
    pub fn validate(&self) -> Result<(), PbdError> {
        non_negative("contact_epsilon", self.contact_epsilon)?;
        non_negative("distance_tolerance", self.distance_tolerance)?;
        non_negative("min_angular_speed", self.min_angular_speed)?;
        if self.distance_tolerance < self.contact_epsilon {
            return Err(PbdError::InvalidSetting {
                name: "distance_tolerance",
                reason: "must be at least contact_epsilon",
            });
        }

        if !(self.distance_stiffness > 0.0 && self.distance_stiffness <= 1.0) {
            return Err(PbdError::InvalidSetting {
                name: "distance_stiffness",
                reason: "must be in (0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&self.velocity_damping) {
            return Err(PbdError::InvalidSetting {
                name: "velocity_damping",
                reason: "must be in [0, 1]",
            });
        }

        for (name, iterations) in [
            ("prestabilization_iterations", self.prestabilization_iterations),
            ("contact_iterations", self.contact_iterations),
            ("structural_iterations", self.structural_iterations),
        ] {
            if iterations == 0 {
                return Err(PbdError::InvalidSetting {
                    name,
                    reason: "must allow at least one sweep",
                });
            }
        }

        non_negative("frame.degenerate_ratio", self.frame.degenerate_ratio)?;
        if !(-1.0..=0.0).contains(&self.frame.flip_dot) {
            return Err(PbdError::InvalidSetting {
                name: "frame.flip_dot",
                reason: "must be in [-1, 0]",
            });
        }

        Ok(())
    }
}

#[inline]
fn non_negative(name: &'static str, value: Real) -> Result<(), PbdError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PbdError::InvalidSetting {
            name,
            reason: "must be finite and non-negative",
        })
    }
}
