pub mod broad;
pub mod constraint;
pub mod error;
pub mod frame;
pub mod particle;
pub mod settings;
pub mod solver;
pub mod stopwatch;
pub mod types;
pub mod world;

pub use broad::{Snapshot, collision, find_pairs};
pub use constraint::{
    Constraint, ConstraintKind, ConstraintView, DistanceConstraint, NoPenetration, ShapeMatching,
};
pub use error::PbdError;
pub use frame::{AxisCorrection, Frame};
pub use particle::Particle;
pub use settings::{BroadPhase, FrameTolerances, SolverSettings};
pub use solver::SweepReport;
pub use stopwatch::StepStopwatch;
pub use types::{GroupId, Mat3, ParticleId, Quat, Real, Vec3, contact_distance};
pub use world::{StepReport, World};
