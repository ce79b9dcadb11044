//! Bounded Gauss-Seidel relaxation.

use crate::constraint::Constraint;
use crate::particle::Particle;
use crate::stopwatch::StepStopwatch;

/// Outcome of one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Passes run; at least one.
    pub iterations: u32,
    /// Every constraint reported satisfied on the last pass.
    pub converged: bool,
    /// Stopped because the step's wall-clock budget ran out.
    pub timed_out: bool,
}

/// Project every constraint of every list in order, pass after pass.
///
/// Runs at least one pass, then stops on convergence, after `max_iterations`
/// passes, or when `stopwatch` has expired. Later constraints see the
/// corrections of earlier ones within the same pass.
pub fn sweep(
    lists: &mut [&mut [Constraint]],
    particles: &mut [Particle],
    max_iterations: u32,
    stopwatch: &StepStopwatch,
    phase: &str,
) -> SweepReport {
    let mut report = SweepReport::default();

    loop {
        let mut satisfied = true;
        for list in lists.iter_mut() {
            for constraint in list.iter_mut() {
                satisfied &= constraint.project(particles);
            }
        }
        report.iterations += 1;

        if satisfied {
            report.converged = true;
            break;
        }
        if report.iterations >= max_iterations {
            break;
        }
        if stopwatch.expired() {
            report.timed_out = true;
            log::warn!(
                "{phase}: wall-clock budget exhausted after {} passes",
                report.iterations
            );
            break;
        }
    }

    report
}
