/*!
Rigid shape matching for particle clusters.

The cluster remembers each member's offset expressed in the principal frame it
had at construction. Every projection re-estimates the principal frame of the
predicted positions and moves each dynamic member onto its remembered offset
in that frame. The cluster rotation (deformed basis relative to the
construction basis) becomes the members' predicted orientation.

Frame estimation is continuous: each new basis is repaired against the
previous one (see [`crate::frame`]). Repairs are counted so the world can
report them once per step.
*/

use crate::error::PbdError;
use crate::frame::{self, AxisCorrection, Frame};
use crate::particle::Particle;
use crate::settings::FrameTolerances;
use crate::types::{Mat3, ParticleId, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeMatching {
    particles: Vec<ParticleId>,
    /// Rest offsets in the construction basis, parallel to `particles`.
    offsets: Vec<Vec3>,
    /// Principal basis at construction; orientations are measured against it.
    construction_basis: Mat3,
    rest: Frame,
    deformed: Frame,
    tolerances: FrameTolerances,
    corrections: u32,
}

impl ShapeMatching {
    /// Build a cluster from the current positions of `members`.
    pub fn new(members: Vec<ParticleId>, particles: &[Particle], tolerances: FrameTolerances) -> Result<Self, PbdError> {
        if members.is_empty() {
            return Err(PbdError::EmptyCluster);
        }
        if let Some(&index) = members.iter().find(|&&i| i >= particles.len()) {
            return Err(PbdError::ParticleOutOfRange {
                index,
                count: particles.len(),
            });
        }

        let (rest, _) = frame::estimate(
            members.iter().map(|&i| particles[i].position),
            &Mat3::identity(),
            &tolerances,
        )
        .ok_or(PbdError::EmptyCluster)?;

        let offsets = members.iter().map(|&i| rest.to_local(&particles[i].position)).collect();

        Ok(Self {
            particles: members,
            offsets,
            construction_basis: rest.basis,
            rest,
            deformed: rest,
            tolerances,
            corrections: 0,
        })
    }

    #[inline]
    pub fn particles(&self) -> &[ParticleId] {
        &self.particles
    }

    pub fn offsets(&self) -> &[Vec3] {
        &self.offsets
    }

    /// Frame of the committed positions, refreshed on every projection.
    pub fn rest_frame(&self) -> &Frame {
        &self.rest
    }

    /// Frame of the predicted positions, refreshed on every projection.
    pub fn deformed_frame(&self) -> &Frame {
        &self.deformed
    }

    /// Where each member is pulled to by the last projection.
    pub fn matched_positions(&self) -> Vec<Vec3> {
        self.offsets.iter().map(|o| self.deformed.to_world(o)).collect()
    }

    /// Axis repairs accumulated since the last call.
    pub fn take_corrections(&mut self) -> u32 {
        std::mem::take(&mut self.corrections)
    }

    /// Shape matching has no error measure of its own.
    pub fn is_satisfied(&self, _particles: &[Particle]) -> bool {
        true
    }

    pub fn is_pred_satisfied(&self, _particles: &[Particle]) -> bool {
        true
    }

    pub fn project(&mut self, particles: &mut [Particle]) -> bool {
        if let Some((rest, correction)) = frame::estimate(
            self.particles.iter().map(|&i| particles[i].position),
            &self.rest.basis,
            &self.tolerances,
        ) {
            self.rest = rest;
            self.note(correction, "rest");
        }

        if let Some((deformed, correction)) = frame::estimate(
            self.particles.iter().map(|&i| particles[i].predicted_position),
            &self.deformed.basis,
            &self.tolerances,
        ) {
            self.deformed = deformed;
            self.note(correction, "deformed");
        }

        let rotation = frame::basis_to_quat(&(self.deformed.basis * self.construction_basis.transpose()));

        for (&i, offset) in self.particles.iter().zip(&self.offsets) {
            let p = &mut particles[i];
            if p.is_static() {
                continue;
            }
            p.predicted_position = self.deformed.to_world(offset);
            p.predicted_orientation = rotation;
        }

        true
    }

    fn note(&mut self, correction: AxisCorrection, which: &str) {
        if correction.is_repair() {
            self.corrections += 1;
            log::trace!(
                "shape matching: {which} basis repaired (flipped={}, permuted={}, degenerate={})",
                correction.flipped,
                correction.permuted,
                correction.degenerate
            );
        }
    }
}
