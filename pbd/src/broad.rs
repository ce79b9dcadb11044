use std::collections::HashMap;

use crate::particle::Particle;
use crate::settings::BroadPhase;
use crate::types::{ParticleId, Real, Vec3, contact_distance};

/// Which half of the particle state collision detection reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Snapshot {
    /// Committed positions (pre-stabilization).
    Current,
    /// Predicted positions (after integration).
    Predicted,
}

#[inline]
fn point(p: &Particle, snapshot: Snapshot) -> Vec3 {
    match snapshot {
        Snapshot::Current => p.position,
        Snapshot::Predicted => p.predicted_position,
    }
}

/// Contact test on predicted positions: different groups and within the mean size.
#[inline]
pub fn collision(a: &Particle, b: &Particle) -> bool {
    collision_in(a, b, Snapshot::Predicted)
}

pub fn collision_in(a: &Particle, b: &Particle, snapshot: Snapshot) -> bool {
    a.group != b.group && (point(a, snapshot) - point(b, snapshot)).norm() <= contact_distance(a.size, b.size)
}

/// Every colliding pair `(i, j)` with `i < j`, in ascending lexicographic order.
///
/// Both broad phases return the same list.
pub fn find_pairs(particles: &[Particle], snapshot: Snapshot, broad_phase: BroadPhase) -> Vec<(ParticleId, ParticleId)> {
    match broad_phase {
        BroadPhase::AllPairs => all_pairs(particles, snapshot),
        BroadPhase::SpatialHash => spatial_hash(particles, snapshot),
    }
}

fn all_pairs(particles: &[Particle], snapshot: Snapshot) -> Vec<(ParticleId, ParticleId)> {
    let mut pairs = Vec::new();
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            if collision_in(&particles[i], &particles[j], snapshot) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

type Cell = (i64, i64, i64);

fn cell_of(p: &Vec3, edge: Real) -> Cell {
    // `as` saturates, so non-finite coordinates land in a boundary cell.
    (
        (p.x / edge).floor() as i64,
        (p.y / edge).floor() as i64,
        (p.z / edge).floor() as i64,
    )
}

/// Uniform grid with cells as large as the biggest particle, so any touching
/// pair sits in the same or an adjacent cell.
fn spatial_hash(particles: &[Particle], snapshot: Snapshot) -> Vec<(ParticleId, ParticleId)> {
    let edge = particles.iter().map(|p| p.size).fold(0.0, Real::max);
    if !(edge > 0.0 && edge.is_finite()) {
        return all_pairs(particles, snapshot);
    }

    let mut grid: HashMap<Cell, Vec<ParticleId>> = HashMap::with_capacity(particles.len());
    for (i, p) in particles.iter().enumerate() {
        grid.entry(cell_of(&point(p, snapshot), edge)).or_default().push(i);
    }

    let mut pairs = Vec::new();
    for (i, p) in particles.iter().enumerate() {
        let (cx, cy, cz) = cell_of(&point(p, snapshot), edge);
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                for dz in -1..=1i64 {
                    let key = (cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz));
                    let Some(bucket) = grid.get(&key) else {
                        continue;
                    };
                    for &j in bucket {
                        if j > i && collision_in(p, &particles[j], snapshot) {
                            pairs.push((i, j));
                        }
                    }
                }
            }
        }
    }

    pairs.sort_unstable();
    // Saturated coordinates can visit the same cell twice.
    pairs.dedup();
    pairs
}
