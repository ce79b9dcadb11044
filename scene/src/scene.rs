use std::ops::Range;

use pbd::{Particle, ParticleId, SolverSettings, Vec3, World};

use crate::body::{BodyKind, BodySpec};
use crate::error::SceneError;

/// Which particle of a body a link attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleIndex {
    First,
    Last,
    At(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParticleRef {
    pub body: usize,
    pub index: ParticleIndex,
}

impl ParticleRef {
    pub fn first(body: usize) -> Self {
        Self {
            body,
            index: ParticleIndex::First,
        }
    }

    pub fn last(body: usize) -> Self {
        Self {
            body,
            index: ParticleIndex::Last,
        }
    }

    pub fn at(body: usize, index: usize) -> Self {
        Self {
            body,
            index: ParticleIndex::At(index),
        }
    }
}

/// Distance constraint between two body particles, at their spawn distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkSpec {
    pub a: ParticleRef,
    pub b: ParticleRef,
}

/// Everything needed to rebuild a world from scratch.
#[derive(Clone, Debug)]
pub struct Scene {
    pub gravity: Vec3,
    pub settings: SolverSettings,
    pub bodies: Vec<BodySpec>,
    pub links: Vec<LinkSpec>,
}

/// A freshly built world plus the particle range of each body.
pub struct Instance {
    pub world: World,
    /// Parallel to `Scene::bodies`.
    pub bodies: Vec<Range<ParticleId>>,
}

impl Scene {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            settings: SolverSettings::default(),
            bodies: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the body index used by [`ParticleRef`].
    pub fn add_body(&mut self, body: BodySpec) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    pub fn add_link(&mut self, a: ParticleRef, b: ParticleRef) {
        self.links.push(LinkSpec { a, b });
    }

    /// Build a new world. Calling this again resets the simulation to its initial state.
    pub fn instantiate(&self) -> Result<Instance, SceneError> {
        let mut world = World::with_settings(self.gravity, self.settings)?;
        let mut ranges = Vec::with_capacity(self.bodies.len());

        for (b, body) in self.bodies.iter().enumerate() {
            let centers = body.particle_centers(b)?;
            let start = world.particles().len();
            for center in centers {
                world.add_particle(Particle::new(center, body.particle_mass, body.particle_size, body.group));
            }
            let range = start..world.particles().len();

            let rigid = body.kind == BodyKind::Rigid && !body.is_static();
            if rigid {
                world.add_shape_matching(range.clone().collect())?;
            }
            log::debug!(
                "body {b}: {} particles (group {}, {})",
                range.len(),
                body.group,
                if body.is_static() {
                    "static"
                } else if rigid {
                    "rigid"
                } else {
                    "loose"
                }
            );
            ranges.push(range);
        }

        for link in &self.links {
            let a = resolve(&link.a, &ranges)?;
            let b = resolve(&link.b, &ranges)?;
            world.add_distance_constraint(a, b)?;
        }

        log::info!(
            "scene instantiated: {} bodies, {} particles, {} links",
            ranges.len(),
            world.particles().len(),
            self.links.len()
        );

        Ok(Instance { world, bodies: ranges })
    }
}

fn resolve(r: &ParticleRef, ranges: &[Range<ParticleId>]) -> Result<ParticleId, SceneError> {
    let range = ranges.get(r.body).ok_or(SceneError::UnknownBody { body: r.body })?;
    let count = range.len();
    let local = match r.index {
        ParticleIndex::First => 0,
        ParticleIndex::Last => count.saturating_sub(1),
        ParticleIndex::At(i) => i,
    };
    if local >= count {
        return Err(SceneError::ParticleOutOfRange {
            body: r.body,
            index: local,
            count,
        });
    }
    Ok(range.start + local)
}
