pub mod body;
pub mod error;
pub mod lattice;
pub mod octree;
pub mod scene;
pub mod xyz;

pub use body::{BodyKind, BodyShape, BodySpec};
pub use error::SceneError;
pub use scene::{Instance, LinkSpec, ParticleIndex, ParticleRef, Scene};
