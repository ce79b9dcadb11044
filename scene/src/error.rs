use std::fmt;

use pbd::PbdError;

#[derive(Clone, Debug, PartialEq)]
pub enum SceneError {
    /// Reading a point-cloud file failed.
    Io { path: String, message: String },
    /// A point-cloud line could not be parsed (1-based line number).
    Parse { line: usize, reason: String },
    /// A body description cannot produce particles.
    InvalidBody { body: usize, reason: &'static str },
    /// A link names a body that does not exist.
    UnknownBody { body: usize },
    /// A link names a particle outside its body.
    ParticleOutOfRange { body: usize, index: usize, count: usize },
    Engine(PbdError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot read `{path}`: {message}"),
            Self::Parse { line, reason } => write!(f, "line {line}: {reason}"),
            Self::InvalidBody { body, reason } => write!(f, "body {body}: {reason}"),
            Self::UnknownBody { body } => write!(f, "no body with index {body}"),
            Self::ParticleOutOfRange { body, index, count } => {
                write!(f, "body {body} has {count} particles, index {index} is out of range")
            }
            Self::Engine(e) => write!(f, "engine: {e}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PbdError> for SceneError {
    fn from(e: PbdError) -> Self {
        Self::Engine(e)
    }
}
