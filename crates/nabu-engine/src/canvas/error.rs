use std::fmt;

/// Operand pool named in a capacity error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Pool {
    Commands,
    Floats,
    Ints,
    Handles,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pool::Commands => "commands",
            Pool::Floats => "floats",
            Pool::Ints => "ints",
            Pool::Handles => "handles",
        })
    }
}

/// Errors reported by recording calls.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasError {
    /// No session is open (`reset()` was not called or `done()` already was).
    NotRecording,
    /// The session belongs to another thread.
    ForeignThread,
    /// Appending would exceed a configured pool limit; nothing was appended.
    CapacityExceeded { pool: Pool, limit: usize },
    InvalidArgument(&'static str),
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRecording => write!(f, "canvas is not recording; call reset() first"),
            Self::ForeignThread => write!(f, "canvas session is owned by another thread"),
            Self::CapacityExceeded { pool, limit } => {
                write!(f, "command buffer {pool} pool limit of {limit} exceeded")
            }
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
        }
    }
}

impl std::error::Error for CanvasError {}
