use core::fmt::{self, Display, Formatter};

/// Errors raised by the adapters' own machinery.
///
/// Errors produced by the wrapped functions never travel through this type:
/// they are handed to the caller exactly as delivered.
#[derive(Debug)]
pub enum Error {
    /// The configured worker name cannot be used as a thread name.
    InvalidName,
    /// The OS refused to start another worker thread.
    Spawn(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "Worker name must not contain NUL bytes"),
            Self::Spawn(e) => write!(f, "Failed to spawn worker thread: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidName => None,
            Self::Spawn(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Spawn(e)
    }
}
