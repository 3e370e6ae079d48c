//! Error types of the sample path.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors reported by an output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Nobody is consuming samples anymore.
    Disconnected,
    /// The consumer stopped draining and no space became available in time.
    Stalled { waited: Duration },
    /// The underlying device reported a failure.
    Device(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SinkError::Disconnected => write!(f, "output sink disconnected"),
            SinkError::Stalled { waited } => {
                write!(f, "output sink stalled for {} ms", waited.as_millis())
            }
            SinkError::Device(msg) => write!(f, "output device error: {msg}"),
        }
    }
}

impl Error for SinkError {}

/// Errors that stop a sample loop. Everything else is resolved locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// Writing a sample failed.
    Sink(SinkError),
    /// The sample thread panicked before it could report a result.
    ThreadPanicked,
}

impl From<SinkError> for GeneratorError {
    fn from(error: SinkError) -> Self {
        GeneratorError::Sink(error)
    }
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeneratorError::Sink(e) => write!(f, "sample loop stopped: {e}"),
            GeneratorError::ThreadPanicked => write!(f, "sample thread panicked"),
        }
    }
}

impl Error for GeneratorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GeneratorError::Sink(e) => Some(e),
            GeneratorError::ThreadPanicked => None,
        }
    }
}
