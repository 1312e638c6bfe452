use std::fmt;

use crate::uuid::Uuid;

/// Failure reported by an [`Adapter`](crate::session::Adapter) operation.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    description: String,
}

impl Error {
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl std::error::Error for Error {}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Error that didn't map to any of the existing variants.
    Other,

    /// An unknown error occurred.
    Unknown,

    /// The device isn’t currently connected.
    NotConnected,

    /// The operation was cancelled through its cancellation handle.
    OperationCancelled,

    /// The connection timed out.
    ConnectionTimeout,

    /// The connection failed.
    ConnectionFailed,

    /// The adapter already has the maximum number of connections.
    ConnectionLimitReached,

    /// The device is unknown to the adapter.
    UnknownDevice,

    /// The device disconnected during the operation.
    PeripheralDisconnected,
}

/// Returned by [`SerialExecutor::submit`](crate::executor::SerialExecutor::submit).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitError {
    /// The executor was shut down and accepts no more tasks.
    AlreadyShutdown,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AlreadyShutdown => f.write_str("executor is already shut down"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Outcome of a connect attempt that didn't end up connected.
#[derive(Clone, Debug)]
pub enum ConnectError {
    /// The user declined the confirmation prompt.
    Declined,

    /// The adapter failed to connect.
    Failed(Error),

    /// The device with this identifier couldn't be found.
    NotFound(Uuid),

    /// There's no previously connected device to reconnect to.
    Unavailable,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Declined => f.write_str("connection declined"),
            Self::Failed(e) => write!(f, "connection failed: {}", e),
            Self::NotFound(id) => write!(f, "Device with ID '{}' not found.", id),
            Self::Unavailable => f.write_str("no previous device to reconnect to"),
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for ConnectError {
    fn from(e: Error) -> Self {
        Self::Failed(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn connect_error_source() {
        let e: ConnectError = Error::new(ErrorKind::ConnectionTimeout, "timed out").into();
        assert_eq!(e.to_string(), "connection failed: timed out");
        let source = e.source().unwrap().downcast_ref::<Error>().unwrap();
        assert_eq!(source.kind(), ErrorKind::ConnectionTimeout);

        assert!(ConnectError::Declined.source().is_none());
        assert_eq!(ConnectError::NotFound(Uuid::from_u128(1)).to_string(),
            "Device with ID '00000000-0000-0000-0000-000000000001' not found.");
    }
}
