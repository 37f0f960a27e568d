//! hrmon errors

/// The error type for monitor operations
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    message: String,
}

impl Error {
    /// Creates a new error from its parts.
    pub fn new(
        kind: ErrorKind,
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
        message: impl Into<String>,
    ) -> Self {
        Error {
            kind,
            source,
            message: message.into(),
        }
    }

    /// Returns the corresponding [ErrorKind] for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the connection task must stop on this error.
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::MalformedPayload, None, message)
    }

    pub(crate) fn cancelled() -> Self {
        ErrorKind::Cancelled.into()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.message.is_empty(), &self.source) {
            (true, None) => write!(f, "{}", &self.kind),
            (false, None) => write!(f, "{}: {}", &self.kind, &self.message),
            (true, Some(err)) => write!(f, "{}: {}", &self.kind, err),
            (false, Some(err)) => write!(f, "{}: {} ({})", &self.kind, &self.message, err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|x| {
            let x: &(dyn std::error::Error + 'static) = &**x;
            x
        })
    }
}

/// A list of general categories of monitor error.
#[non_exhaustive]
#[derive(Debug, displaydoc::Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// malformed heart rate measurement payload
    MalformedPayload,
    /// the Bluetooth adapter is not available
    AdapterUnavailable,
    /// no matching device found before the scan timed out
    DiscoveryTimeout,
    /// connection failed
    ConnectionFailed,
    /// subscribing to notifications failed
    SubscribeFailed,
    /// the device isn't connected
    NotConnected,
    /// not found
    NotFound,
    /// timed out
    Timeout,
    /// cancellation requested
    Cancelled,
    /// I/O error
    Io,
    /// HTTP server error
    Http,
    /// error
    Other,
}

impl ErrorKind {
    /// Only an unusable adapter stops the connection task; everything else is retried.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::AdapterUnavailable)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            source: None,
            message: String::new(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::Io,
        };
        Error::new(kind, Some(Box::new(err)), String::new())
    }
}
