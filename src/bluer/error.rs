use crate::error::ErrorKind;

impl From<bluer::Error> for crate::Error {
    fn from(err: bluer::Error) -> Self {
        crate::Error::new(kind_from_bluer(&err), Some(Box::new(err)), String::new())
    }
}

fn kind_from_bluer(err: &bluer::Error) -> ErrorKind {
    match err.kind {
        bluer::ErrorKind::ConnectionAttemptFailed => ErrorKind::ConnectionFailed,
        bluer::ErrorKind::AlreadyConnected => ErrorKind::ConnectionFailed,
        bluer::ErrorKind::NotAuthorized => ErrorKind::ConnectionFailed,
        bluer::ErrorKind::NotPermitted => ErrorKind::ConnectionFailed,
        bluer::ErrorKind::NotReady => ErrorKind::NotConnected,
        bluer::ErrorKind::ServicesUnresolved => ErrorKind::NotConnected,
        bluer::ErrorKind::NotFound => ErrorKind::NotFound,
        bluer::ErrorKind::DoesNotExist => ErrorKind::NotFound,
        _ => ErrorKind::Other,
    }
}
