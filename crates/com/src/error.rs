use std::fmt;

#[derive(Debug)]
pub enum ComError {
    Io(std::io::Error),
    ConnectTimeout,
    ReadTimeout,
    ConnectionClosed,
    Http(http::StatusCode),
    Request(http::Error),
    Framing(String),
    PartTooLarge(usize),
    InvalidEndpoint(String),
}

impl ComError {
    /// Malformed multipart or response framing, as opposed to a transport failure.
    pub fn is_framing(&self) -> bool {
        matches!(self, ComError::Framing(_) | ComError::PartTooLarge(_))
    }
}

impl fmt::Display for ComError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComError::Io(err) => write!(f, "io error: {err}"),
            ComError::ConnectTimeout => write!(f, "connect timed out"),
            ComError::ReadTimeout => write!(f, "no data from peer within read timeout"),
            ComError::ConnectionClosed => write!(f, "connection closed"),
            ComError::Http(status) => write!(f, "http error: {status}"),
            ComError::Request(err) => write!(f, "request error: {err}"),
            ComError::Framing(msg) => write!(f, "framing error: {msg}"),
            ComError::PartTooLarge(len) => write!(f, "part too large: {len} bytes"),
            ComError::InvalidEndpoint(msg) => write!(f, "invalid endpoint: {msg}"),
        }
    }
}

impl std::error::Error for ComError {}

impl From<std::io::Error> for ComError {
    fn from(err: std::io::Error) -> Self {
        ComError::Io(err)
    }
}

impl From<http::Error> for ComError {
    fn from(err: http::Error) -> Self {
        ComError::Request(err)
    }
}
