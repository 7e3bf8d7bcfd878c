use {com::ComError, image::ImageError, std::fmt};

#[derive(Debug)]
pub enum VideoError {
    Connection(ComError),
    Decode(ImageError),
    Config(String),
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::Connection(err) => write!(f, "connection error: {err}"),
            VideoError::Decode(err) => write!(f, "decode error: {err}"),
            VideoError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for VideoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VideoError::Connection(err) => Some(err),
            VideoError::Decode(err) => Some(err),
            VideoError::Config(_) => None,
        }
    }
}

impl From<ComError> for VideoError {
    fn from(err: ComError) -> Self {
        VideoError::Connection(err)
    }
}

impl From<ImageError> for VideoError {
    fn from(err: ImageError) -> Self {
        VideoError::Decode(err)
    }
}
