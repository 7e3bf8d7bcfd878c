use {base::Vec2, std::fmt};

#[derive(Debug)]
pub enum ImageError {
    Decode(String),
    SizeMismatch {
        expected: Vec2<usize>,
        actual: Vec2<usize>,
    },
    InvalidBuffer {
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Decode(msg) => write!(f, "decode error: {msg}"),
            ImageError::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            ImageError::InvalidBuffer { expected, actual } => {
                write!(
                    f,
                    "invalid pixel buffer: expected {expected} bytes, got {actual}"
                )
            }
        }
    }
}

impl std::error::Error for ImageError {}

impl From<crates_image::ImageError> for ImageError {
    fn from(err: crates_image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}
