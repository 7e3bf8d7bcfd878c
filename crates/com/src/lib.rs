//! Network plumbing for MJPEG-over-HTTP sources.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod multipart;
pub mod request;
pub mod response;

pub use client::MjpegClient;
pub use endpoint::StreamEndpoint;
pub use error::ComError;
pub use multipart::MultipartParser;
pub use response::ResponseHead;
