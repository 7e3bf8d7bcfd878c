//! JPEG frame decoding for the MJPEG viewer.
//!
//! Turns one JPEG payload into a `DecodedFrame`: a tightly packed
//! 4-bytes-per-pixel buffer at the display extent, in BGRA order so it can be
//! blitted directly.

pub mod decode;
pub mod error;
pub mod frame;

pub use decode::{Scaling, decode_frame, decode_jpeg};
pub use error::ImageError;
pub use frame::{ChannelOrder, DecodedFrame, swap_red_blue};
