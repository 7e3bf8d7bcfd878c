//! MJPEG stream viewing for the workspace.
//!
//! A `StreamReceiver` pulls a multipart MJPEG stream on a tokio task and
//! hands decoded frames to a `FrameSink`. The `FrameStore` keeps the latest
//! frame, the `Presenter` decides what a render tick paints, and `StreamView`
//! ties the three together for a window adapter such as the `view` binary.

pub mod config;
pub mod error;
mod font;
pub mod presenter;
pub mod receiver;
pub mod store;
pub mod streamview;

pub use config::{DEFAULT_PATH, StreamConfig};
pub use error::VideoError;
pub use presenter::{
    Backgrounds, LightStatus, Paint, Palette, PresentationState, Presenter, STALE_AFTER_MS,
    StatusLight, Surface,
};
pub use receiver::{FrameSink, StreamReceiver};
pub use store::{FrameStore, Snapshot};
pub use streamview::{StreamView, Tick};
