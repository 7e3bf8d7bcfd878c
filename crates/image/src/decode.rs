use {
    crate::*,
    base::Vec2,
    crates_image::{ImageFormat, imageops::FilterType},
};

/// What to do when the JPEG's native size differs from the display extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scaling {
    /// Reject the frame with `ImageError::SizeMismatch`.
    #[default]
    Exact,
    /// Resample to the display extent.
    Resize,
}

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

// The decoder pads truncated scans instead of failing, so a payload must be
// bracketed by SOI and EOI to count as complete.
fn check_markers(data: &[u8]) -> Result<(), ImageError> {
    if !data.starts_with(&SOI) {
        return Err(ImageError::Decode("missing start-of-image marker".to_string()));
    }
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    if !data[..end].ends_with(&EOI) {
        return Err(ImageError::Decode("truncated JPEG: missing end-of-image marker".to_string()));
    }
    Ok(())
}

/// Decode one JPEG payload into a BGRA frame of exactly `expected` pixels.
///
/// Malformed or truncated data yields `ImageError::Decode`. The input is only
/// borrowed for the duration of the call.
pub fn decode_jpeg(
    data: &[u8],
    expected: Vec2<usize>,
    scaling: Scaling,
) -> Result<DecodedFrame, ImageError> {
    check_markers(data)?;
    let image = crates_image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
    let mut rgba = image.to_rgba8();

    let (width, height) = rgba.dimensions();
    let actual = Vec2::new(width as usize, height as usize);
    if actual != expected {
        match scaling {
            Scaling::Exact => return Err(ImageError::SizeMismatch { expected, actual }),
            Scaling::Resize => {
                if expected.is_empty() {
                    return Err(ImageError::SizeMismatch { expected, actual });
                }
                log::trace!("resizing frame from {} to {}", actual, expected);
                rgba = crates_image::imageops::resize(
                    &rgba,
                    expected.x as u32,
                    expected.y as u32,
                    FilterType::Triangle,
                );
            }
        }
    }

    let frame = DecodedFrame::new(expected, rgba.into_raw(), ChannelOrder::Rgba)?;
    Ok(frame.into_bgra())
}

/// `decode_jpeg` on tokio's blocking thread pool.
///
/// Takes the payload by value; it is dropped when decoding finishes.
pub async fn decode_frame(
    data: Vec<u8>,
    expected: Vec2<usize>,
    scaling: Scaling,
) -> Result<DecodedFrame, ImageError> {
    tokio::task::spawn_blocking(move || decode_jpeg(&data, expected, scaling))
        .await
        .map_err(|e| ImageError::Decode(e.to_string()))?
}
