use {crate::ImageError, base::Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
}

impl ChannelOrder {
    pub fn swapped(self) -> Self {
        match self {
            ChannelOrder::Rgba => ChannelOrder::Bgra,
            ChannelOrder::Bgra => ChannelOrder::Rgba,
        }
    }
}

/// Swap byte 0 and byte 2 of every 4-byte pixel, leaving bytes 1 and 3.
///
/// Converts RGBA to BGRA and back. A trailing partial pixel is left alone.
pub fn swap_red_blue(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
}

/// A decoded image, ready to be handed to the display.
///
/// `pixels.len() == size.x * size.y * 4` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    size: Vec2<usize>,
    pixels: Vec<u8>,
    order: ChannelOrder,
}

impl DecodedFrame {
    pub fn new(size: Vec2<usize>, pixels: Vec<u8>, order: ChannelOrder) -> Result<Self, ImageError> {
        if pixels.len() != size.rgba_len() {
            return Err(ImageError::InvalidBuffer {
                expected: size.rgba_len(),
                actual: pixels.len(),
            });
        }
        Ok(Self {
            size,
            pixels,
            order,
        })
    }

    pub fn size(&self) -> Vec2<usize> {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.x
    }

    pub fn height(&self) -> usize {
        self.size.y
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Convert between RGBA and BGRA in place.
    pub fn swap_red_blue(&mut self) {
        swap_red_blue(&mut self.pixels);
        self.order = self.order.swapped();
    }

    /// The frame as BGRA bytes, converting if needed.
    pub fn into_bgra(mut self) -> Self {
        if self.order == ChannelOrder::Rgba {
            self.swap_red_blue();
        }
        self
    }
}
