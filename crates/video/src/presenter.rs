use {
    crate::{
        Snapshot,
        font::{self, GLYPH_SPACING, GLYPH_WIDTH},
    },
    base::Vec2,
    image::DecodedFrame,
    std::sync::Arc,
};

/// A frame older than this many milliseconds counts as stale.
pub const STALE_AFTER_MS: u64 = 1000;

/// Background fill, RGB.
pub const BACKGROUND_COLOR: [u8; 3] = [40, 40, 40];

/// Label color, RGB.
pub const TEXT_COLOR: [u8; 3] = [255, 255, 255];

// font pixels per glyph pixel
const TEXT_SCALE: usize = 2;

// vertical offset applied when centering labels
const TEXT_BASELINE_OFFSET: isize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationState {
    #[default]
    Disconnected,
    AwaitingFirstFrame,
    Stale,
    Live,
}

impl PresentationState {
    /// Decide what to show from the receiver state, the first-frame flag and
    /// the age of the last frame.
    pub fn decide(running: bool, is_first: bool, age_ms: u64) -> Self {
        match (running, is_first) {
            (false, _) => PresentationState::Disconnected,
            (true, true) => PresentationState::AwaitingFirstFrame,
            (true, false) if age_ms > STALE_AFTER_MS => PresentationState::Stale,
            (true, false) => PresentationState::Live,
        }
    }

    pub fn evaluate(running: bool, snapshot: &Snapshot) -> Self {
        Self::decide(running, snapshot.is_first, snapshot.age_ms)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PresentationState::Disconnected => "Disconnected",
            PresentationState::AwaitingFirstFrame => "Connecting...",
            PresentationState::Stale => "Waiting...",
            PresentationState::Live => "Live",
        }
    }
}

/// BGRA pixel buffer used for the precomputed backgrounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    size: Vec2<usize>,
    pixels: Vec<u8>,
}

impl Surface {
    /// A surface of `size` filled with `color` (RGB).
    pub fn filled(size: Vec2<usize>, color: [u8; 3]) -> Self {
        let [r, g, b] = color;
        let pixels = [b, g, r, 255].repeat(size.area());
        Self { size, pixels }
    }

    pub fn size(&self) -> Vec2<usize> {
        self.size
    }

    /// BGRA bytes, row by row without padding.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGB color at `(x, y)`, `None` outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.size.x || y >= self.size.y {
            return None;
        }
        let i = (y * self.size.x + x) * 4;
        Some([self.pixels[i + 2], self.pixels[i + 1], self.pixels[i]])
    }

    /// Set one pixel, ignoring positions outside the surface.
    pub fn put_pixel(&mut self, x: isize, y: isize, color: [u8; 3]) {
        if x < 0 || y < 0 || x as usize >= self.size.x || y as usize >= self.size.y {
            return;
        }
        let i = (y as usize * self.size.x + x as usize) * 4;
        let [r, g, b] = color;
        self.pixels[i..i + 4].copy_from_slice(&[b, g, r, 255]);
    }

    /// Pixel extent `text` occupies when drawn at `scale`.
    pub fn text_extent(text: &str, scale: usize) -> Vec2<usize> {
        let (width, height) = font::text_extent(text);
        Vec2::new(width * scale, height * scale)
    }

    /// Draw `text` with its top-left corner at `origin`, clipped to the surface.
    pub fn draw_text(&mut self, origin: Vec2<isize>, text: &str, scale: usize, color: [u8; 3]) {
        let advance = ((GLYPH_WIDTH + GLYPH_SPACING) * scale) as isize;
        for (index, c) in text.chars().enumerate() {
            let left = origin.x + index as isize * advance;
            for (row, bits) in font::glyph(c).iter().enumerate() {
                for column in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - column)) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            self.put_pixel(
                                left + (column * scale + dx) as isize,
                                origin.y + (row * scale + dy) as isize,
                                color,
                            );
                        }
                    }
                }
            }
        }
    }

    /// Top-left corner that centers `text` on the surface.
    pub fn label_origin(&self, text: &str, scale: usize) -> Vec2<isize> {
        let extent = Self::text_extent(text, scale);
        Vec2::new(
            (self.size.x as isize - extent.x as isize) / 2,
            (self.size.y as isize - extent.y as isize - TEXT_BASELINE_OFFSET) / 2,
        )
    }

    /// Background fill with a centered white label.
    pub fn labelled(size: Vec2<usize>, text: &str) -> Self {
        let mut surface = Self::filled(size, BACKGROUND_COLOR);
        let origin = surface.label_origin(text, TEXT_SCALE);
        surface.draw_text(origin, text, TEXT_SCALE, TEXT_COLOR);
        surface
    }
}

/// The three precomputed status screens for one display extent.
#[derive(Debug, Clone)]
pub struct Backgrounds {
    connecting: Surface,
    disconnected: Surface,
    waiting: Surface,
}

impl Backgrounds {
    pub fn new(size: Vec2<usize>) -> Self {
        Self {
            connecting: Surface::labelled(size, PresentationState::AwaitingFirstFrame.label()),
            disconnected: Surface::labelled(size, PresentationState::Disconnected.label()),
            waiting: Surface::labelled(size, PresentationState::Stale.label()),
        }
    }

    pub fn size(&self) -> Vec2<usize> {
        self.connecting.size()
    }

    pub fn connecting(&self) -> &Surface {
        &self.connecting
    }

    pub fn disconnected(&self) -> &Surface {
        &self.disconnected
    }

    pub fn waiting(&self) -> &Surface {
        &self.waiting
    }

    /// Background for `state`. `Live` has none of its own and maps to the
    /// waiting screen.
    pub fn for_state(&self, state: PresentationState) -> &Surface {
        match state {
            PresentationState::Disconnected => &self.disconnected,
            PresentationState::AwaitingFirstFrame => &self.connecting,
            PresentationState::Stale | PresentationState::Live => &self.waiting,
        }
    }
}

/// What one render tick puts on screen.
#[derive(Debug, Clone)]
pub enum Paint<'a> {
    /// A status screen covering the whole display.
    Background(&'a Surface),
    /// The live frame, blitted at its own pixel size.
    Frame(Arc<DecodedFrame>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightStatus {
    Active,
    Standby,
    Inactive,
}

impl From<PresentationState> for LightStatus {
    fn from(state: PresentationState) -> Self {
        match state {
            PresentationState::Live => LightStatus::Active,
            PresentationState::AwaitingFirstFrame | PresentationState::Stale => {
                LightStatus::Standby
            }
            PresentationState::Disconnected => LightStatus::Inactive,
        }
    }
}

/// Status light colors. The colorblind palette avoids telling states apart
/// by red versus green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Palette {
    colorblind: bool,
}

impl Palette {
    pub fn new(colorblind: bool) -> Self {
        Self { colorblind }
    }

    pub fn is_colorblind(&self) -> bool {
        self.colorblind
    }

    /// RGB color for `status`.
    pub fn color(&self, status: LightStatus) -> [u8; 3] {
        match (self.colorblind, status) {
            (false, LightStatus::Active) => [0, 200, 0],
            (false, LightStatus::Standby) => [255, 200, 0],
            (false, LightStatus::Inactive) => [200, 0, 0],
            (true, LightStatus::Active) => [0, 114, 178],
            (true, LightStatus::Standby) => [240, 228, 66],
            (true, LightStatus::Inactive) => [213, 94, 0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLight {
    pub status: LightStatus,
    pub color: [u8; 3],
}

impl StatusLight {
    pub fn new(state: PresentationState, palette: Palette) -> Self {
        let status = LightStatus::from(state);
        Self {
            status,
            color: palette.color(status),
        }
    }
}

/// Turns store snapshots into paint decisions.
///
/// Holds the backgrounds for the current extent and the last state, which is
/// only used to log transitions.
pub struct Presenter {
    backgrounds: Backgrounds,
    palette: Palette,
    state: PresentationState,
}

impl Presenter {
    pub fn new(size: Vec2<usize>, palette: Palette) -> Self {
        Self {
            backgrounds: Backgrounds::new(size),
            palette,
            state: PresentationState::default(),
        }
    }

    pub fn size(&self) -> Vec2<usize> {
        self.backgrounds.size()
    }

    pub fn state(&self) -> PresentationState {
        self.state
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn backgrounds(&self) -> &Backgrounds {
        &self.backgrounds
    }

    /// Regenerate the backgrounds for a new display extent.
    pub fn resize(&mut self, size: Vec2<usize>) {
        if size != self.size() {
            log::debug!("presenter: resizing backgrounds to {}", size);
            self.backgrounds = Backgrounds::new(size);
        }
    }

    pub fn status_light(&self) -> StatusLight {
        StatusLight::new(self.state, self.palette)
    }

    /// Evaluate one tick.
    pub fn render(&mut self, running: bool, snapshot: &Snapshot) -> (PresentationState, Paint<'_>) {
        let state = PresentationState::evaluate(running, snapshot);
        if state != self.state {
            log::info!("presenter: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
        let paint = match (state, &snapshot.frame) {
            (PresentationState::Live, Some(frame)) => Paint::Frame(Arc::clone(frame)),
            _ => Paint::Background(self.backgrounds.for_state(state)),
        };
        (state, paint)
    }
}
