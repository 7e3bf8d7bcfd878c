use {
    crate::VideoError,
    base::Vec2,
    com::StreamEndpoint,
    image::Scaling,
    std::time::Duration,
};

/// Request path used when none is given.
pub const DEFAULT_PATH: &str = "/mjpg/video.mjpg";

/// Configuration for an MJPEG stream view.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    endpoint: StreamEndpoint,
    path: String,
    size: Vec2<usize>,
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
    scaling: Scaling,
    colorblind: bool,
    tick_rate: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: StreamEndpoint::new("127.0.0.1", 8080),
            path: DEFAULT_PATH.to_string(),
            size: Vec2::new(320, 240),
            connect_timeout: Duration::from_secs(5),
            read_timeout: None,
            scaling: Scaling::Resize,
            colorblind: false,
            tick_rate: 30,
        }
    }
}

impl StreamConfig {
    /// Set the camera host and port.
    pub fn with_endpoint(mut self, endpoint: StreamEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Set the request path (e.g., "/mjpg/video.mjpg").
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the display extent in pixels. Frames are decoded to this size.
    pub fn with_size(mut self, size: Vec2<usize>) -> Self {
        self.size = size;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// End the session when the camera sends nothing for `read_timeout`.
    /// `None` keeps a silent connection open until it is stopped.
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Set what happens to frames whose native size differs from the display.
    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Use the colorblind-friendly status light palette.
    pub fn with_colorblind(mut self, colorblind: bool) -> Self {
        self.colorblind = colorblind;
        self
    }

    /// Set the render ticks per second.
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    // Getters
    pub fn endpoint(&self) -> &StreamEndpoint {
        &self.endpoint
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> Vec2<usize> {
        self.size
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    pub fn colorblind(&self) -> bool {
        self.colorblind
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Interval between render ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    pub fn validate(&self) -> Result<(), VideoError> {
        if self.size.is_empty() {
            return Err(VideoError::Config(format!("empty display size {}", self.size)));
        }
        if !self.path.starts_with('/') {
            return Err(VideoError::Config(format!(
                "request path must start with '/': {}",
                self.path
            )));
        }
        if self.tick_rate == 0 {
            return Err(VideoError::Config("tick rate must be positive".to_string()));
        }
        if self.connect_timeout.is_zero() {
            return Err(VideoError::Config("connect timeout must be positive".to_string()));
        }
        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(VideoError::Config("read timeout must be positive".to_string()));
        }
        Ok(())
    }
}
