use {
    crate::*,
    base::Vec2,
    std::sync::Arc,
};

/// Result of one render tick.
#[derive(Debug, Clone)]
pub struct Tick<'a> {
    pub state: PresentationState,
    pub paint: Paint<'a>,
    pub light: StatusLight,
    pub button_label: &'static str,
    /// Install count of the store, unchanged while no new frame arrives.
    pub sequence: u64,
}

/// Owns a receiver, its frame store and the presenter, and drives them from
/// user actions and render ticks.
pub struct StreamView {
    config: StreamConfig,
    receiver: StreamReceiver,
    store: Arc<FrameStore>,
    presenter: Presenter,
}

impl StreamView {
    pub fn new(config: StreamConfig) -> Result<Self, VideoError> {
        config.validate()?;
        let receiver = StreamReceiver::new(&config);
        let store = Arc::new(FrameStore::new(config.size()));
        let presenter = Presenter::new(config.size(), Palette::new(config.colorblind()));
        Ok(Self {
            config,
            receiver,
            store,
            presenter,
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<FrameStore> {
        &self.store
    }

    pub fn size(&self) -> Vec2<usize> {
        self.presenter.size()
    }

    pub fn is_streaming(&self) -> bool {
        self.receiver.is_running()
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_streaming() {
            "Stop Stream"
        } else {
            "Start Stream"
        }
    }

    /// Start streaming if stopped, stop if streaming. Returns whether the
    /// stream is running afterwards.
    pub async fn toggle(&mut self) -> bool {
        if self.is_streaming() {
            self.stop().await;
        } else {
            self.start().await;
        }
        self.is_streaming()
    }

    pub async fn start(&mut self) {
        if self.is_streaming() {
            return;
        }
        self.store.mark_first_frame_reset();
        let sink: Arc<dyn FrameSink> = self.store.clone();
        self.receiver
            .start(self.config.endpoint().clone(), sink)
            .await;
    }

    /// Stop the stream and wait for the worker to exit.
    pub async fn stop(&mut self) {
        self.receiver.stop().await;
        self.store.mark_first_frame_reset();
    }

    /// Follow a change of the display extent. Frames already decoded for the
    /// old extent are dropped by the store.
    pub fn resize(&mut self, size: Vec2<usize>) {
        if size.is_empty() {
            log::debug!("stream view: ignoring empty size {}", size);
            return;
        }
        self.presenter.resize(size);
        self.store.set_extent(size);
    }

    pub fn tick(&mut self) -> Tick<'_> {
        let running = self.receiver.is_running();
        let button_label = self.button_label();
        let palette = self.presenter.palette();
        let snapshot = self.store.snapshot();
        let (state, paint) = self.presenter.render(running, &snapshot);
        Tick {
            state,
            paint,
            light: StatusLight::new(state, palette),
            button_label,
            sequence: snapshot.sequence,
        }
    }

    /// Stop the stream and release everything.
    pub async fn shutdown(mut self) {
        self.stop().await;
        log::info!("stream view: shut down");
    }
}
