use {
    crate::*,
    base::Vec2,
    com::{MjpegClient, StreamEndpoint},
    image::{DecodedFrame, Scaling},
    std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    },
    tokio::{sync::oneshot, task::JoinHandle},
};

/// Receives the output of a `StreamReceiver` worker.
///
/// Called from the worker task, never while the receiver's caller holds a
/// lock of its own.
pub trait FrameSink: Send + Sync {
    /// A frame was decoded at the extent last reported by `extent()`.
    fn on_frame(&self, frame: DecodedFrame);

    /// The worker has stopped. Called exactly once per `start`.
    fn on_stopped(&self);

    /// Extent the next frame should be decoded to.
    fn extent(&self) -> Vec2<usize>;
}

struct Session {
    endpoint: StreamEndpoint,
    path: String,
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
    scaling: Scaling,
}

/// Background MJPEG receiver.
///
/// At most one worker task exists at a time. The worker connects, reads parts
/// until the stream ends or `stop` is called, and reports through the
/// `FrameSink` given to `start`.
pub struct StreamReceiver {
    path: String,
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
    scaling: Scaling,
    running: Arc<AtomicBool>,
    cancel: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl StreamReceiver {
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            path: config.path().to_string(),
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            scaling: config.scaling(),
            running: Arc::new(AtomicBool::new(false)),
            cancel: None,
            join_handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn a worker streaming from `endpoint` into `sink`.
    ///
    /// Does nothing and returns `false` while a worker is running. A worker
    /// that ended on its own is reaped first.
    pub async fn start(&mut self, endpoint: StreamEndpoint, sink: Arc<dyn FrameSink>) -> bool {
        if self.is_running() {
            log::debug!("stream receiver: already running");
            return false;
        }
        self.reap().await;

        let session = Session {
            endpoint,
            path: self.path.clone(),
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            scaling: self.scaling,
        };
        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.running.store(true, Ordering::SeqCst);
        self.join_handle = Some(tokio::spawn(worker(
            session,
            sink,
            Arc::clone(&self.running),
            cancel_rx,
        )));
        self.cancel = Some(cancel_tx);
        true
    }

    /// Cancel the worker and wait for it to exit.
    ///
    /// When this returns, the worker's `on_stopped` has run and no further
    /// callbacks will be made. Safe to call when nothing is running.
    pub async fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            // the worker may already be gone
            let _ = cancel.send(());
        }
        self.reap().await;
    }

    async fn reap(&mut self) {
        self.cancel.take();
        if let Some(join_handle) = self.join_handle.take() {
            if let Err(error) = join_handle.await {
                log::error!("stream receiver: worker failed: {}", error);
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }
}

impl Drop for StreamReceiver {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

async fn worker(
    session: Session,
    sink: Arc<dyn FrameSink>,
    running: Arc<AtomicBool>,
    mut cancel: oneshot::Receiver<()>,
) {
    log::info!("stream worker: connecting to {}{}", session.endpoint, session.path);

    // dropping the sender counts as a cancel too
    let result = tokio::select! {
        result = run_session(&session, sink.as_ref()) => result,
        _ = &mut cancel => {
            log::info!("stream worker: stop requested");
            Ok(())
        }
    };
    if let Err(error) = result {
        log::warn!("stream worker: {}: {}", session.endpoint, error);
    }

    running.store(false, Ordering::SeqCst);
    sink.on_stopped();
    log::info!("stream worker: stopped");
}

async fn run_session(session: &Session, sink: &dyn FrameSink) -> Result<(), VideoError> {
    let mut client =
        MjpegClient::connect(&session.endpoint, &session.path, session.connect_timeout).await?;
    client.set_read_timeout(session.read_timeout);
    log::info!("stream worker: streaming from {}", session.endpoint);

    let mut decoded = 0u64;
    let mut skipped = 0u64;
    while let Some(payload) = client.next_part().await? {
        match decode(payload, sink.extent(), session.scaling).await {
            Ok(frame) => {
                decoded += 1;
                sink.on_frame(frame);
            }
            Err(error) => {
                skipped += 1;
                log::debug!("stream worker: skipping frame: {}", error);
            }
        }
    }

    log::info!(
        "stream worker: closed by peer after {} frames ({} skipped)",
        decoded,
        skipped
    );
    Ok(())
}

async fn decode(
    payload: Vec<u8>,
    extent: Vec2<usize>,
    scaling: Scaling,
) -> Result<DecodedFrame, VideoError> {
    Ok(image::decode_frame(payload, extent, scaling).await?)
}
