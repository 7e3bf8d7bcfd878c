use {
    base::Vec2,
    com::StreamEndpoint,
    image::{DecodedFrame, Scaling},
    std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    },
    tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        sync::mpsc,
        task::JoinHandle,
        time::{sleep, timeout},
    },
    video::{FrameSink, StreamConfig, StreamReceiver},
};

const EXTENT: Vec2<usize> = Vec2::new(16, 12);
const WAIT: Duration = Duration::from_secs(5);

const OK_HEAD: &str =
    "HTTP/1.0 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary=frame\r\n\r\n";

#[derive(Debug, PartialEq)]
enum Event {
    Frame(Vec2<usize>),
    Stopped,
}

struct RecordingSink {
    events: mpsc::UnboundedSender<Event>,
    frames: AtomicUsize,
    stops: AtomicUsize,
    last: Mutex<Option<DecodedFrame>>,
}

impl RecordingSink {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Event>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let sink = Arc::new(Self {
            events,
            frames: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            last: Mutex::new(None),
        });
        (sink, receiver)
    }
}

impl FrameSink for RecordingSink {
    fn on_frame(&self, frame: DecodedFrame) {
        self.frames.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.send(Event::Frame(frame.size()));
        *self.last.lock().unwrap() = Some(frame);
    }

    fn on_stopped(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.send(Event::Stopped);
    }

    fn extent(&self) -> Vec2<usize> {
        EXTENT
    }
}

fn jpeg(seed: u8) -> Vec<u8> {
    let img = crates_image::RgbImage::from_fn(EXTENT.x as u32, EXTENT.y as u32, |x, y| {
        crates_image::Rgb([seed, (x * 10) as u8, (y * 10) as u8])
    });
    let mut buffer = Vec::new();
    crates_image::codecs::jpeg::JpegEncoder::new(&mut buffer)
        .encode_image(&img)
        .expect("jpeg encode failed");
    buffer
}

fn part(payload: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "--frame\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        payload.len()
    )
    .into_bytes();
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\r\n");
    out
}

async fn read_request(socket: &mut TcpStream) {
    let mut request = Vec::new();
    let mut byte = [0u8; 1];
    while !request.ends_with(b"\r\n\r\n") {
        match socket.read(&mut byte).await {
            Ok(0) | Err(_) => break,
            Ok(_) => request.push(byte[0]),
        }
    }
}

/// Answer one connection with `head` and `body`, then close.
async fn serve_once(head: &'static str, body: Vec<u8>) -> (StreamEndpoint, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.ok();
    });
    (StreamEndpoint::new("127.0.0.1", port), handle)
}

/// Stream the same frame every 10 ms until the client goes away.
async fn serve_forever() -> (StreamEndpoint, JoinHandle<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let port = listener.local_addr().unwrap().port();
    let frame = part(&jpeg(100));
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(OK_HEAD.as_bytes()).await.unwrap();
        let mut sent = 0;
        while socket.write_all(&frame).await.is_ok() {
            sent += 1;
            sleep(Duration::from_millis(10)).await;
        }
        sent
    });
    (StreamEndpoint::new("127.0.0.1", port), handle)
}

fn config() -> StreamConfig {
    StreamConfig::default().with_connect_timeout(Duration::from_secs(2))
}

fn receiver() -> StreamReceiver {
    StreamReceiver::new(&config())
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for receiver")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_frames_then_peer_close() {
    let mut body = Vec::new();
    for seed in 0..3 {
        body.extend(part(&jpeg(seed)));
    }
    let (endpoint, server) = serve_once(OK_HEAD, body).await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    assert!(receiver.start(endpoint, sink.clone()).await);
    for _ in 0..3 {
        assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    }
    assert_eq!(next_event(&mut events).await, Event::Stopped);
    assert!(!receiver.is_running());

    receiver.stop().await;
    server.await.unwrap();
    assert_eq!(sink.frames.load(Ordering::SeqCst), 3);
    assert_eq!(sink.stops.load(Ordering::SeqCst), 1);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_connection_refused_stops_promptly() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();
    receiver
        .start(StreamEndpoint::new("127.0.0.1", port), sink.clone())
        .await;

    assert_eq!(next_event(&mut events).await, Event::Stopped);
    assert!(!receiver.is_running());
    receiver.stop().await;
    assert_eq!(sink.frames.load(Ordering::SeqCst), 0);
    assert_eq!(sink.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_corrupt_payload_is_skipped() {
    let mut body = part(&jpeg(1));
    body.extend(part(b"\xFF\xD8 definitely not a jpeg \xFF\xD9"));
    body.extend(part(&jpeg(2)));
    let (endpoint, _server) = serve_once(OK_HEAD, body).await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    receiver.start(endpoint, sink.clone()).await;
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Stopped);
    assert_eq!(sink.frames.load(Ordering::SeqCst), 2);
}

fn small_jpeg() -> Vec<u8> {
    let mut small = Vec::new();
    let img = crates_image::RgbImage::new(8, 8);
    crates_image::codecs::jpeg::JpegEncoder::new(&mut small)
        .encode_image(&img)
        .expect("jpeg encode failed");
    small
}

#[tokio::test]
async fn test_wrong_size_frame_is_skipped_when_exact() {
    let mut body = part(&small_jpeg());
    body.extend(part(&jpeg(3)));
    let (endpoint, _server) = serve_once(OK_HEAD, body).await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = StreamReceiver::new(&config().with_scaling(Scaling::Exact));

    receiver.start(endpoint, sink.clone()).await;
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Stopped);
    assert_eq!(sink.frames.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_wrong_size_frame_is_resized_by_default() {
    let (endpoint, _server) = serve_once(OK_HEAD, part(&small_jpeg())).await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    receiver.start(endpoint, sink.clone()).await;
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Stopped);
}

#[tokio::test]
async fn test_delivered_frames_are_bgra() {
    let img = crates_image::RgbImage::from_pixel(
        EXTENT.x as u32,
        EXTENT.y as u32,
        crates_image::Rgb([230, 20, 10]),
    );
    let mut red = Vec::new();
    crates_image::codecs::jpeg::JpegEncoder::new(&mut red)
        .encode_image(&img)
        .expect("jpeg encode failed");
    let (endpoint, _server) = serve_once(OK_HEAD, part(&red)).await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    receiver.start(endpoint, sink.clone()).await;
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Stopped);

    let frame = sink.last.lock().unwrap().take().expect("no frame delivered");
    assert_eq!(frame.order(), image::ChannelOrder::Bgra);
    assert_eq!(frame.pixels().len(), EXTENT.rgba_len());
    for pixel in frame.pixels().chunks_exact(4) {
        // red lands in byte 2, blue in byte 0
        assert!(pixel[2] > 200, "{pixel:?}");
        assert!(pixel[0] < 50, "{pixel:?}");
        assert_eq!(pixel[3], 255);
    }
}

#[tokio::test]
async fn test_read_timeout_ends_silent_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let port = listener.local_addr().unwrap().port();
    let frame = part(&jpeg(1));
    let _server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(OK_HEAD.as_bytes()).await.unwrap();
        socket.write_all(&frame).await.unwrap();
        let mut rest = [0u8; 16];
        let _ = socket.read(&mut rest).await;
    });
    let (sink, mut events) = RecordingSink::new();
    let mut receiver =
        StreamReceiver::new(&config().with_read_timeout(Some(Duration::from_millis(200))));

    receiver
        .start(StreamEndpoint::new("127.0.0.1", port), sink.clone())
        .await;
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Stopped);
    assert!(!receiver.is_running());
}

#[tokio::test]
async fn test_framing_error_ends_session() {
    let mut body = part(&jpeg(1));
    body.extend_from_slice(b"--frame\r\nContent-Length: 999999999\r\n\r\n");
    let (endpoint, _server) = serve_once(OK_HEAD, body).await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    receiver.start(endpoint, sink.clone()).await;
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Stopped);
    assert!(!receiver.is_running());
}

#[tokio::test]
async fn test_http_error_status_ends_session() {
    let (endpoint, _server) = serve_once("HTTP/1.0 404 Not Found\r\n\r\n", Vec::new()).await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    receiver.start(endpoint, sink.clone()).await;
    assert_eq!(next_event(&mut events).await, Event::Stopped);
    assert_eq!(sink.frames.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stop_while_streaming() {
    let (endpoint, server) = serve_forever().await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    receiver.start(endpoint, sink.clone()).await;
    assert!(receiver.is_running());
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));

    timeout(WAIT, receiver.stop()).await.expect("stop timed out");
    assert!(!receiver.is_running());
    assert_eq!(sink.stops.load(Ordering::SeqCst), 1);

    // nothing arrives once stop has returned
    let frames = sink.frames.load(Ordering::SeqCst);
    sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.frames.load(Ordering::SeqCst), frames);
    assert_eq!(sink.stops.load(Ordering::SeqCst), 1);

    while let Ok(event) = events.try_recv() {
        if event == Event::Stopped {
            assert!(events.try_recv().is_err());
        }
    }

    let sent = timeout(WAIT, server).await.expect("server did not notice").unwrap();
    assert!(sent >= 1);
}

#[tokio::test]
async fn test_start_while_running_is_noop() {
    let (endpoint, _server) = serve_forever().await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    assert!(receiver.start(endpoint.clone(), sink.clone()).await);
    assert!(!receiver.start(endpoint, sink.clone()).await);
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));

    receiver.stop().await;
    assert_eq!(sink.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_restart_after_peer_close() {
    let (endpoint, _first) = serve_once(OK_HEAD, part(&jpeg(1))).await;
    let (sink, mut events) = RecordingSink::new();
    let mut receiver = receiver();

    receiver.start(endpoint, sink.clone()).await;
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Stopped);

    let (endpoint, _second) = serve_once(OK_HEAD, part(&jpeg(2))).await;
    assert!(receiver.start(endpoint, sink.clone()).await);
    assert_eq!(next_event(&mut events).await, Event::Frame(EXTENT));
    assert_eq!(next_event(&mut events).await, Event::Stopped);
    assert_eq!(sink.stops.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stop_without_start() {
    let mut receiver = receiver();
    receiver.stop().await;
    receiver.stop().await;
    assert!(!receiver.is_running());
}
