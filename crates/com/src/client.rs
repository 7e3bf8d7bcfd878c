use {
    crate::{
        ComError, MultipartParser, StreamEndpoint,
        multipart::MAX_HEADER_SIZE,
        request::{encode_request, stream_request},
        response::{ResponseHead, find_head_end, parse_head},
    },
    http::Version,
    std::time::Duration,
    tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
        time::timeout,
    },
};

/// Size of each socket read.
pub const CHUNK_SIZE: usize = 1024;

/// An open MJPEG stream: the request has been sent and the response head
/// accepted; the body is read one JPEG payload at a time.
pub struct MjpegClient {
    stream: TcpStream,
    head: ResponseHead,
    parser: MultipartParser,
    closed: bool,
    read_timeout: Option<Duration>,
}

impl MjpegClient {
    /// Connect to `endpoint`, request `path` and read the response head.
    ///
    /// # Errors
    ///
    /// Returns `ComError::ConnectTimeout` if the TCP connection is not
    /// established within `connect_timeout`, `ComError::Http` for a non-2xx
    /// status, and `ComError::Framing` for a malformed response head.
    pub async fn connect(
        endpoint: &StreamEndpoint,
        path: &str,
        connect_timeout: Duration,
    ) -> Result<Self, ComError> {
        let mut stream = timeout(connect_timeout, TcpStream::connect(endpoint.address()))
            .await
            .map_err(|_| ComError::ConnectTimeout)??;
        stream.set_nodelay(true)?;
        log::debug!("connected to {}", endpoint);

        let request = stream_request(endpoint, path, Version::HTTP_10)?;
        stream.write_all(&encode_request(&request)).await?;

        let mut buffer = Vec::with_capacity(CHUNK_SIZE);
        let mut chunk = [0u8; CHUNK_SIZE];
        let head_end = loop {
            if let Some(end) = find_head_end(&buffer) {
                break end;
            }
            if buffer.len() > MAX_HEADER_SIZE {
                return Err(ComError::Framing("response head too large".to_string()));
            }
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(ComError::ConnectionClosed);
            }
            buffer.extend_from_slice(&chunk[..n]);
        };

        let head = parse_head(&buffer[..head_end])?;
        if !head.status.is_success() {
            return Err(ComError::Http(head.status));
        }

        let boundary = head.boundary();
        if boundary.is_none() {
            log::warn!("response from {} names no multipart boundary", endpoint);
        }
        let mut parser = MultipartParser::new(boundary.as_deref());
        parser.push(&buffer[head_end..]);

        Ok(Self {
            stream,
            head,
            parser,
            closed: false,
            read_timeout: None,
        })
    }

    /// Give up with `ComError::ReadTimeout` when a body read waits longer
    /// than `read_timeout`. `None` waits forever.
    pub fn set_read_timeout(&mut self, read_timeout: Option<Duration>) {
        self.read_timeout = read_timeout;
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    /// Read until the next complete JPEG payload.
    ///
    /// Returns `Ok(None)` once the peer has closed the stream cleanly (or
    /// sent the closing delimiter), and `ComError::ConnectionClosed` if it
    /// closed in the middle of a part.
    pub async fn next_part(&mut self) -> Result<Option<Vec<u8>>, ComError> {
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            if let Some(part) = self.parser.next_part()? {
                return Ok(Some(part));
            }
            if self.closed || self.parser.is_finished() {
                return Ok(None);
            }

            let n = match self.read_timeout {
                Some(limit) => timeout(limit, self.stream.read(&mut chunk))
                    .await
                    .map_err(|_| ComError::ReadTimeout)??,
                None => self.stream.read(&mut chunk).await?,
            };
            if n == 0 {
                self.closed = true;
                let clean = self.parser.is_between_parts();
                if let Some(part) = self.parser.finish() {
                    return Ok(Some(part));
                }
                return if clean {
                    Ok(None)
                } else {
                    Err(ComError::ConnectionClosed)
                };
            }
            self.parser.push(&chunk[..n]);
        }
    }
}
