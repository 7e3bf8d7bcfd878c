use {
    crate::{ComError, StreamEndpoint},
    http::{
        Method, Request, Version,
        header::{CONNECTION, CONTENT_LENGTH, HOST, USER_AGENT},
    },
};

pub const USER_AGENT_VALUE: &str = concat!("mjpeg-viewer/", env!("CARGO_PKG_VERSION"));

/// Build the GET request that opens the stream at `path`.
pub fn stream_request(
    endpoint: &StreamEndpoint,
    path: &str,
    version: Version,
) -> Result<Request<()>, ComError> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(path)
        .version(version)
        .header(HOST, endpoint.host_header())
        .header(USER_AGENT, USER_AGENT_VALUE)
        .header(CONTENT_LENGTH, "0");

    // 1.1 defaults to keep-alive
    if version == Version::HTTP_11 {
        builder = builder.header(CONNECTION, "close");
    }

    Ok(builder.body(())?)
}

/// Serialise a bodiless request: request line, one line per header, blank line.
pub fn encode_request(request: &Request<()>) -> Vec<u8> {
    let mut out = format!(
        "{} {} {:?}\r\n",
        request.method(),
        request.uri(),
        request.version()
    )
    .into_bytes();
    for (name, value) in request.headers() {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out
}
