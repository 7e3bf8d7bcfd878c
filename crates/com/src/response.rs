use {
    crate::ComError,
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode, Version,
        header::CONTENT_TYPE,
    },
};

/// Status line and headers of the stream response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub version: Version,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Byte offset just past the blank line that ends the response head.
pub fn find_head_end(buffer: &[u8]) -> Option<usize> {
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| i + 4);
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| i + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn parse_version(token: &str) -> Result<Version, ComError> {
    match token.to_ascii_uppercase().as_str() {
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        _ => Err(ComError::Framing(format!("unsupported HTTP version {token:?}"))),
    }
}

/// Parse the bytes of a response head (status line plus header lines).
pub fn parse_head(head: &[u8]) -> Result<ResponseHead, ComError> {
    let text = String::from_utf8_lossy(head);
    let mut lines = text.lines();

    let status_line = lines
        .next()
        .ok_or_else(|| ComError::Framing("empty response".to_string()))?;
    let mut parts = status_line.split_whitespace();
    let version = parse_version(parts.next().unwrap_or_default())?;
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ComError::Framing(format!("invalid status line {status_line:?}")))?;

    let mut headers = HeaderMap::new();
    for line in lines.map(str::trim_end).take_while(|line| !line.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            log::debug!("ignoring malformed header line {:?}", line);
            continue;
        };
        match (
            HeaderName::from_bytes(name.trim().as_bytes()),
            HeaderValue::from_str(value.trim()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => log::debug!("ignoring invalid header {:?}", line),
        }
    }

    Ok(ResponseHead {
        version,
        status,
        headers,
    })
}

impl ResponseHead {
    /// The multipart boundary named by `Content-Type`, without a leading `--`.
    pub fn boundary(&self) -> Option<String> {
        let content_type = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        boundary_param(content_type)
    }
}

/// Extract the `boundary` parameter from a `Content-Type` value.
pub fn boundary_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        let value = value.strip_prefix("--").unwrap_or(value);
        (!value.is_empty()).then(|| value.to_string())
    })
}
