use {crate::ComError, std::{fmt, str::FromStr}};

pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Host and port of an MJPEG source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamEndpoint {
    host: String,
    port: u16,
}

impl StreamEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value for the `Host` request header.
    pub fn host_header(&self) -> String {
        if self.port == DEFAULT_HTTP_PORT {
            self.host.clone()
        } else {
            self.address()
        }
    }

    /// Parse `[http://]host[:port][/path]`.
    ///
    /// Returns the endpoint and the path, if one was given. `https://` is
    /// refused since the client speaks plain TCP only.
    pub fn parse_url(url: &str) -> Result<(Self, Option<String>), ComError> {
        let url = url.trim();
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("https://") {
            return Err(ComError::InvalidEndpoint(format!("TLS is not supported: {url}")));
        }
        let rest = if lower.starts_with("http://") {
            &url[7..]
        } else {
            url
        };

        let (authority, path) = match rest.find('/') {
            Some(i) if i + 1 < rest.len() => (&rest[..i], Some(rest[i..].to_string())),
            Some(i) => (&rest[..i], None),
            None => (rest, None),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ComError::InvalidEndpoint(format!("bad port in {url}")))?;
                (host, port)
            }
            None => (authority, DEFAULT_HTTP_PORT),
        };

        if host.is_empty() {
            return Err(ComError::InvalidEndpoint(format!("missing host in {url}")));
        }

        Ok((Self::new(host, port), path))
    }
}

impl FromStr for StreamEndpoint {
    type Err = ComError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::parse_url(s)? {
            (endpoint, None) => Ok(endpoint),
            (_, Some(path)) => Err(ComError::InvalidEndpoint(format!(
                "unexpected path {path} in endpoint {s}"
            ))),
        }
    }
}

impl fmt::Display for StreamEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
