//! Incremental parser for `multipart/x-mixed-replace` bodies.
//!
//! Bytes are pushed in whatever chunks the socket yields; complete payloads
//! are pulled out with `next_part`. A part's length comes from its
//! `Content-Length` header when present, otherwise from the position of the
//! next boundary marker.

use crate::ComError;

pub const MAX_PART_SIZE: usize = 16 * 1024 * 1024; // 16 MB

// bytes of boundary lines, part headers and filler allowed between payloads
pub const MAX_HEADER_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Delimiter,
    Headers { length: Option<usize> },
    Body { length: Option<usize> },
    Done,
}

pub struct MultipartParser {
    marker: Option<Vec<u8>>,
    buffer: Vec<u8>,
    state: State,
    scan_from: usize,
    overhead: usize,
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn trim_line_end(payload: &mut Vec<u8>) {
    if payload.ends_with(b"\n") {
        payload.pop();
        if payload.ends_with(b"\r") {
            payload.pop();
        }
    }
}

impl MultipartParser {
    /// `boundary` is the `Content-Type` parameter without the leading `--`.
    /// With `None`, the boundary is taken from the first `--` line of the body.
    pub fn new(boundary: Option<&str>) -> Self {
        Self {
            marker: boundary
                .filter(|b| !b.is_empty())
                .map(|b| format!("--{b}").into_bytes()),
            buffer: Vec::new(),
            state: State::Delimiter,
            scan_from: 0,
            overhead: 0,
        }
    }

    /// The boundary in use, without the leading `--`, once known.
    pub fn boundary(&self) -> Option<&[u8]> {
        self.marker.as_deref().map(|m| &m[2..])
    }

    pub fn push(&mut self, data: &[u8]) {
        if self.state != State::Done {
            self.buffer.extend_from_slice(data);
        }
    }

    /// The closing delimiter has been seen, or `finish` was called.
    pub fn is_finished(&self) -> bool {
        self.state == State::Done
    }

    /// No part is partially received.
    pub fn is_between_parts(&self) -> bool {
        matches!(self.state, State::Delimiter | State::Done)
    }

    /// Pull the next complete payload. `Ok(None)` means more input is needed
    /// (or the stream is finished, see `is_finished`).
    pub fn next_part(&mut self) -> Result<Option<Vec<u8>>, ComError> {
        loop {
            match self.state {
                State::Done => return Ok(None),
                State::Delimiter => {
                    if !self.read_delimiter()? {
                        return Ok(None);
                    }
                }
                State::Headers { length } => {
                    if !self.read_header_line(length)? {
                        return Ok(None);
                    }
                }
                State::Body {
                    length: Some(length),
                } => {
                    if self.buffer.len() < length {
                        return Ok(None);
                    }
                    let payload: Vec<u8> = self.buffer.drain(..length).collect();
                    self.end_part();
                    return Ok(Some(payload));
                }
                State::Body { length: None } => return self.read_delimited_body(),
            }
        }
    }

    /// End of input. Returns the trailing part if it was delimiter-terminated
    /// and the peer closed instead of sending another boundary.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let state = std::mem::replace(&mut self.state, State::Done);
        let mut rest = std::mem::take(&mut self.buffer);
        match state {
            State::Body { length: None } if !rest.is_empty() => {
                trim_line_end(&mut rest);
                Some(rest)
            }
            _ => None,
        }
    }

    fn end_part(&mut self) {
        self.state = State::Delimiter;
        self.scan_from = 0;
        self.overhead = 0;
    }

    fn add_overhead(&mut self, bytes: usize) -> Result<(), ComError> {
        self.overhead += bytes;
        if self.overhead > MAX_HEADER_SIZE {
            return Err(ComError::Framing(format!(
                "no payload after {} bytes of framing",
                self.overhead
            )));
        }
        Ok(())
    }

    // false = need more input
    fn read_delimiter(&mut self) -> Result<bool, ComError> {
        let Some(marker) = self.marker.as_deref() else {
            return self.learn_marker();
        };
        let marker_len = marker.len();

        let Some(pos) = find(&self.buffer, marker, 0) else {
            // drop filler, keep a tail that may hold the start of a marker
            let discard = self.buffer.len().saturating_sub(marker_len - 1);
            self.buffer.drain(..discard);
            self.add_overhead(discard)?;
            return Ok(false);
        };

        let rest = &self.buffer[pos + marker_len..];
        if rest.starts_with(b"--") {
            log::debug!("multipart: closing delimiter");
            self.state = State::Done;
            self.buffer.clear();
            return Ok(true);
        }
        let Some(newline) = rest.iter().position(|&b| b == b'\n') else {
            if rest.len() > MAX_HEADER_SIZE {
                return Err(ComError::Framing("unterminated boundary line".to_string()));
            }
            return Ok(false);
        };

        let consumed = pos + marker_len + newline + 1;
        self.buffer.drain(..consumed);
        self.add_overhead(consumed)?;
        self.state = State::Headers { length: None };
        Ok(true)
    }

    fn learn_marker(&mut self) -> Result<bool, ComError> {
        loop {
            let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > MAX_HEADER_SIZE {
                    return Err(ComError::Framing("no boundary line in body".to_string()));
                }
                return Ok(false);
            };
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.add_overhead(raw.len())?;
            let line = raw.trim_ascii();
            if line.is_empty() {
                continue;
            }
            if line.len() <= 2 || !line.starts_with(b"--") {
                return Err(ComError::Framing(format!(
                    "expected boundary line, got {:?}",
                    String::from_utf8_lossy(line)
                )));
            }
            log::debug!(
                "multipart: using boundary {:?} from body",
                String::from_utf8_lossy(&line[2..])
            );
            self.marker = Some(line.to_vec());
            self.state = State::Headers { length: None };
            return Ok(true);
        }
    }

    fn read_header_line(&mut self, length: Option<usize>) -> Result<bool, ComError> {
        let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') else {
            if self.buffer.len() > MAX_HEADER_SIZE {
                return Err(ComError::Framing("part header line too long".to_string()));
            }
            return Ok(false);
        };
        let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
        self.add_overhead(raw.len())?;

        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();
        if line.is_empty() {
            self.state = State::Body { length };
            self.scan_from = 0;
            return Ok(true);
        }

        let length = match line.split_once(':') {
            Some((name, value)) if name.trim().eq_ignore_ascii_case("content-length") => {
                let value = value.trim();
                let len = value.parse::<usize>().map_err(|_| {
                    ComError::Framing(format!("invalid Content-Length {value:?}"))
                })?;
                if len > MAX_PART_SIZE {
                    return Err(ComError::PartTooLarge(len));
                }
                Some(len)
            }
            _ => length,
        };
        self.state = State::Headers { length };
        Ok(true)
    }

    fn read_delimited_body(&mut self) -> Result<Option<Vec<u8>>, ComError> {
        let Some(marker) = self.marker.as_deref() else {
            return Err(ComError::Framing("part body without boundary".to_string()));
        };
        let marker_len = marker.len();

        match find(&self.buffer, marker, self.scan_from) {
            None => {
                if self.buffer.len() > MAX_PART_SIZE {
                    return Err(ComError::PartTooLarge(self.buffer.len()));
                }
                self.scan_from = self.buffer.len().saturating_sub(marker_len - 1);
                Ok(None)
            }
            Some(pos) => {
                let mut payload: Vec<u8> = self.buffer.drain(..pos).collect();
                trim_line_end(&mut payload);
                self.end_part();
                Ok(Some(payload))
            }
        }
    }
}
