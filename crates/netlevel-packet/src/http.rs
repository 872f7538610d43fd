use crate::error::{Error, Result};
use crate::fmt_payload;
use indexmap::IndexMap;
use std::fmt::{Debug, Formatter};

const CRLF: &str = "\r\n";
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const HEADER_SEPARATOR: &str = ": ";

/// Represents an `HTTP` request or response.
///
/// Header names are stored exactly as received and kept in insertion order; a
/// repeated name replaces the earlier value in place.
#[derive(Clone, Eq, PartialEq)]
pub struct HttpMessage {
    pub start_line: String,
    pub headers: IndexMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpMessage {
    #[must_use]
    pub fn new(
        start_line: impl Into<String>,
        headers: IndexMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            start_line: start_line.into(),
            headers,
            body,
        }
    }

    /// Serialize the start line, headers, blank line and body.
    ///
    /// The blank line is written even when the body is empty.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut head = self.start_line.clone();
        head.push_str(CRLF);
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(HEADER_SEPARATOR);
            head.push_str(value);
            head.push_str(CRLF);
        }
        head.push_str(CRLF);
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Decode a message.
    ///
    /// The head ends at the first blank line; without one the whole input is
    /// the head. Header lines lacking `": "` are skipped.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let (head, body) = match data
            .windows(HEADER_TERMINATOR.len())
            .position(|window| window == HEADER_TERMINATOR)
        {
            Some(idx) => (&data[..idx], &data[idx + HEADER_TERMINATOR.len()..]),
            None => (data, &data[data.len()..]),
        };
        let head = std::str::from_utf8(head)
            .map_err(|_| Error::invalid_format("HttpMessage", "head is not valid utf-8"))?;
        let mut lines = head.split(CRLF);
        let start_line = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or_else(|| Error::invalid_format("HttpMessage", "missing start line"))?;
        let mut headers = IndexMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(HEADER_SEPARATOR) {
                headers.insert(String::from(name), String::from(value));
            } else {
                tracing::debug!(line, "skipping malformed http header line");
            }
        }
        Ok(Self::new(start_line, headers, body.to_vec()))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.start_line.is_empty()
    }
}

impl Debug for HttpMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMessage")
            .field("start_line", &self.start_line)
            .field("headers", &self.headers)
            .field("body", &fmt_payload(&self.body))
            .finish()
    }
}
