use crate::error::{Error, Result};
use crate::fmt_payload;
use std::fmt::{Debug, Formatter};

const CRLF: &[u8] = b"\r\n";

/// Represents an `SSH` identification line and whatever follows it.
///
/// The line is `protocol_version "-" software_version CRLF` and is split at
/// the first dash, so `SSH-2.0-OpenSSH_9.6` decodes as protocol version `SSH`
/// and software version `2.0-OpenSSH_9.6`. A protocol version containing a
/// dash does not survive a round trip.
#[derive(Clone, Eq, PartialEq)]
pub struct SshLine {
    pub protocol_version: String,
    pub software_version: String,
    pub payload: Vec<u8>,
}

impl SshLine {
    #[must_use]
    pub fn new(
        protocol_version: impl Into<String>,
        software_version: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            software_version: software_version.into(),
            payload,
        }
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            self.protocol_version.len() + self.software_version.len() + 3 + self.payload.len(),
        );
        bytes.extend_from_slice(self.protocol_version.as_bytes());
        bytes.push(b'-');
        bytes.extend_from_slice(self.software_version.as_bytes());
        bytes.extend_from_slice(CRLF);
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Decode the first `CRLF` terminated line; the bytes after it are the
    /// payload.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let line_end = data
            .windows(CRLF.len())
            .position(|window| window == CRLF)
            .ok_or_else(|| Error::invalid_format("SshLine", "missing CRLF"))?;
        let line = std::str::from_utf8(&data[..line_end])
            .map_err(|_| Error::invalid_format("SshLine", "not valid utf-8"))?;
        let (protocol_version, software_version) = split_versions(line);
        Ok(Self::new(
            protocol_version,
            software_version,
            data[line_end + CRLF.len()..].to_vec(),
        ))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.protocol_version.is_empty()
    }
}

fn split_versions(line: &str) -> (&str, &str) {
    line.split_once('-').unwrap_or((line, ""))
}

impl Debug for SshLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshLine")
            .field("protocol_version", &self.protocol_version)
            .field("software_version", &self.software_version)
            .field("payload", &fmt_payload(&self.payload))
            .finish()
    }
}
