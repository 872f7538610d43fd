use crate::config::ProtocolConfig;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// The decoded fields of a single packet and the result of checking it.
#[derive(Debug, Serialize)]
pub struct Report {
    pub protocol: String,
    pub valid: bool,
    pub checksum: ChecksumStatus,
    pub fields: IndexMap<String, String>,
}

impl Report {
    pub fn new(protocol: ProtocolConfig, valid: bool, checksum: ChecksumStatus) -> Self {
        Self {
            protocol: protocol.to_string(),
            valid,
            checksum,
            fields: IndexMap::new(),
        }
    }

    /// Add a decoded field, fields are reported in the order they are added.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl Display) -> Self {
        self.fields.insert(String::from(name), value.to_string());
        self
    }
}

/// The outcome of verifying the checksum or `CRC` a packet carries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChecksumStatus {
    /// The stored checksum matches the computed one.
    Ok,
    /// The stored checksum does not match the computed one.
    Bad,
    /// The format has no checksum or the addresses it needs were not given.
    Unchecked,
}

impl From<bool> for ChecksumStatus {
    fn from(valid: bool) -> Self {
        if valid {
            Self::Ok
        } else {
            Self::Bad
        }
    }
}

impl Display for ChecksumStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Bad => write!(f, "bad"),
            Self::Unchecked => write!(f, "unchecked"),
        }
    }
}
