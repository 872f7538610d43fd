use thiserror::Error;

/// A packet error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A packet error.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// Attempting to decode a packet from an insufficient buffer.
    ///
    /// The minimum is either the fixed header size of the format or a length
    /// declared within the header itself, such as the `IPv4` IHL.
    #[error("insufficient buffer for {0} packet, minimum={1}, provided={2}")]
    TooShort(String, usize, usize),
    /// A text based format is missing a required delimiter.
    #[error("invalid {0} format: {1}")]
    InvalidFormat(String, String),
}

impl Error {
    pub(crate) fn too_short(name: &str, minimum: usize, provided: usize) -> Self {
        Self::TooShort(String::from(name), minimum, provided)
    }

    pub(crate) fn invalid_format(name: &str, reason: &str) -> Self {
        Self::InvalidFormat(String::from(name), String::from(reason))
    }
}
