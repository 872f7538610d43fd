use crate::error::{Error, Result};

/// The line terminator of the `FTP` control connection.
pub const CRLF: &str = "\r\n";

/// Represents an `FTP` command line: `COMMAND [SP arguments] CRLF`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FtpLine {
    pub command: String,
    pub arguments: String,
}

impl FtpLine {
    #[must_use]
    pub fn new(command: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arguments: arguments.into(),
        }
    }

    /// Serialize the line; the separating space is omitted when there are no
    /// arguments.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = self.command.clone();
        if !self.arguments.is_empty() {
            line.push(' ');
            line.push_str(&self.arguments);
        }
        line.push_str(CRLF);
        line.into_bytes()
    }

    /// Decode a single `CRLF` terminated line, splitting the command from the
    /// arguments at the first space.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::invalid_format("FtpLine", "not valid utf-8"))?;
        let line = text
            .strip_suffix(CRLF)
            .ok_or_else(|| Error::invalid_format("FtpLine", "missing trailing CRLF"))?;
        let (command, arguments) = line.split_once(' ').unwrap_or((line, ""));
        Ok(Self::new(command, arguments))
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.command.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("USER", "anonymous", b"USER anonymous\r\n"; "with arguments")]
    #[test_case("PASV", "", b"PASV\r\n"; "without arguments")]
    #[test_case("STOR", "my file.txt", b"STOR my file.txt\r\n"; "arguments with spaces")]
    fn test_serialize(command: &str, arguments: &str, expected: &[u8]) {
        assert_eq!(expected, FtpLine::new(command, arguments).serialize());
    }

    #[test_case(b"RETR readme.txt\r\n", "RETR", "readme.txt"; "command and argument")]
    #[test_case(b"QUIT\r\n", "QUIT", ""; "command only")]
    #[test_case(b"STOR my file.txt\r\n", "STOR", "my file.txt"; "split at first space")]
    fn test_deserialize(input: &[u8], command: &str, arguments: &str) {
        let line = FtpLine::deserialize(input).unwrap();
        assert_eq!(command, line.command);
        assert_eq!(arguments, line.arguments);
        assert!(line.is_valid());
    }

    #[test_case(b"USER anonymous"; "no terminator")]
    #[test_case(b"USER anonymous\n"; "bare newline")]
    #[test_case(b""; "empty")]
    fn test_deserialize_missing_crlf(input: &[u8]) {
        let err = FtpLine::deserialize(input).unwrap_err();
        assert_eq!(
            Error::InvalidFormat(String::from("FtpLine"), String::from("missing trailing CRLF")),
            err
        );
    }

    #[test]
    fn test_deserialize_invalid_utf8() {
        let err = FtpLine::deserialize(b"USER \xff\r\n").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(..)));
    }

    #[test]
    fn test_is_valid() {
        let line = FtpLine::deserialize(b"\r\n").unwrap();
        assert!(!line.is_valid());
    }

    #[test]
    fn test_round_trip() {
        let line = FtpLine::new("CWD", "/pub/incoming");
        assert_eq!(line, FtpLine::deserialize(&line.serialize()).unwrap());
    }
}
