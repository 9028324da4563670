use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarcError {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("invalid header line: {0:?}")]
    InvalidHeader(String),
    #[error("permitted max header size exceeded")]
    MaxHeaderSize,
    #[error("record carries no HTTP headers")]
    NoHttpHeaders,
    #[error("malformed HTTP headers: {0}")]
    MalformedHttp(String),
}

impl From<rust_warc::WarcError> for WarcError {
    fn from(e: rust_warc::WarcError) -> Self {
        match e {
            rust_warc::WarcError::Malformed(reason) => WarcError::Malformed(reason),
            rust_warc::WarcError::IO(e) => WarcError::IO(e),
            rust_warc::WarcError::EOF => WarcError::IO(std::io::ErrorKind::UnexpectedEof.into()),
        }
    }
}

#[cfg(test)]
mod test_warc_error {
    use super::*;

    #[test]
    fn from_framing_error() {
        let e = WarcError::from(rust_warc::WarcError::Malformed("Unknown WARC version".to_string()));
        assert_eq!(e.to_string(), "malformed record: Unknown WARC version");

        let e = WarcError::from(rust_warc::WarcError::IO(std::io::ErrorKind::UnexpectedEof.into()));
        assert!(matches!(e, WarcError::IO(_)));
    }
}
