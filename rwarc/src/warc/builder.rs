use std::io::{Error, ErrorKind, Write};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::warc::WARC_VERSION;

/// Writes WARC records, mostly useful to build archives for tests
pub struct WarcBuilder<W: Write> {
    inner: W,
    serial: u64,
}

// Splits `http://host/path` into its host and path
fn split_uri(uri: &str) -> (&str, &str) {
    let rest = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    }
}

impl<W: Write> WarcBuilder<W> {
    pub fn new(writer: W) -> Self {
        WarcBuilder {
            inner: writer,
            serial: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes one record, `WARC-Type`, `WARC-Record-ID`, `WARC-Date` and
    /// `Content-Length` are filled in.
    pub fn write_record(
        &mut self,
        rec_type: &str,
        headers: &[(&str, &str)],
        block: &[u8],
    ) -> Result<usize, Error> {
        let date = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| Error::new(ErrorKind::Other, e))?;
        self.serial += 1;

        let mut head = String::new();
        head.push_str(WARC_VERSION);
        head.push_str("\r\n");
        head.push_str(&format!("WARC-Type: {}\r\n", rec_type));
        head.push_str(&format!("WARC-Record-ID: <urn:rwarc:{}>\r\n", self.serial));
        head.push_str(&format!("WARC-Date: {}\r\n", date));
        for (name, value) in headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!("Content-Length: {}\r\n\r\n", block.len()));

        self.inner.write_all(head.as_bytes())?;
        self.inner.write_all(block)?;
        self.inner.write_all(b"\r\n\r\n")?;

        Ok(head.len() + block.len() + 4)
    }

    pub fn write_warcinfo(&mut self, fields: &str) -> Result<usize, Error> {
        self.write_record(
            "warcinfo",
            &[("Content-Type", "application/warc-fields")],
            fields.as_bytes(),
        )
    }

    pub fn write_request(&mut self, uri: &str) -> Result<usize, Error> {
        let (host, path) = split_uri(uri);
        let block = format!("GET {} HTTP/1.1\r\nHost: {}\r\n\r\n", path, host);

        self.write_record(
            "request",
            &[
                ("WARC-Target-URI", uri),
                ("Content-Type", "application/http; msgtype=request"),
            ],
            block.as_bytes(),
        )
    }

    /// A `200 OK` response carrying `body` with the given HTTP headers
    pub fn write_response(
        &mut self,
        uri: &str,
        http_headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<usize, Error> {
        let mut block = b"HTTP/1.1 200 OK\r\n".to_vec();
        for (name, value) in http_headers {
            block.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        block.extend_from_slice(b"\r\n");
        block.extend_from_slice(body);

        self.write_record(
            "response",
            &[
                ("WARC-Target-URI", uri),
                ("Content-Type", "application/http; msgtype=response"),
            ],
            &block,
        )
    }
}

#[cfg(test)]
mod test_warc_builder {
    use super::*;
    use std::str::from_utf8;

    #[test]
    fn record_layout() {
        let mut builder = WarcBuilder::new(Vec::new());
        let len = builder.write_record("resource", &[("X-Test", "1")], b"abc").unwrap();

        let data = builder.into_inner();
        assert_eq!(len, data.len());

        let text = from_utf8(&data).unwrap();
        assert!(text.starts_with("WARC/1.0\r\nWARC-Type: resource\r\nWARC-Record-ID: <urn:rwarc:1>\r\n"));
        assert!(text.contains("X-Test: 1\r\n"));
        assert!(text.ends_with("Content-Length: 3\r\n\r\nabc\r\n\r\n"));
    }

    #[test]
    fn serial_ids() {
        let mut builder = WarcBuilder::new(Vec::new());
        builder.write_warcinfo("").unwrap();
        builder.write_warcinfo("").unwrap();

        let data = builder.into_inner();
        let text = from_utf8(&data).unwrap();
        assert!(text.contains("<urn:rwarc:1>"));
        assert!(text.contains("<urn:rwarc:2>"));
    }

    #[test]
    fn uri_parts() {
        assert_eq!(split_uri("http://example.com/a/b?c"), ("example.com", "/a/b?c"));
        assert_eq!(split_uri("https://example.com"), ("example.com", "/"));
        assert_eq!(split_uri("example.com/x"), ("example.com", "/x"));
    }
}
