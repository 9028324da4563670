use std::io::BufRead;

use crate::buf::{read_line, trim_eol};
use crate::warc::content::Encoding;
use crate::warc::error::WarcError;
use crate::warc::MAX_HEADER_SIZE;

/// Ordered header fields with case-insensitive lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Headers { fields: Vec::new() }
    }

    /// First value stored under `name`, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn push(&mut self, name: &str, value: &str) {
        self.fields.push((name.to_string(), value.to_string()));
    }

    // Folded header line, glue it onto the previous value
    fn extend_last(&mut self, more: &str) -> bool {
        match self.fields.last_mut() {
            Some((_, value)) => {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(more);
                true
            }
            None => false,
        }
    }
}

// Headers are supposed to be ASCII but plenty of servers send raw Latin-1
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Reads `Name: value` lines until an empty line or the end of the block.
///
/// Every byte read is charged against `budget`.
fn read_fields<R: BufRead>(reader: &mut R, headers: &mut Headers, budget: &mut usize) -> Result<(), WarcError> {
    loop {
        let mut line = Vec::new();
        let len = read_line(reader, &mut line, *budget)?;
        *budget -= len;

        let eof = !line.ends_with(b"\n");
        if eof && *budget == 0 {
            return Err(WarcError::MaxHeaderSize);
        }

        let text = trim_eol(&line);
        if text.is_empty() {
            return Ok(());
        }

        let text = decode_text(text);
        if text.starts_with(' ') || text.starts_with('\t') {
            if !headers.extend_last(text.trim()) {
                return Err(WarcError::InvalidHeader(text));
            }
        } else {
            match text.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() => headers.push(name.trim(), value.trim()),
                _ => return Err(WarcError::InvalidHeader(text)),
            }
        }

        if eof {
            return Ok(());
        }
    }
}

/// HTTP head stored at the start of a request/response/revisit block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeaders {
    status_line: String,
    headers: Headers,
}

impl HttpHeaders {
    /// Either `HTTP/1.1 200 OK` or `GET /path HTTP/1.1`
    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn is_response(&self) -> bool {
        self.status_line.starts_with("HTTP/")
    }

    pub fn protocol(&self) -> Option<&str> {
        if self.is_response() {
            self.status_line.split_whitespace().next()
        } else {
            self.status_line.split_whitespace().last()
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        if !self.is_response() {
            return None;
        }
        self.status_line.split_whitespace().nth(1)?.parse().ok()
    }

    pub fn is_chunked(&self) -> bool {
        self.get_header("Transfer-Encoding")
            .map(|te| {
                te.split(',')
                    .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
            })
            .unwrap_or(false)
    }

    pub fn content_encoding(&self) -> Encoding {
        self.get_header("Content-Encoding")
            .map(Encoding::from_header)
            .unwrap_or(Encoding::Identity)
    }
}

fn valid_status_line(line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        // Response, reason phrase is optional
        Some(proto) if proto.starts_with("HTTP/") => parts.next().is_some(),
        // Request
        Some(_) => matches!((parts.next(), parts.next()), (Some(_), Some(proto)) if proto.starts_with("HTTP/")),
        None => false,
    }
}

/// Parses an HTTP head off the start of a record block.
///
/// A head cut short by the end of the block is accepted, it just leaves an
/// empty payload behind.
pub fn read_http_head<R: BufRead>(reader: &mut R) -> Result<HttpHeaders, WarcError> {
    let mut budget = MAX_HEADER_SIZE;

    let status_line = {
        let mut line = Vec::new();
        let len = read_line(reader, &mut line, budget)?;
        budget -= len;

        let status_line = decode_text(trim_eol(&line));
        if !valid_status_line(&status_line) {
            return Err(WarcError::MalformedHttp(format!(
                "bad status line {:?}",
                status_line
            )));
        }
        status_line
    };

    let mut headers = Headers::new();
    read_fields(reader, &mut headers, &mut budget)?;

    Ok(HttpHeaders {
        status_line,
        headers,
    })
}
