use std::io::{BufRead, BufReader, Cursor, Read};

use log::{debug, warn};
use rust_warc::WarcRecord;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

// Single threaded, the record iterator and the stream it reads share the
// progress counters
use std::cell::RefCell;
use std::rc::Rc;

use crate::warc::content::{decode, ChunkedReader, Encoding};
use crate::warc::error::WarcError;
use crate::warc::http::{read_http_head, HttpHeaders};
use crate::warc::HTTP_RECORDS;

#[derive(Debug, Default)]
struct Progress {
    position: u64,
    eof: bool,
}

// Counts what the record parser consumes and notes when it hit the end
struct Tracked<R: BufRead> {
    inner: R,
    progress: Rc<RefCell<Progress>>,
}

impl<R: BufRead> Read for Tracked<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = self.inner.read(buf)?;
        let mut progress = self.progress.borrow_mut();
        progress.position += len as u64;
        if len == 0 && !buf.is_empty() {
            progress.eof = true;
        }
        Ok(len)
    }
}

impl<R: BufRead> BufRead for Tracked<R> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        let available = self.inner.fill_buf()?;
        if available.is_empty() {
            self.progress.borrow_mut().eof = true;
        }
        Ok(available)
    }

    fn consume(&mut self, amt: usize) {
        self.progress.borrow_mut().position += amt as u64;
        self.inner.consume(amt);
    }
}

// Header names are case insensitive
fn header<'a>(record: &'a WarcRecord, name: &str) -> Option<&'a str> {
    record.header.get(&name.into()).map(|value| value.as_str())
}

#[derive(Debug)]
enum HttpBlock {
    Absent,
    Parsed(HttpHeaders),
    Malformed(String),
}

/// One archive record with its HTTP head split off the block
#[derive(Debug)]
pub struct Record {
    inner: WarcRecord,
    offset: u64,
    http: HttpBlock,
    // Start of the HTTP payload in the block
    payload: usize,
}

impl Record {
    fn new(inner: WarcRecord, offset: u64) -> Self {
        let mut payload = 0;
        let http = if has_http_head(&inner) {
            let mut block = Cursor::new(&inner.content[..]);
            match read_http_head(&mut block) {
                Ok(headers) => {
                    payload = block.position() as usize;
                    HttpBlock::Parsed(headers)
                }
                Err(e) => {
                    debug!("HTTP head @ {}: {}", offset, e);
                    match e {
                        WarcError::MalformedHttp(reason) => HttpBlock::Malformed(reason),
                        e => HttpBlock::Malformed(e.to_string()),
                    }
                }
            }
        } else {
            HttpBlock::Absent
        };

        debug!(
            "{} {:?} @ {} - length: {}",
            inner.version,
            header(&inner, "WARC-Type"),
            offset,
            inner.content.len()
        );

        Record {
            inner,
            offset,
            http,
            payload,
        }
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// The `WARC-Type` of the record, `response`, `request`, `warcinfo`...
    pub fn rec_type(&self) -> Option<&str> {
        header(&self.inner, "WARC-Type")
    }

    pub fn record_id(&self) -> Option<&str> {
        header(&self.inner, "WARC-Record-ID")
    }

    pub fn target_uri(&self) -> Option<&str> {
        header(&self.inner, "WARC-Target-URI")
    }

    pub fn date(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(header(&self.inner, "WARC-Date")?, &Rfc3339).ok()
    }

    /// Offset of the version line in the uncompressed archive
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn http_headers(&self) -> Result<&HttpHeaders, WarcError> {
        match &self.http {
            HttpBlock::Parsed(headers) => Ok(headers),
            HttpBlock::Absent => Err(WarcError::NoHttpHeaders),
            HttpBlock::Malformed(e) => Err(WarcError::MalformedHttp(e.clone())),
        }
    }

    /// The body as stored: the block, minus the HTTP head if there was one
    pub fn raw_payload(&self) -> &[u8] {
        &self.inner.content[self.payload..]
    }

    /// The body with HTTP transfer and content coding removed
    pub fn content_stream(&self) -> std::io::Result<Box<dyn Read + '_>> {
        let (chunked, encoding) = match &self.http {
            HttpBlock::Parsed(headers) => (headers.is_chunked(), headers.content_encoding()),
            _ => (false, Encoding::Identity),
        };

        if chunked {
            decode(BufReader::new(ChunkedReader::new(self.raw_payload())), encoding)
        } else {
            decode(self.raw_payload(), encoding)
        }
    }
}

// Only bother with an HTTP head where one is expected
fn has_http_head(record: &WarcRecord) -> bool {
    let rec_type = header(record, "WARC-Type").unwrap_or("");

    HTTP_RECORDS.iter().any(|t| *t == rec_type)
        && !record.content.is_empty()
        && header(record, "Content-Type")
            .map(|ct| ct.contains("application/http"))
            .unwrap_or(true)
}

/// Iterates over the records of an uncompressed archive.
///
/// Framing is left to `rust_warc`, records are then split into their HTTP
/// head and payload. An archive that ends in the middle of a record ends the
/// iteration, the partial record is lost.
pub struct WarcReader<R: BufRead> {
    inner: rust_warc::WarcReader<Tracked<R>>,
    progress: Rc<RefCell<Progress>>,
    done: bool,
}

impl<R: BufRead> WarcReader<R> {
    pub fn new(reader: R) -> Self {
        let progress = Rc::new(RefCell::new(Progress::default()));
        WarcReader {
            inner: rust_warc::WarcReader::new(Tracked {
                inner: reader,
                progress: progress.clone(),
            }),
            progress,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for WarcReader<R> {
    type Item = Result<Record, WarcError>;

    // After an error the stream position is unknown, so the reader is fused
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let offset = self.progress.borrow().position;
        match self.inner.next() {
            Some(Ok(record)) => Some(Ok(Record::new(record, offset))),
            None => {
                self.done = true;
                None
            }
            Some(Err(e)) => {
                self.done = true;
                let e = WarcError::from(e);
                if self.progress.borrow().eof {
                    warn!("Archive ends inside the record @ {}: {}", offset, e);
                    None
                } else {
                    Some(Err(e))
                }
            }
        }
    }
}
