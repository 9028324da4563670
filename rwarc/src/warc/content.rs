use std::cmp;
use std::io::{BufRead, Error, ErrorKind, Read};

use flate2::bufread::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use log::debug;

use crate::buf::{flush_buf, read_line, trim_eol};
use crate::warc::MAX_LINE_SIZE;

/// HTTP `Content-Encoding` that can be undone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Identity,
    Gzip,
    Deflate,
}

impl Encoding {
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Encoding::Gzip,
            "deflate" => Encoding::Deflate,
            // br, compress, stacked codings... are passed through as is
            _ => Encoding::Identity,
        }
    }
}

// CMF/FLG pair of a zlib stream: deflate method and a valid check value
fn is_zlib(head: &[u8]) -> bool {
    match head {
        [cmf, flg, ..] => cmf & 0x0f == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

/// Wraps `reader` with the decoder for `encoding`.
///
/// `deflate` is supposed to be zlib wrapped, servers sending a bare deflate
/// stream instead are common enough that both are accepted.
pub fn decode<'a, R: BufRead + 'a>(mut reader: R, encoding: Encoding) -> std::io::Result<Box<dyn Read + 'a>> {
    Ok(match encoding {
        Encoding::Identity => Box::new(reader),
        Encoding::Gzip => Box::new(MultiGzDecoder::new(reader)),
        Encoding::Deflate => {
            if is_zlib(reader.fill_buf()?) {
                Box::new(ZlibDecoder::new(reader))
            } else {
                debug!("No zlib header, inflating raw deflate");
                Box::new(DeflateDecoder::new(reader))
            }
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    // Nothing read yet, body may turn out not to be chunked at all
    Start,
    Size,
    Data(u64),
    Passthrough,
    Done,
}

/// Removes HTTP/1.1 chunked transfer coding.
///
/// Some crawlers store the de-chunked body but keep the original
/// `Transfer-Encoding` header, so when the first size line is not hex the
/// body is handed back unchanged.
pub struct ChunkedReader<R: BufRead> {
    inner: R,
    state: State,
    pending: Vec<u8>,
}

impl<R: BufRead> ChunkedReader<R> {
    pub fn new(reader: R) -> Self {
        ChunkedReader {
            inner: reader,
            state: State::Start,
            pending: Vec::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_size_line(&mut self) -> std::io::Result<Vec<u8>> {
        let mut line = Vec::new();
        read_line(&mut self.inner, &mut line, MAX_LINE_SIZE)?;
        Ok(line)
    }

    fn consume_trailers(&mut self) -> std::io::Result<()> {
        loop {
            let line = self.read_size_line()?;
            if trim_eol(&line).is_empty() {
                return Ok(());
            }
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> Option<u64> {
    let line = std::str::from_utf8(line).ok()?;
    // Chunk extensions are ignored
    let size = line.split(';').next()?.trim();
    if size.is_empty() || !size.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(size, 16).ok()
}

impl<R: BufRead> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            match self.state {
                State::Done => return Ok(0),
                State::Passthrough => {
                    if !self.pending.is_empty() {
                        return Ok(flush_buf(&mut self.pending, buf));
                    }
                    return self.inner.read(buf);
                }
                State::Data(0) => {
                    // Every chunk is followed by a CRLF
                    let line = self.read_size_line()?;
                    if line.is_empty() {
                        return Err(Error::new(ErrorKind::UnexpectedEof, "chunk terminator missing"));
                    }
                    if !trim_eol(&line).is_empty() {
                        return Err(Error::new(ErrorKind::InvalidData, "chunk longer than its size"));
                    }
                    self.state = State::Size;
                }
                State::Data(left) => {
                    if buf.is_empty() {
                        return Ok(0);
                    }
                    let max = cmp::min(buf.len() as u64, left) as usize;
                    let len = self.inner.read(&mut buf[..max])?;
                    if len == 0 {
                        return Err(Error::new(ErrorKind::UnexpectedEof, "chunk truncated"));
                    }
                    self.state = State::Data(left - len as u64);
                    return Ok(len);
                }
                State::Start | State::Size => {
                    let line = self.read_size_line()?;
                    match parse_chunk_size(trim_eol(&line)) {
                        Some(0) => {
                            self.consume_trailers()?;
                            self.state = State::Done;
                        }
                        Some(size) => self.state = State::Data(size),
                        None if self.state == State::Start => {
                            debug!("Body is not chunked, passing it through");
                            self.pending = line;
                            self.state = State::Passthrough;
                        }
                        None if line.is_empty() => {
                            return Err(Error::new(ErrorKind::UnexpectedEof, "chunked body truncated"));
                        }
                        None => {
                            return Err(Error::new(ErrorKind::InvalidData, "invalid chunk size"));
                        }
                    }
                }
            }
        }
    }
}
