use std::cmp;
use std::io::{BufRead, ErrorKind};

/// Reads a single line, terminator included, appending it to `line`.
///
/// At most `max` bytes are consumed, so a line that does not end with `\n`
/// was either cut by the limit or by the end of the stream. Returns the
/// number of bytes consumed.
pub fn read_line<R: BufRead>(data: &mut R, line: &mut Vec<u8>, max: usize) -> std::io::Result<usize> {
    let mut line_read = 0;

    while line_read < max {
        let (done, used) = {
            let available = match data.fill_buf() {
                Ok(x) => x,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }

            let available = &available[..cmp::min(available.len(), max - line_read)];
            let (done, used) = match available.iter().position(|&b| b == b'\n') {
                Some(idx) => (true, idx + 1),
                None => (false, available.len()),
            };
            line.extend_from_slice(&available[..used]);
            (done, used)
        };
        data.consume(used);
        line_read += used;

        if done {
            break;
        }
    }
    Ok(line_read)
}

/// Strips a trailing `\n` or `\r\n`
pub fn trim_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

pub fn flush_buf(in_buf: &mut Vec<u8>, buf: &mut [u8]) -> usize {
    // 1. Grab slice [0...min(buf.len(), in_buf.len()))
    let split_at = cmp::min(in_buf.len(), buf.len());
    // 2. Copy into buf
    buf[..split_at].clone_from_slice(&in_buf[..split_at]);
    // 3. Drop range from &mut in_buf
    in_buf.drain(..split_at);

    split_at
}

#[cfg(test)]
mod test_read_line {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn crlf_line() {
        let mut data = Cursor::new(b"WARC/1.0\r\nnext".to_vec());
        let mut line = Vec::new();

        assert_eq!(read_line(&mut data, &mut line, 64).unwrap(), 10);
        assert_eq!(&line[..], b"WARC/1.0\r\n");
        assert_eq!(trim_eol(&line), b"WARC/1.0");
    }

    #[test]
    fn lf_line() {
        let mut data = Cursor::new(b"a: b\nc: d\n".to_vec());
        let mut line = Vec::new();

        assert_eq!(read_line(&mut data, &mut line, 64).unwrap(), 5);
        assert_eq!(trim_eol(&line), b"a: b");
    }

    #[test]
    fn eof_without_terminator() {
        let mut data = Cursor::new(b"tail".to_vec());
        let mut line = Vec::new();

        assert_eq!(read_line(&mut data, &mut line, 64).unwrap(), 4);
        assert_eq!(&line[..], b"tail");

        // Nothing left
        line.clear();
        assert_eq!(read_line(&mut data, &mut line, 64).unwrap(), 0);
        assert!(line.is_empty());
    }

    #[test]
    fn stops_at_max() {
        let mut data = Cursor::new(b"0123456789\n".to_vec());
        let mut line = Vec::new();

        assert_eq!(read_line(&mut data, &mut line, 4).unwrap(), 4);
        assert_eq!(&line[..], b"0123");

        // Remainder is still in the stream
        line.clear();
        assert_eq!(read_line(&mut data, &mut line, 64).unwrap(), 7);
        assert_eq!(&line[..], b"456789\n");
    }

    #[test]
    fn spans_buffer_refills() {
        let data = Cursor::new(b"abcdefgh\nrest".to_vec());
        let mut data = BufReader::with_capacity(3, data);
        let mut line = Vec::new();

        assert_eq!(read_line(&mut data, &mut line, 64).unwrap(), 9);
        assert_eq!(&line[..], b"abcdefgh\n");
    }

    #[test]
    fn trim_eol_bare() {
        assert_eq!(trim_eol(b"abc"), b"abc");
        assert_eq!(trim_eol(b"\r\n"), b"");
        assert_eq!(trim_eol(b""), b"");
    }
}

#[cfg(test)]
mod test_flush_buf {
    use super::*;

    #[test]
    fn zero_buf() {
        let mut in_buf: Vec<u8> = vec![1, 2];
        let mut buf: [u8; 0] = [0; 0];

        assert_eq!(flush_buf(&mut in_buf, &mut buf), 0);
        assert_eq!(&in_buf[..], &[1, 2]);
    }

    #[test]
    fn big_buf_small_vec() {
        let mut in_buf: Vec<u8> = vec![1, 2];
        let mut buf: [u8; 4] = [0; 4];

        assert_eq!(flush_buf(&mut in_buf, &mut buf), 2);
        assert_eq!(&buf, &[1, 2, 0, 0]);
        assert!(in_buf.is_empty());
    }

    #[test]
    fn small_buf_big_vec() {
        let mut in_buf: Vec<u8> = vec![1, 2, 3, 4];
        let mut buf: [u8; 2] = [0; 2];

        assert_eq!(flush_buf(&mut in_buf, &mut buf), 2);
        assert_eq!(&buf, &[1, 2]);
        assert_eq!(&in_buf[..], &[3, 4]);
    }
}
