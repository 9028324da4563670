use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::str::FromStr;

use flate2::bufread::MultiGzDecoder;
use log::debug;
use serde::Deserialize;

/// How the archive file as a whole is compressed
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Sniff the magic bytes
    #[default]
    Auto,
    #[serde(alias = "none")]
    Plain,
    Gzip,
    Zstd,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Auto => write!(f, "auto"),
            Compression::Plain => write!(f, "plain"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Compression::Auto),
            "plain" | "none" => Ok(Compression::Plain),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            x => Err(format!("unknown compression: {}", x)),
        }
    }
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

fn sniff(head: &[u8]) -> Compression {
    if head.starts_with(&GZIP_MAGIC) {
        Compression::Gzip
    } else if head.starts_with(&ZSTD_MAGIC) {
        Compression::Zstd
    } else if head.len() >= 4 && head[0] & 0xf0 == 0x50 && head[1..4] == [0x2a, 0x4d, 0x18] {
        // Skippable frame, .warc.zst puts its dictionary in one
        Compression::Zstd
    } else {
        Compression::Plain
    }
}

/// Opens an archive stream, undoing whole-file compression.
///
/// Gzip archives are read as a sequence of members, the usual `.warc.gz`
/// layout being one member per record. Zstd archives must not depend on an
/// external dictionary.
pub fn open<R: Read + 'static>(reader: R, compression: Compression) -> std::io::Result<Box<dyn BufRead>> {
    let mut reader = BufReader::new(reader);

    let compression = match compression {
        Compression::Auto => sniff(reader.fill_buf()?),
        x => x,
    };
    debug!("Archive compression: {}", compression);

    Ok(match compression {
        Compression::Auto | Compression::Plain => Box::new(reader),
        Compression::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(reader))),
        Compression::Zstd => Box::new(BufReader::new(zstd::stream::read::Decoder::with_buffer(reader)?)),
    })
}
