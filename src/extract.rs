use std::fs::File;
use std::io::{BufWriter, Read, Write};

use log::{debug, info};
use serde::Deserialize;

use rwarc::warc::archive;
use rwarc::warc::reader::{Record, WarcReader};
use rwarc::warc::WarcError;

use crate::cli::Settings;
use crate::error::DumpError;

// Literal and case sensitive, `Text/HTML` does not match
const RESPONSE: &str = "response";
const HTML_PREFIX: &str = "text/html";

/// Which bytes of a response end up in the dump
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    /// Chunking and content encoding removed
    #[default]
    Decoded,
    /// As stored in the archive
    Raw,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub visited: u64,
    pub extracted: u64,
    pub skipped: u64,
    pub dropped: u64,
    pub bytes: u64,
}

enum Outcome {
    Extracted(Vec<u8>),
    Skipped(&'static str),
}

// Filter then read the whole body
fn select(record: &Record, payload: Payload) -> Result<Outcome, WarcError> {
    if record.rec_type() != Some(RESPONSE) {
        return Ok(Outcome::Skipped("not a response"));
    }

    match record.http_headers()?.get_header("Content-Type") {
        Some(ct) if ct.starts_with(HTML_PREFIX) => (),
        Some(_) => return Ok(Outcome::Skipped("not html")),
        None => return Ok(Outcome::Skipped("no Content-Type")),
    }

    let content = match payload {
        Payload::Decoded => {
            let mut content = Vec::new();
            record.content_stream()?.read_to_end(&mut content)?;
            content
        }
        Payload::Raw => record.raw_payload().to_vec(),
    };
    Ok(Outcome::Extracted(content))
}

/// Appends the body of every HTML response to `out`, in archive order.
///
/// A failure while handling one record (malformed HTTP head, bad chunking,
/// bad content encoding...) drops that record and nothing else, as does an
/// archive cut short inside its last record. Only a broken archive framing or
/// a failing `out` stops the run. With `limit` set the archive is not read
/// past the record that reached it.
pub fn extract<I, W>(
    records: I,
    out: &mut W,
    limit: Option<u64>,
    payload: Payload,
) -> Result<Stats, DumpError>
where
    I: IntoIterator<Item = Result<Record, WarcError>>,
    W: Write,
{
    let mut stats = Stats::default();
    let mut records = records.into_iter();

    loop {
        if limit.is_some_and(|max| stats.extracted >= max) {
            debug!("Record limit reached: {}", stats.extracted);
            break;
        }

        let record = match records.next() {
            None => break,
            Some(record) => record?,
        };
        stats.visited += 1;

        // Every per-record error lands here and is discarded
        match select(&record, payload) {
            Ok(Outcome::Extracted(content)) => {
                debug!(
                    "DUMP @ {}: {:?} - len: {}",
                    record.offset(),
                    record.target_uri(),
                    content.len()
                );
                out.write_all(&content).map_err(DumpError::Output)?;

                stats.extracted += 1;
                stats.bytes += content.len() as u64;
            }
            Ok(Outcome::Skipped(reason)) => {
                debug!("SKIP @ {}: {}", record.offset(), reason);
                stats.skipped += 1;
            }
            Err(e) => {
                debug!("DROP @ {}: {}", record.offset(), e);
                stats.dropped += 1;
            }
        }
    }

    Ok(stats)
}

/// Runs the extraction from `settings.input` into `settings.output`
pub fn dump(settings: &Settings) -> Result<Stats, DumpError> {
    let input = File::open(&settings.input).map_err(|source| DumpError::Open {
        path: settings.input.clone(),
        source,
    })?;
    let archive = archive::open(input, settings.compression).map_err(|source| DumpError::Open {
        path: settings.input.clone(),
        source,
    })?;

    let output = File::create(&settings.output).map_err(|source| DumpError::Create {
        path: settings.output.clone(),
        source,
    })?;
    let mut out = BufWriter::new(output);

    info!(
        "Dumping {} into {}",
        settings.input.display(),
        settings.output.display()
    );
    let stats = extract(
        WarcReader::new(archive),
        &mut out,
        settings.num_records,
        settings.payload,
    )?;
    out.flush().map_err(DumpError::Output)?;

    info!(
        "visited: {} extracted: {} skipped: {} dropped: {} bytes: {}",
        stats.visited, stats.extracted, stats.skipped, stats.dropped, stats.bytes
    );
    Ok(stats)
}
