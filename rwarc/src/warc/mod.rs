//! WARC (Web ARChive) reader
//!
//! A WARC file is a sequence of records, optionally compressed as a whole
//! (see [`archive::open`]). Each record is laid out as:
//!
//! | Part        | Description |
//! | ----------- | ----------- |
//! | version     | `WARC/1.0` or `WARC/1.1` followed by CRLF |
//! | headers     | `Name: value` lines, terminated by an empty line |
//! | block       | exactly `Content-Length` bytes |
//! | terminator  | two CRLF |
//!
//! Record framing is done by `rust_warc`, which wants CRLF line endings and
//! exactly two CRLF after each block.
//!
//! # Record Types
//!
//! | WARC-Type  | Block |
//! | :--------: | ----- |
//! | warcinfo   | `application/warc-fields` describing the crawl |
//! | request    | a full HTTP request (`application/http; msgtype=request`) |
//! | response   | a full HTTP response (`application/http; msgtype=response`) |
//! | revisit    | HTTP head of a response whose payload was stored earlier |
//! | resource   | raw content fetched without HTTP |
//! | metadata   | crawler provided metadata |
//!
//! For `request`, `response` and `revisit` records the block starts with an
//! HTTP head which [`reader::WarcReader`] parses up front, leaving the HTTP
//! payload as the record body ([`reader::Record::raw_payload`]). See
//! [`reader::Record::content_stream`] for the decoded variant of that body.
pub mod archive;
pub mod builder;
pub mod content;
pub mod error;
pub mod http;
pub mod reader;

pub use error::WarcError;

// Upper bound on an HTTP head, anything bigger is rejected
const MAX_HEADER_SIZE: usize = 64 * 1024;

// Chunk size lines and trailers
const MAX_LINE_SIZE: usize = 4 * 1024;

const WARC_VERSION: &str = "WARC/1.0";

// Records that carry an HTTP message in their block
const HTTP_RECORDS: [&str; 3] = ["response", "request", "revisit"];
