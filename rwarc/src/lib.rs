pub mod buf;
pub mod warc;
