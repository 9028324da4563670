use std::path::PathBuf;

use thiserror::Error;

use rwarc::warc::WarcError;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("unable to open {}: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to create {}: {}", .path.display(), .source)]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to read config {}: {}", .path.display(), .source)]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {}", .path.display(), .source)]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("broken archive: {0}")]
    Archive(#[from] WarcError),
    #[error("unable to write output: {0}")]
    Output(#[source] std::io::Error),
}
