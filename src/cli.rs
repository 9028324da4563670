use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use rwarc::warc::archive::Compression;

use crate::error::DumpError;
use crate::extract::Payload;

pub const DEFAULT_OUTPUT: &str = "output.txt";

#[derive(Parser)]
#[command(name = "warcdump")]
#[command(about = "Dump the raw HTML responses of a WARC archive into one file")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Input warc file (plain, gzip or zstd)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output file, overwritten if it exists [default: output.txt]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// How many records to dump, dump all if not set
    #[arg(short, long, value_name = "N")]
    pub num_records: Option<u64>,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Archive compression: auto, plain, gzip or zstd
    #[arg(short = 'z', long, value_name = "TYPE")]
    pub compression: Option<Compression>,

    /// Dump the payload as stored, keeping chunking and content encoding
    #[arg(long)]
    pub raw: bool,

    /// More logging, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

// Configuration
// Every key is optional, the command line wins over the file
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: Option<PathBuf>,
    pub num_records: Option<u64>,
    pub compression: Compression,
    pub payload: Payload,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, DumpError> {
        let text = fs::read_to_string(path).map_err(|source| DumpError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&text).map_err(|source| DumpError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Resolved run settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub num_records: Option<u64>,
    pub compression: Compression,
    pub payload: Payload,
}

impl Cli {
    pub fn settings(&self, config: Config) -> Settings {
        Settings {
            input: self.input.clone(),
            output: self
                .output
                .clone()
                .or(config.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            num_records: self.num_records.or(config.num_records),
            compression: self.compression.unwrap_or(config.compression),
            payload: if self.raw { Payload::Raw } else { config.payload },
        }
    }
}

#[cfg(test)]
mod test_cli {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["warcdump", "-i", "in.warc"]).unwrap();
        let settings = cli.settings(Config::default());

        assert_eq!(
            settings,
            Settings {
                input: PathBuf::from("in.warc"),
                output: PathBuf::from(DEFAULT_OUTPUT),
                num_records: None,
                compression: Compression::Auto,
                payload: Payload::Decoded,
            }
        );
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["warcdump", "-o", "out.html"]).is_err());
    }

    #[test]
    fn all_flags() {
        let cli = Cli::try_parse_from([
            "warcdump",
            "--input",
            "in.warc.gz",
            "--output",
            "out.html",
            "--num-records",
            "5",
            "-z",
            "gzip",
            "--raw",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let settings = cli.settings(Config::default());
        assert_eq!(settings.output, PathBuf::from("out.html"));
        assert_eq!(settings.num_records, Some(5));
        assert_eq!(settings.compression, Compression::Gzip);
        assert_eq!(settings.payload, Payload::Raw);
    }

    #[test]
    fn bad_values() {
        assert!(Cli::try_parse_from(["warcdump", "-i", "a", "-n", "-1"]).is_err());
        assert!(Cli::try_parse_from(["warcdump", "-i", "a", "-n", "many"]).is_err());
        assert!(Cli::try_parse_from(["warcdump", "-i", "a", "-z", "lzma"]).is_err());
    }

    #[test]
    fn config_file() {
        let config: Config = toml::from_str(
            r#"
            output = "dump.html"
            num_records = 10
            compression = "zstd"
            payload = "raw"
        "#,
        )
        .unwrap();

        assert_eq!(config.output, Some(PathBuf::from("dump.html")));
        assert_eq!(config.num_records, Some(10));
        assert_eq!(config.compression, Compression::Zstd);
        assert_eq!(config.payload, Payload::Raw);
    }

    #[test]
    fn empty_config_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_config_key() {
        assert!(toml::from_str::<Config>("limit = 3").is_err());
    }

    #[test]
    fn cli_beats_config() {
        let config: Config = toml::from_str(
            r#"
            output = "dump.html"
            num_records = 10
            compression = "none"
        "#,
        )
        .unwrap();

        let cli = Cli::try_parse_from(["warcdump", "-i", "in.warc", "-n", "2"]).unwrap();
        let settings = cli.settings(config);
        assert_eq!(settings.output, PathBuf::from("dump.html"));
        assert_eq!(settings.num_records, Some(2));
        assert_eq!(settings.compression, Compression::Plain);
    }

    #[test]
    fn load_missing_config() {
        match Config::load(Path::new("/nonexistent/warcdump.toml")) {
            Err(DumpError::ConfigRead { .. }) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }
}
