use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fsblob_store::{Algorithm, StoreConfig};

/// Root used when neither `--root` nor `--config` is given.
pub const DEFAULT_ROOT: &str = ".fsblob";

#[derive(Parser)]
#[command(
    name = "fsblob",
    about = "fsblob: content-addressable blob store on the local filesystem",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store root directory (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Digest algorithm for new blobs (sha224, sha256, sha384, sha512, blake3)
    #[arg(long, global = true)]
    pub algorithm: Option<Algorithm>,

    /// TOML config file with `root`, `algorithm`, and `fsync`
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Skip fsync before publishing
    #[arg(long, global = true)]
    pub no_fsync: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    /// Store configuration from the config file and command-line overrides.
    pub async fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::load(path).await?,
            None => StoreConfig::new(DEFAULT_ROOT),
        };
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if self.no_fsync {
            config.fsync = false;
        }
        Ok(config)
    }
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file (or stdin) and print its key
    Put(PutArgs),
    /// Write a blob, or a byte range of it, to stdout or a file
    Get(GetArgs),
    /// Show where a blob lives and its size
    Stat(KeyArgs),
    /// Delete a blob
    Rm(KeyArgs),
    /// Re-hash a blob and check it against its key
    Verify(KeyArgs),
}

#[derive(Args)]
pub struct PutArgs {
    /// File to store; reads stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// First byte to read
    #[arg(long)]
    pub start: Option<u64>,
    /// Exclusive end offset
    #[arg(long)]
    pub end: Option<u64>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_put_file() {
        let cli = Cli::try_parse_from(["fsblob", "put", "data.bin"]).unwrap();
        if let Command::Put(args) = cli.command {
            assert_eq!(args.file, Some(PathBuf::from("data.bin")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_put_stdin() {
        let cli = Cli::try_parse_from(["fsblob", "put"]).unwrap();
        if let Command::Put(args) = cli.command {
            assert!(args.file.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_get_range() {
        let cli = Cli::try_parse_from(["fsblob", "get", "abc.sha256", "--start", "5", "--end", "9", "-o", "out"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.key, "abc.sha256");
            assert_eq!(args.start, Some(5));
            assert_eq!(args.end, Some(9));
            assert_eq!(args.output, Some(PathBuf::from("out")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_stat_rm_verify() {
        let cli = Cli::try_parse_from(["fsblob", "stat", "k"]).unwrap();
        assert!(matches!(cli.command, Command::Stat(_)));
        let cli = Cli::try_parse_from(["fsblob", "rm", "k"]).unwrap();
        assert!(matches!(cli.command, Command::Rm(_)));
        let cli = Cli::try_parse_from(["fsblob", "verify", "k"]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn parse_algorithm() {
        let cli = Cli::try_parse_from(["fsblob", "--algorithm", "sha512", "put"]).unwrap();
        assert_eq!(cli.algorithm, Some(Algorithm::Sha512));
        assert!(Cli::try_parse_from(["fsblob", "--algorithm", "md5", "put"]).is_err());
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["fsblob", "--format", "json", "stat", "k"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[tokio::test]
    async fn store_config_defaults() {
        let cli = Cli::try_parse_from(["fsblob", "put"]).unwrap();
        let config = cli.store_config().await.unwrap();
        assert_eq!(config, StoreConfig::new(DEFAULT_ROOT));
    }

    #[tokio::test]
    async fn store_config_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fsblob.toml");
        std::fs::write(&path, "root = \"/from/file\"\nalgorithm = \"blake3\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "fsblob", "--config", path.to_str().unwrap(), "--root", "/from/flag", "--no-fsync", "put",
        ])
        .unwrap();
        let config = cli.store_config().await.unwrap();
        assert_eq!(config.root, PathBuf::from("/from/flag"));
        assert_eq!(config.algorithm, Algorithm::Blake3);
        assert!(!config.fsync);
    }
}
