use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use fsblob_store::{BlobStore, FsBlobStore, ReadSelector};
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::cli::*;

/// How a command ended. Negative lookups are not errors but still exit 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::from(1),
        }
    }
}

pub async fn run_command(cli: Cli) -> anyhow::Result<Outcome> {
    let store = FsBlobStore::new(cli.store_config().await?);
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Put(args) => cmd_put(&store, args, json).await,
        Command::Get(args) => cmd_get(&store, args).await,
        Command::Stat(args) => cmd_stat(&store, args, json).await,
        Command::Rm(args) => cmd_rm(&store, args, json).await,
        Command::Verify(args) => cmd_verify(&store, args, json).await,
    }
}

async fn cmd_put(store: &FsBlobStore, args: PutArgs, json: bool) -> anyhow::Result<Outcome> {
    // open the source first so a bad path never leaves a temp file behind
    let mut input: Box<dyn AsyncRead + Unpin + Send> = match &args.file {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut w = store.create_write().await.context("cannot start write")?;
    w.copy_from(&mut input).await?;
    let meta = w.finish().await?;

    if json {
        println!("{}", serde_json::to_string(&meta)?);
    } else {
        println!("{} {}", meta.key.to_string().yellow(), format!("({} bytes)", meta.size).dimmed());
    }
    Ok(Outcome::Success)
}

async fn cmd_get(store: &FsBlobStore, args: GetArgs) -> anyhow::Result<Outcome> {
    let mut selector = ReadSelector::new(args.key.as_str());
    if let Some(start) = args.start {
        selector = selector.start(start);
    }
    if let Some(end) = args.end {
        selector = selector.end(end);
    }
    let mut stream = store.create_read(selector);

    // pull the first chunk before creating the output so a missing blob
    // leaves no empty file behind
    let first = stream.next().await.transpose()?;
    let mut out: Box<dyn AsyncWrite + Unpin + Send> = match &args.output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };
    if let Some(chunk) = first {
        out.write_all(&chunk).await?;
    }
    while let Some(chunk) = stream.next().await {
        out.write_all(&chunk?).await?;
    }
    out.flush().await?;
    Ok(Outcome::Success)
}

async fn cmd_stat(store: &FsBlobStore, args: KeyArgs, json: bool) -> anyhow::Result<Outcome> {
    let Some(resolved) = store.resolve(args.key.as_str().into()).await? else {
        return Ok(not_found(&args.key, json));
    };

    if json {
        let value = serde_json::json!({
            "key": args.key,
            "path": resolved.path,
            "size": resolved.stat.size,
            "modified": resolved.stat.modified,
        });
        println!("{value}");
    } else {
        println!("{}", args.key.yellow().bold());
        println!("  Path: {}", resolved.path.display());
        println!("  Size: {} bytes", resolved.stat.size);
        if let Some(modified) = resolved.stat.modified {
            println!("  Modified: {}", modified.to_rfc3339().dimmed());
        }
    }
    Ok(Outcome::Success)
}

async fn cmd_rm(store: &FsBlobStore, args: KeyArgs, json: bool) -> anyhow::Result<Outcome> {
    let removed = store.remove(args.key.as_str().into()).await?;
    if json {
        println!("{}", serde_json::json!({ "key": args.key, "removed": removed }));
    } else if removed {
        println!("{} Removed {}", "✓".green().bold(), args.key.yellow());
    } else {
        println!("Nothing stored under {}", args.key.yellow());
    }
    Ok(if removed { Outcome::Success } else { Outcome::Failure })
}

async fn cmd_verify(store: &FsBlobStore, args: KeyArgs, json: bool) -> anyhow::Result<Outcome> {
    let intact = match store.verify(args.key.as_str().into()).await {
        Ok(intact) => intact,
        Err(fsblob_store::StoreError::NotFound(_)) => return Ok(not_found(&args.key, json)),
        Err(e) => return Err(e.into()),
    };
    if json {
        println!("{}", serde_json::json!({ "key": args.key, "intact": intact }));
    } else if intact {
        println!("{} {} matches its content", "✓".green().bold(), args.key.yellow());
    } else {
        println!("{} {} does not match its content", "✗".red().bold(), args.key.yellow());
    }
    Ok(if intact { Outcome::Success } else { Outcome::Failure })
}

fn not_found(key: &str, json: bool) -> Outcome {
    if json {
        println!("{}", serde_json::json!({ "key": key, "found": false }));
    } else {
        eprintln!("{} {}", "not found:".red(), key);
    }
    Outcome::Failure
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use fsblob_store::Algorithm;

    fn cli(root: &std::path::Path, args: &[&str]) -> Cli {
        let mut argv = vec!["fsblob", "--root", root.to_str().unwrap(), "--no-fsync"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn put_get_stat_verify_rm() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let input = dir.path().join("input.txt");
        let output = dir.path().join("output.txt");
        std::fs::write(&input, b"helloworld").unwrap();
        let key = fsblob_crypto::hash(Algorithm::Sha256, b"helloworld").to_key().to_string();

        let put = cli(&root, &["put", input.to_str().unwrap()]);
        assert_eq!(run_command(put).await.unwrap(), Outcome::Success);

        let get = cli(&root, &["get", &key, "--start", "5", "-o", output.to_str().unwrap()]);
        assert_eq!(run_command(get).await.unwrap(), Outcome::Success);
        assert_eq!(std::fs::read(&output).unwrap(), b"world");

        assert_eq!(run_command(cli(&root, &["stat", &key])).await.unwrap(), Outcome::Success);
        assert_eq!(run_command(cli(&root, &["verify", &key])).await.unwrap(), Outcome::Success);
        assert_eq!(run_command(cli(&root, &["rm", &key])).await.unwrap(), Outcome::Success);
        assert_eq!(run_command(cli(&root, &["rm", &key])).await.unwrap(), Outcome::Failure);
        assert_eq!(run_command(cli(&root, &["stat", &key])).await.unwrap(), Outcome::Failure);
    }

    #[tokio::test]
    async fn get_missing_creates_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.bin");
        let get = cli(dir.path(), &["get", "foo", "-o", output.to_str().unwrap()]);
        assert!(run_command(get).await.is_err());
        assert!(!output.exists());
    }

    fn temp_files(root: &std::path::Path) -> usize {
        std::fs::read_dir(root.join(".tmp")).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn put_unreadable_input_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let missing = dir.path().join("no-such-input");

        let put = cli(&root, &["put", missing.to_str().unwrap()]);
        assert!(run_command(put).await.is_err());
        assert_eq!(temp_files(&root), 0);

        // a later successful put still cleans up after itself
        let input = dir.path().join("input.txt");
        std::fs::write(&input, b"ok").unwrap();
        let put = cli(&root, &["put", input.to_str().unwrap()]);
        assert_eq!(run_command(put).await.unwrap(), Outcome::Success);
        assert_eq!(temp_files(&root), 0);
    }

    #[tokio::test]
    async fn verify_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, b"pristine").unwrap();
        assert_eq!(
            run_command(cli(dir.path(), &["--algorithm", "sha512", "put", input.to_str().unwrap()]))
                .await
                .unwrap(),
            Outcome::Success
        );

        let key = fsblob_crypto::hash(Algorithm::Sha512, b"pristine").to_key();
        let store = FsBlobStore::open(dir.path());
        std::fs::write(store.locate(&key), b"tampered").unwrap();

        let verify = cli(dir.path(), &["verify", &key.to_string()]);
        assert_eq!(run_command(verify).await.unwrap(), Outcome::Failure);
    }

    #[test]
    fn outcome_exit_codes() {
        assert_eq!(format!("{:?}", ExitCode::from(Outcome::Success)), format!("{:?}", ExitCode::SUCCESS));
        assert_eq!(format!("{:?}", ExitCode::from(Outcome::Failure)), format!("{:?}", ExitCode::from(1)));
    }
}
