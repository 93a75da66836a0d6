//! page-loader entry point.
//!
//! Loads the page given on the command line, then reads one command per line
//! from stdin and answers each with one JSON line on stdout.
//! Logging goes to stderr to keep stdout machine-readable.

use anyhow::{Context, Result};
use page_loader_client::fetch::canonicalize;
use page_loader_core::LoaderConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

mod command;
mod session;

use command::Command;
use session::{Reply, Session};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let start = std::env::args()
        .nth(1)
        .context("usage: page-loader <url>")?;
    let location = canonicalize(&start)?;
    let config = LoaderConfig::load()?;

    tracing::info!(%location, "starting page-loader session");
    let mut session = Session::boot(config, location).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => session.run(command).await.unwrap_or_else(|err| Reply::error(format!("{err:#}"))),
            Err(err) => Reply::error(err),
        };

        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    session.shutdown().await;
    Ok(())
}
