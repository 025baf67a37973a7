use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bayes_client::auth::Credentials;
use bayes_client::bayes::{AssetKind, BayesClient, GamesFilter, Tag};
use bayes_client::config::ConfigManager;

const USAGE: &str = "\
Usage:
  bayes tags
  bayes games [--tag TAG]... [--from RFC3339] [--to RFC3339]
  bayes game <ID>
  bayes asset <ID> <GAMH_DETAILS|GAMH_SUMMARY|ROFL_REPLAY> <OUTPUT_FILE>

Credentials are read from BAYES_USERNAME and BAYES_PASSWORD.";

#[derive(Debug, PartialEq)]
enum Command {
    Tags,
    Games(GamesFilter),
    Game(String),
    Asset {
        id: String,
        kind: AssetKind,
        output: PathBuf,
    },
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp: {value}"))?
        .with_timezone(&Utc))
}

fn parse_games(args: &[String]) -> Result<GamesFilter> {
    let mut filter = GamesFilter::default();
    let mut tags = Vec::new();

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .with_context(|| format!("Missing value for {flag}"))?;
        match flag.as_str() {
            "--tag" => tags.push(Tag::from(value.as_str())),
            "--from" => filter.from_timestamp = Some(parse_timestamp(value)?),
            "--to" => filter.to_timestamp = Some(parse_timestamp(value)?),
            other => bail!("Unknown option: {other}"),
        }
    }

    if !tags.is_empty() {
        filter.tags = Some(tags);
    }
    Ok(filter)
}

fn parse_args(args: &[String]) -> Result<Command> {
    let Some((command, rest)) = args.split_first() else {
        bail!("No command given");
    };

    match (command.as_str(), rest) {
        ("tags", []) => Ok(Command::Tags),
        ("games", rest) => Ok(Command::Games(parse_games(rest)?)),
        ("game", [id]) => Ok(Command::Game(id.clone())),
        ("asset", [id, kind, output]) => Ok(Command::Asset {
            id: id.clone(),
            kind: kind.parse()?,
            output: PathBuf::from(output),
        }),
        (other, _) => bail!("Unknown command or wrong arguments: {other}"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command) -> Result<()> {
    let config = ConfigManager::new()?.get();
    let credentials = Credentials::from_env()?;
    let client = BayesClient::from_config(credentials, &config)?;

    match command {
        Command::Tags => print_json(&client.list_tags().await?),
        Command::Games(filter) => print_json(&client.list_all_games(&filter).await?),
        Command::Game(id) => print_json(&client.get_game(&id).await?),
        Command::Asset { id, kind, output } => {
            let bytes = client.get_asset(&id, kind).await?;
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!("Wrote {} bytes of {} to {}", bytes.len(), kind, output.display());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
