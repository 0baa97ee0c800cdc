use std::{env, io, path::PathBuf};

use convo_ref::RecordId;
use convo_threads::{EngineConfig, FlatEntry, Phrase, ProfileLinkResolver};
use log::info;
use serde::Serialize;
use thiserror::Error as ThisError;
use tokio::fs::read_to_string;

mod fixture;

use fixture::Fixture;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Usage: convo-dump <fixture.json> [base-url]")]
    Usage,
    #[error("Failed to read file, cause: {0}")]
    ReadFile(#[source] io::Error),
    #[error("Json error, cause: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Engine error, cause: {0}")]
    Engine(#[from] convo_threads::Error),
}

#[derive(Serialize)]
struct Output<'a> {
    entries: Vec<FlatEntry<'a>>,
    phrases: Vec<(RecordId, Vec<Phrase>)>,
}

fn config_path() -> Option<PathBuf> {
    match env::var_os("CONVO_CONFIG") {
        Some(path) => Some(PathBuf::from(path)),
        None => simple_home_dir::home_dir().map(|home| home.join(".convo").join("config.json")),
    }
}

async fn read_config(path: Option<PathBuf>) -> Result<EngineConfig, Error> {
    let path = match path {
        Some(path) => path,
        None => return Ok(EngineConfig::default()),
    };
    match read_to_string(&path).await {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!("No config at {}, using defaults", path.display());
            Ok(EngineConfig::default())
        }
        Err(error) => Err(Error::ReadFile(error)),
    }
}

async fn read_fixture(path: PathBuf) -> Result<Fixture, Error> {
    let text = read_to_string(path).await.map_err(Error::ReadFile)?;
    Ok(serde_json::from_str(&text)?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let fixture_path = args.next().map(PathBuf::from).ok_or(Error::Usage)?;
    let base_url = args.next().unwrap_or_default();

    let (fixture, config) = tokio::join!(read_fixture(fixture_path), read_config(config_path()));
    let (fixture, config) = (fixture?, config?);

    let engine = convo_threads::Engine::with_collaborators(
        config,
        ProfileLinkResolver::new(base_url),
        convo_threads::EnglishPhrasebook,
    )?;

    let conversation = engine.load(
        &fixture,
        fixture.feed_roots(),
        fixture.order,
        fixture.filters.clone(),
        fixture.viewer.clone(),
    )?;

    let entries = conversation.flat();
    let mut phrases = Vec::new();
    for entry in &entries {
        let entry_phrases = engine.phrases(&conversation, entry.record.id)?;
        if !entry_phrases.is_empty() {
            phrases.push((entry.record.id, entry_phrases));
        }
    }

    info!("Dumping {} entries", entries.len());
    let output = Output { entries, phrases };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
