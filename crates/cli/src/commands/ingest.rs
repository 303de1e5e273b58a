use std::fs;
use std::path::Path;

use scently_core::config::{AppConfig, LoadOptions};
use scently_core::{CatalogSink, Perfume};
use scently_hub::{build_http_client, HttpCatalogSink};
use serde::Deserialize;

use crate::commands::{runtime, CommandResult};

/// Accepts the hub's own envelope or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum IngestFile {
    Bare(Vec<Perfume>),
    Wrapped { perfumes: Vec<Perfume> },
}

pub fn run(path: &Path, hard: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "ingest",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let perfumes = match read_perfumes(path) {
        Ok(perfumes) => perfumes,
        Err(message) => return CommandResult::failure("ingest", "input", message, 4),
    };

    let runtime = match runtime("ingest") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let client = build_http_client(&config.http)
            .map_err(|error| ("http_client", error.to_string()))?;
        HttpCatalogSink::new(client, &config.catalog)
            .update(&perfumes, hard)
            .await
            .map_err(|error| ("upstream", error.to_string()))
    });

    match result {
        Ok(state) => CommandResult::success(
            "ingest",
            format!(
                "submitted {} perfumes (hard={hard}): {} succeeded, {} failed",
                perfumes.len(),
                state.successful_count,
                state.failed_count
            ),
        ),
        Err((error_class, message)) => CommandResult::failure("ingest", error_class, message, 5),
    }
}

fn read_perfumes(path: &Path) -> Result<Vec<Perfume>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("failed to read `{}`: {error}", path.display()))?;
    let perfumes = match serde_json::from_str::<IngestFile>(&raw)
        .map_err(|error| format!("`{}` is not a perfume list: {error}", path.display()))?
    {
        IngestFile::Bare(perfumes) | IngestFile::Wrapped { perfumes } => perfumes,
    };
    if perfumes.is_empty() {
        return Err(format!("`{}` contains no perfumes", path.display()));
    }
    Ok(perfumes)
}
