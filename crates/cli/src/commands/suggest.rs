use scently_core::config::{AppConfig, LoadOptions};
use scently_core::{Ranked, Sex, SuggestRequest, TagRequest};
use scently_server::bootstrap_with_config;
use tokio_util::sync::CancellationToken;

use crate::commands::{runtime, CommandResult};

enum Lookup {
    Reference(SuggestRequest),
    Tags(TagRequest),
}

pub fn run(brand: &str, name: &str, use_ai: bool, json: bool) -> CommandResult {
    let request = SuggestRequest::new(brand, name).with_ai(use_ai);
    execute("suggest", Lookup::Reference(request), json)
}

/// `tags` is comma-separated; a blank `sex` means any.
pub fn run_tags(tags: &str, sex: Option<&str>, json: bool) -> CommandResult {
    let sex = sex.filter(|sex| !sex.trim().is_empty()).map(Sex::from_label);
    execute("suggest-tags", Lookup::Tags(TagRequest::from_csv(tags).with_sex(sex)), json)
}

fn execute(command: &str, lookup: Lookup, json: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match runtime(command) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let app = bootstrap_with_config(config)
            .await
            .map_err(|error| ("bootstrap".to_string(), error.to_string(), 4u8))?;
        let cancel = CancellationToken::new();
        let ranked = match &lookup {
            Lookup::Reference(request) => app.recommender.suggest(request, &cancel).await,
            Lookup::Tags(request) => app.recommender.suggest_by_tags(request, &cancel).await,
        };
        ranked.map_err(|error| (error.kind().as_str().to_string(), error.to_string(), 5u8))
    });

    match result {
        Ok(ranked) if json => match serde_json::to_string_pretty(&ranked) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure(command, "serialization", error.to_string(), 1),
        },
        Ok(ranked) => CommandResult::success(command, render(&ranked)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, &error_class, message, exit_code)
        }
    }
}

fn render(ranked: &[Ranked]) -> String {
    if ranked.is_empty() {
        return "no matching perfumes found".to_string();
    }
    ranked
        .iter()
        .map(|item| {
            format!(
                "{}. {} {} ({}) score={:.3}",
                item.rank,
                item.perfume.brand,
                item.perfume.name,
                item.perfume.sex.as_str(),
                item.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
