use std::env;
use std::fs;
use std::path::Path;

use scently_core::config::{detect_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

fn field(key: &'static str, value: impl Into<String>, env_keys: &'static [&'static str]) -> Field {
    Field { key, value: value.into(), env_keys }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }
    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let weights = &config.scoring.weights;
    let tag_weights = &config.scoring.tag_weights;
    vec![
        field(
            "catalog.get_perfumes_url",
            &config.catalog.get_perfumes_url,
            &["SCENTLY_CATALOG_GET_PERFUMES_URL", "GET_PERFUMES_URL"],
        ),
        field(
            "catalog.update_perfumes_url",
            &config.catalog.update_perfumes_url,
            &["SCENTLY_CATALOG_UPDATE_PERFUMES_URL", "UPDATE_PERFUMES_URL"],
        ),
        field(
            "catalog.internal_token",
            redact_token(config.catalog.internal_token.expose_secret()),
            &["SCENTLY_CATALOG_INTERNAL_TOKEN", "PERFUME_INTERNAL_TOKEN"],
        ),
        field(
            "catalog.timeout_secs",
            config.catalog.timeout_secs.to_string(),
            &["SCENTLY_CATALOG_TIMEOUT_SECS"],
        ),
        field(
            "catalog.page_concurrency",
            config.catalog.page_concurrency.to_string(),
            &["SCENTLY_CATALOG_PAGE_CONCURRENCY"],
        ),
        field("advisor.enabled", config.advisor.enabled.to_string(), &["SCENTLY_ADVISOR_ENABLED"]),
        field("advisor.url", &config.advisor.url, &["SCENTLY_ADVISOR_URL", "AI_SUGGEST_URL"]),
        field(
            "advisor.timeout_secs",
            config.advisor.timeout_secs.to_string(),
            &["SCENTLY_ADVISOR_TIMEOUT_SECS"],
        ),
        field("cache.backend", config.cache.backend.as_str(), &["SCENTLY_CACHE_BACKEND"]),
        field("cache.url", &config.cache.url, &["SCENTLY_CACHE_URL"]),
        field(
            "cache.password_file",
            if config.cache.password.is_some() { "<redacted>" } else { "<unset>" },
            &["SCENTLY_CACHE_PASSWORD_FILE", "REDIS_PASSWORD"],
        ),
        field("cache.ttl_secs", config.cache.ttl_secs.to_string(), &["SCENTLY_CACHE_TTL_SECS"]),
        field(
            "remote.host",
            config.remote.host.as_deref().unwrap_or("<unset>"),
            &["SCENTLY_REMOTE_HOST", "CONFIG_STORAGE_HOST"],
        ),
        field("remote.namespace", &config.remote.namespace, &["SCENTLY_REMOTE_NAMESPACE"]),
        field("scoring.family_weight", weights.family.to_string(), &[]),
        field("scoring.notes_weight", weights.notes.to_string(), &[]),
        field("scoring.type_weight", weights.perfume_type.to_string(), &[]),
        field("scoring.upper_notes_weight", weights.upper_notes.to_string(), &[]),
        field("scoring.core_notes_weight", weights.core_notes.to_string(), &[]),
        field("scoring.base_notes_weight", weights.base_notes.to_string(), &[]),
        field("scoring.tag_upper_notes_weight", tag_weights.upper_notes.to_string(), &[]),
        field("scoring.tag_core_notes_weight", tag_weights.core_notes.to_string(), &[]),
        field("scoring.tag_base_notes_weight", tag_weights.base_notes.to_string(), &[]),
        field("scoring.workers", config.scoring.workers.to_string(), &["SCENTLY_SCORING_WORKERS"]),
        field(
            "scoring.suggest_count",
            config.scoring.suggest_count.to_string(),
            &["SCENTLY_SCORING_SUGGEST_COUNT"],
        ),
        field(
            "scoring.exclude_opposite_sex",
            config.scoring.exclude_opposite_sex.to_string(),
            &["SCENTLY_SCORING_EXCLUDE_OPPOSITE_SEX"],
        ),
        field("server.bind_address", &config.server.bind_address, &["SCENTLY_SERVER_BIND_ADDRESS"]),
        field("server.port", config.server.port.to_string(), &["SCENTLY_SERVER_PORT"]),
        field(
            "server.cors_allowed_origins",
            config.server.cors_allowed_origins.join(","),
            &["SCENTLY_SERVER_CORS_ALLOWED_ORIGINS"],
        ),
        field("gateway.port", config.gateway.port.to_string(), &["SCENTLY_GATEWAY_PORT"]),
        field(
            "gateway.perfumist_suggest_url",
            &config.gateway.perfumist_suggest_url,
            &["SCENTLY_GATEWAY_PERFUMIST_SUGGEST_URL"],
        ),
        field(
            "gateway.perfumist_tags_url",
            &config.gateway.perfumist_tags_url,
            &["SCENTLY_GATEWAY_PERFUMIST_TAGS_URL"],
        ),
        field(
            "logging.level",
            &config.logging.level,
            &["SCENTLY_LOGGING_LEVEL", "SCENTLY_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["SCENTLY_LOGGING_FORMAT", "SCENTLY_LOG_FORMAT"],
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.len() > 8 {
        let prefix: String = trimmed.chars().take(4).collect();
        return format!("{prefix}***");
    }
    "<redacted>".to_string()
}
