use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recommend::RecommenderSettings;
use crate::similarity::{
    ScoreCalculator, ScoringWeights, TagWeights, DEFAULT_TAG_WEIGHTS, DEFAULT_WEIGHTS,
};

pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["scently.toml", "config/scently.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub advisor: AdvisorConfig,
    pub cache: CacheConfig,
    pub remote: RemoteConfig,
    pub scoring: ScoringConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub get_perfumes_url: String,
    pub update_perfumes_url: String,
    pub internal_token: SecretString,
    pub timeout_secs: u64,
    pub page_concurrency: usize,
    pub max_pages: u32,
}

#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub url: String,
    /// File whose trimmed content is the Redis password.
    pub password_file: Option<PathBuf>,
    pub password: Option<SecretString>,
    pub ttl_secs: u64,
    pub op_timeout_ms: u64,
}

/// Redis hash holding operator-tunable settings, read once at startup.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub host: Option<String>,
    pub port: u16,
    pub password: Option<SecretString>,
    pub namespace: String,
}

#[derive(Clone, Debug)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub tag_weights: TagWeights,
    pub workers: usize,
    pub suggest_count: usize,
    pub exclude_opposite_sex: bool,
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub pool_idle_timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub port: u16,
    pub perfumist_suggest_url: String,
    pub perfumist_tags_url: String,
    pub timeout_secs: u64,
    pub ai_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    Redis,
    Memory,
    Disabled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub cache_backend: Option<CacheBackend>,
    pub get_perfumes_url: Option<String>,
    pub advisor_enabled: Option<bool>,
    pub server_port: Option<u16>,
    pub gateway_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("could not read secret file `{path}`: {source}")]
    ReadSecretFile { path: PathBuf, source: std::io::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid remote setting `{key}`: `{value}`")]
    InvalidRemoteValue { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                get_perfumes_url: "http://perfume:8000/v1/perfumes/get".to_string(),
                update_perfumes_url: "http://perfume:8000/v1/perfumes/update".to_string(),
                internal_token: String::new().into(),
                timeout_secs: 2,
                page_concurrency: 4,
                max_pages: 1000,
            },
            advisor: AdvisorConfig {
                enabled: true,
                url: "http://ai_advisor:8000/v1/advise".to_string(),
                timeout_secs: 20,
            },
            cache: CacheConfig {
                backend: CacheBackend::Redis,
                url: "redis://redis_cache:6379".to_string(),
                password_file: None,
                password: None,
                ttl_secs: 3600,
                op_timeout_ms: 1000,
            },
            remote: RemoteConfig {
                host: None,
                port: 6379,
                password: None,
                namespace: "perfumist".to_string(),
            },
            scoring: ScoringConfig {
                weights: DEFAULT_WEIGHTS,
                tag_weights: DEFAULT_TAG_WEIGHTS,
                workers: 5,
                suggest_count: 4,
                exclude_opposite_sex: false,
            },
            http: HttpConfig {
                request_timeout_secs: 30,
                pool_idle_timeout_secs: 90,
                pool_max_idle_per_host: 10,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
                cors_allowed_origins: vec!["http://frontend:3000".to_string()],
            },
            gateway: GatewayConfig {
                port: 8080,
                perfumist_suggest_url: "http://perfumist:8000/v1/suggest/perfume".to_string(),
                perfumist_tags_url: "http://perfumist:8000/v1/suggest/tags".to_string(),
                timeout_secs: 8,
                ai_timeout_secs: 25,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(ConfigError::Validation(format!(
                "unsupported cache backend `{other}` (expected redis|memory|disabled)"
            ))),
        }
    }
}

impl CacheBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
            Self::Disabled => "disabled",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AdvisorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl ScoringConfig {
    pub fn calculator(&self) -> ScoreCalculator {
        ScoreCalculator::with_weights(self.weights)
            .excluding_opposite_sex(self.exclude_opposite_sex)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.resolve_secret_files()?;
        config.validate()?;

        Ok(config)
    }

    pub fn recommender_settings(&self) -> RecommenderSettings {
        RecommenderSettings {
            workers: self.scoring.workers,
            suggest_count: self.scoring.suggest_count,
            cache_ttl: self.cache.ttl(),
            tag_weights: self.scoring.tag_weights,
        }
    }

    /// Applies settings read from the remote store, then re-validates.
    /// Unknown keys are ignored so the store may be shared with other
    /// services; on any error `self` is left untouched.
    pub fn apply_remote_values(
        &mut self,
        values: &HashMap<String, String>,
    ) -> Result<Vec<String>, ConfigError> {
        let mut next = self.clone();
        let mut applied = Vec::new();

        for (key, value) in values {
            let raw = value.trim();
            let known = match key.as_str() {
                "family_weight" => remote_f64(key, raw).map(|v| next.scoring.weights.family = v),
                "notes_weight" => remote_f64(key, raw).map(|v| next.scoring.weights.notes = v),
                "type_weight" => {
                    remote_f64(key, raw).map(|v| next.scoring.weights.perfume_type = v)
                }
                "upper_notes_weight" => {
                    remote_f64(key, raw).map(|v| next.scoring.weights.upper_notes = v)
                }
                "core_notes_weight" => {
                    remote_f64(key, raw).map(|v| next.scoring.weights.core_notes = v)
                }
                "base_notes_weight" => {
                    remote_f64(key, raw).map(|v| next.scoring.weights.base_notes = v)
                }
                "tags_upper_notes_weight" => {
                    remote_f64(key, raw).map(|v| next.scoring.tag_weights.upper_notes = v)
                }
                "tags_core_notes_weight" => {
                    remote_f64(key, raw).map(|v| next.scoring.tag_weights.core_notes = v)
                }
                "tags_base_notes_weight" => {
                    remote_f64(key, raw).map(|v| next.scoring.tag_weights.base_notes = v)
                }
                "threads_count" => remote_parse(key, raw).map(|v| next.scoring.workers = v),
                "suggest_count" => remote_parse(key, raw).map(|v| next.scoring.suggest_count = v),
                "cache_ttl_secs" => remote_parse(key, raw).map(|v| next.cache.ttl_secs = v),
                "perfume_hub_fetcher_timeout_secs" => {
                    remote_parse(key, raw).map(|v| next.catalog.timeout_secs = v)
                }
                "ai_fetcher_timeout_secs" => {
                    remote_parse(key, raw).map(|v| next.advisor.timeout_secs = v)
                }
                _ => continue,
            };
            known?;
            applied.push(key.clone());
        }

        next.validate()?;
        *self = next;
        applied.sort();
        Ok(applied)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(catalog) = patch.catalog {
            if let Some(get_perfumes_url) = catalog.get_perfumes_url {
                self.catalog.get_perfumes_url = get_perfumes_url;
            }
            if let Some(update_perfumes_url) = catalog.update_perfumes_url {
                self.catalog.update_perfumes_url = update_perfumes_url;
            }
            if let Some(token) = catalog.internal_token {
                self.catalog.internal_token = secret_value(token);
            }
            if let Some(timeout_secs) = catalog.timeout_secs {
                self.catalog.timeout_secs = timeout_secs;
            }
            if let Some(page_concurrency) = catalog.page_concurrency {
                self.catalog.page_concurrency = page_concurrency;
            }
            if let Some(max_pages) = catalog.max_pages {
                self.catalog.max_pages = max_pages;
            }
        }

        if let Some(advisor) = patch.advisor {
            if let Some(enabled) = advisor.enabled {
                self.advisor.enabled = enabled;
            }
            if let Some(url) = advisor.url {
                self.advisor.url = url;
            }
            if let Some(timeout_secs) = advisor.timeout_secs {
                self.advisor.timeout_secs = timeout_secs;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(backend) = cache.backend {
                self.cache.backend = backend;
            }
            if let Some(url) = cache.url {
                self.cache.url = url;
            }
            if let Some(password_file) = cache.password_file {
                self.cache.password_file = Some(password_file);
            }
            if let Some(password) = cache.password {
                self.cache.password = Some(secret_value(password));
            }
            if let Some(ttl_secs) = cache.ttl_secs {
                self.cache.ttl_secs = ttl_secs;
            }
            if let Some(op_timeout_ms) = cache.op_timeout_ms {
                self.cache.op_timeout_ms = op_timeout_ms;
            }
        }

        if let Some(remote) = patch.remote {
            if let Some(host) = remote.host {
                self.remote.host = Some(host);
            }
            if let Some(port) = remote.port {
                self.remote.port = port;
            }
            if let Some(password) = remote.password {
                self.remote.password = Some(secret_value(password));
            }
            if let Some(namespace) = remote.namespace {
                self.remote.namespace = namespace;
            }
        }

        if let Some(scoring) = patch.scoring {
            let weights = &mut self.scoring.weights;
            for (slot, value) in [
                (&mut weights.family, scoring.family_weight),
                (&mut weights.notes, scoring.notes_weight),
                (&mut weights.perfume_type, scoring.type_weight),
                (&mut weights.upper_notes, scoring.upper_notes_weight),
                (&mut weights.core_notes, scoring.core_notes_weight),
                (&mut weights.base_notes, scoring.base_notes_weight),
            ] {
                if let Some(value) = value {
                    *slot = value;
                }
            }
            let tag_weights = &mut self.scoring.tag_weights;
            for (slot, value) in [
                (&mut tag_weights.upper_notes, scoring.tag_upper_notes_weight),
                (&mut tag_weights.core_notes, scoring.tag_core_notes_weight),
                (&mut tag_weights.base_notes, scoring.tag_base_notes_weight),
            ] {
                if let Some(value) = value {
                    *slot = value;
                }
            }
            if let Some(workers) = scoring.workers {
                self.scoring.workers = workers;
            }
            if let Some(suggest_count) = scoring.suggest_count {
                self.scoring.suggest_count = suggest_count;
            }
            if let Some(exclude_opposite_sex) = scoring.exclude_opposite_sex {
                self.scoring.exclude_opposite_sex = exclude_opposite_sex;
            }
        }

        if let Some(http) = patch.http {
            if let Some(request_timeout_secs) = http.request_timeout_secs {
                self.http.request_timeout_secs = request_timeout_secs;
            }
            if let Some(pool_idle_timeout_secs) = http.pool_idle_timeout_secs {
                self.http.pool_idle_timeout_secs = pool_idle_timeout_secs;
            }
            if let Some(pool_max_idle_per_host) = http.pool_max_idle_per_host {
                self.http.pool_max_idle_per_host = pool_max_idle_per_host;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(origins) = server.cors_allowed_origins {
                self.server.cors_allowed_origins = origins;
            }
        }

        if let Some(gateway) = patch.gateway {
            if let Some(port) = gateway.port {
                self.gateway.port = port;
            }
            if let Some(url) = gateway.perfumist_suggest_url {
                self.gateway.perfumist_suggest_url = url;
            }
            if let Some(url) = gateway.perfumist_tags_url {
                self.gateway.perfumist_tags_url = url;
            }
            if let Some(timeout_secs) = gateway.timeout_secs {
                self.gateway.timeout_secs = timeout_secs;
            }
            if let Some(ai_timeout_secs) = gateway.ai_timeout_secs {
                self.gateway.ai_timeout_secs = ai_timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) =
            read_env("SCENTLY_CATALOG_GET_PERFUMES_URL").or_else(|| read_env("GET_PERFUMES_URL"))
        {
            self.catalog.get_perfumes_url = value;
        }
        if let Some(value) = read_env("SCENTLY_CATALOG_UPDATE_PERFUMES_URL")
            .or_else(|| read_env("UPDATE_PERFUMES_URL"))
        {
            self.catalog.update_perfumes_url = value;
        }
        if let Some(value) = read_env("SCENTLY_CATALOG_INTERNAL_TOKEN")
            .or_else(|| read_env("PERFUME_INTERNAL_TOKEN"))
        {
            self.catalog.internal_token = secret_value(value);
        }
        if let Some(value) = read_env("SCENTLY_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_secs = parse_u64("SCENTLY_CATALOG_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_CATALOG_PAGE_CONCURRENCY") {
            self.catalog.page_concurrency =
                parse_usize("SCENTLY_CATALOG_PAGE_CONCURRENCY", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_CATALOG_MAX_PAGES") {
            self.catalog.max_pages = parse_u32("SCENTLY_CATALOG_MAX_PAGES", &value)?;
        }

        if let Some(value) = read_env("SCENTLY_ADVISOR_ENABLED") {
            self.advisor.enabled = parse_bool("SCENTLY_ADVISOR_ENABLED", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_ADVISOR_URL").or_else(|| read_env("AI_SUGGEST_URL"))
        {
            self.advisor.url = value;
        }
        if let Some(value) = read_env("SCENTLY_ADVISOR_TIMEOUT_SECS") {
            self.advisor.timeout_secs = parse_u64("SCENTLY_ADVISOR_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SCENTLY_CACHE_BACKEND") {
            self.cache.backend = value.parse()?;
        }
        if let Some(value) = read_env("SCENTLY_CACHE_URL") {
            self.cache.url = value;
        }
        if let Some(value) =
            read_env("SCENTLY_CACHE_PASSWORD_FILE").or_else(|| read_env("REDIS_PASSWORD"))
        {
            self.cache.password_file = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("SCENTLY_CACHE_TTL_SECS") {
            self.cache.ttl_secs = parse_u64("SCENTLY_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_CACHE_OP_TIMEOUT_MS") {
            self.cache.op_timeout_ms = parse_u64("SCENTLY_CACHE_OP_TIMEOUT_MS", &value)?;
        }

        if let Some(value) =
            read_env("SCENTLY_REMOTE_HOST").or_else(|| read_env("CONFIG_STORAGE_HOST"))
        {
            self.remote.host = Some(value);
        }
        if let Some((key, value)) = read_env_pair("SCENTLY_REMOTE_PORT", "CONFIG_STORAGE_PORT") {
            self.remote.port = parse_u16(key, &value)?;
        }
        if let Some(value) =
            read_env("SCENTLY_REMOTE_PASSWORD").or_else(|| read_env("CONFIG_STORAGE_PASSWORD"))
        {
            self.remote.password = Some(secret_value(value));
        }
        if let Some(value) = read_env("SCENTLY_REMOTE_NAMESPACE") {
            self.remote.namespace = value;
        }

        if let Some(value) = read_env("SCENTLY_SCORING_WORKERS") {
            self.scoring.workers = parse_usize("SCENTLY_SCORING_WORKERS", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_SCORING_SUGGEST_COUNT") {
            self.scoring.suggest_count = parse_usize("SCENTLY_SCORING_SUGGEST_COUNT", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_SCORING_EXCLUDE_OPPOSITE_SEX") {
            self.scoring.exclude_opposite_sex =
                parse_bool("SCENTLY_SCORING_EXCLUDE_OPPOSITE_SEX", &value)?;
        }

        if let Some(value) = read_env("SCENTLY_HTTP_REQUEST_TIMEOUT_SECS") {
            self.http.request_timeout_secs =
                parse_u64("SCENTLY_HTTP_REQUEST_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SCENTLY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SCENTLY_SERVER_PORT") {
            self.server.port = parse_u16("SCENTLY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SCENTLY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_SERVER_CORS_ALLOWED_ORIGINS") {
            self.server.cors_allowed_origins = value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(value) = read_env("SCENTLY_GATEWAY_PORT") {
            self.gateway.port = parse_u16("SCENTLY_GATEWAY_PORT", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_GATEWAY_PERFUMIST_SUGGEST_URL") {
            self.gateway.perfumist_suggest_url = value;
        }
        if let Some(value) = read_env("SCENTLY_GATEWAY_PERFUMIST_TAGS_URL") {
            self.gateway.perfumist_tags_url = value;
        }
        if let Some(value) = read_env("SCENTLY_GATEWAY_TIMEOUT_SECS") {
            self.gateway.timeout_secs = parse_u64("SCENTLY_GATEWAY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SCENTLY_GATEWAY_AI_TIMEOUT_SECS") {
            self.gateway.ai_timeout_secs = parse_u64("SCENTLY_GATEWAY_AI_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("SCENTLY_LOGGING_LEVEL").or_else(|| read_env("SCENTLY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SCENTLY_LOGGING_FORMAT").or_else(|| read_env("SCENTLY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(cache_backend) = overrides.cache_backend {
            self.cache.backend = cache_backend;
        }
        if let Some(get_perfumes_url) = overrides.get_perfumes_url {
            self.catalog.get_perfumes_url = get_perfumes_url;
        }
        if let Some(advisor_enabled) = overrides.advisor_enabled {
            self.advisor.enabled = advisor_enabled;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
        if let Some(gateway_port) = overrides.gateway_port {
            self.gateway.port = gateway_port;
        }
    }

    fn resolve_secret_files(&mut self) -> Result<(), ConfigError> {
        let Some(path) = &self.cache.password_file else {
            return Ok(());
        };
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadSecretFile { path: path.clone(), source })?;
        let password = raw.trim();
        self.cache.password =
            if password.is_empty() { None } else { Some(secret_value(password.to_string())) };
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_advisor(&self.advisor)?;
        validate_cache(&self.cache)?;
        validate_scoring(&self.scoring)?;
        validate_http(&self.http)?;
        validate_server(&self.server)?;
        validate_gateway(&self.gateway)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_FILES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

/// The config file `load` would pick up, if any.
pub fn detect_config_path() -> Option<PathBuf> {
    resolve_config_path(None)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{field} must start with http:// or https://")))
    }
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    validate_http_url("catalog.get_perfumes_url", &catalog.get_perfumes_url)?;
    validate_http_url("catalog.update_perfumes_url", &catalog.update_perfumes_url)?;

    if catalog.timeout_secs == 0 || catalog.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "catalog.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    if catalog.page_concurrency == 0 {
        return Err(ConfigError::Validation(
            "catalog.page_concurrency must be greater than zero".to_string(),
        ));
    }
    if catalog.max_pages == 0 {
        return Err(ConfigError::Validation(
            "catalog.max_pages must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_advisor(advisor: &AdvisorConfig) -> Result<(), ConfigError> {
    if !advisor.enabled {
        return Ok(());
    }
    validate_http_url("advisor.url", &advisor.url)?;
    if advisor.timeout_secs == 0 || advisor.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "advisor.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.backend == CacheBackend::Redis {
        let url = cache.url.trim();
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ConfigError::Validation(
                "cache.url must be a redis URL (`redis://...` or `rediss://...`)".to_string(),
            ));
        }
    }
    if cache.ttl_secs == 0 {
        return Err(ConfigError::Validation("cache.ttl_secs must be greater than zero".to_string()));
    }
    if cache.op_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "cache.op_timeout_ms must be greater than zero".to_string(),
        ));
    }
    if let Some(password) = &cache.password {
        if password.expose_secret().contains(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "cache password must not contain whitespace".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigError> {
    scoring
        .weights
        .validate()
        .map_err(|error| ConfigError::Validation(format!("scoring: {error}")))?;
    scoring
        .tag_weights
        .validate()
        .map_err(|error| ConfigError::Validation(format!("scoring tags: {error}")))?;
    if scoring.workers == 0 {
        return Err(ConfigError::Validation(
            "scoring.workers must be greater than zero".to_string(),
        ));
    }
    if scoring.suggest_count == 0 {
        return Err(ConfigError::Validation(
            "scoring.suggest_count must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_http(http: &HttpConfig) -> Result<(), ConfigError> {
    if http.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.request_timeout_secs must be greater than zero".to_string(),
        ));
    }
    if http.pool_idle_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.pool_idle_timeout_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if server.cors_allowed_origins.iter().any(|origin| origin.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "server.cors_allowed_origins must not contain empty entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_gateway(gateway: &GatewayConfig) -> Result<(), ConfigError> {
    if gateway.port == 0 {
        return Err(ConfigError::Validation("gateway.port must be greater than zero".to_string()));
    }
    validate_http_url("gateway.perfumist_suggest_url", &gateway.perfumist_suggest_url)?;
    validate_http_url("gateway.perfumist_tags_url", &gateway.perfumist_tags_url)?;
    if gateway.timeout_secs == 0 || gateway.ai_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "gateway timeouts must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_pair<'a>(primary: &'a str, alias: &'a str) -> Option<(&'a str, String)> {
    read_env(primary)
        .map(|value| (primary, value))
        .or_else(|| read_env(alias).map(|value| (alias, value)))
}

fn invalid_env(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_env(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_env(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_env(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_env(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| invalid_env(key, value))
}

fn remote_parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::InvalidRemoteValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn remote_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    remote_parse::<f64>(key, value).and_then(|parsed| {
        if parsed.is_finite() {
            Ok(parsed)
        } else {
            Err(ConfigError::InvalidRemoteValue { key: key.to_string(), value: value.to_string() })
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    advisor: Option<AdvisorPatch>,
    cache: Option<CachePatch>,
    remote: Option<RemotePatch>,
    scoring: Option<ScoringPatch>,
    http: Option<HttpPatch>,
    server: Option<ServerPatch>,
    gateway: Option<GatewayPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    get_perfumes_url: Option<String>,
    update_perfumes_url: Option<String>,
    internal_token: Option<String>,
    timeout_secs: Option<u64>,
    page_concurrency: Option<usize>,
    max_pages: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct AdvisorPatch {
    enabled: Option<bool>,
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    backend: Option<CacheBackend>,
    url: Option<String>,
    password_file: Option<PathBuf>,
    password: Option<String>,
    ttl_secs: Option<u64>,
    op_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RemotePatch {
    host: Option<String>,
    port: Option<u16>,
    password: Option<String>,
    namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    family_weight: Option<f64>,
    notes_weight: Option<f64>,
    type_weight: Option<f64>,
    upper_notes_weight: Option<f64>,
    core_notes_weight: Option<f64>,
    base_notes_weight: Option<f64>,
    tag_upper_notes_weight: Option<f64>,
    tag_core_notes_weight: Option<f64>,
    tag_base_notes_weight: Option<f64>,
    workers: Option<usize>,
    suggest_count: Option<usize>,
    exclude_opposite_sex: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpPatch {
    request_timeout_secs: Option<u64>,
    pool_idle_timeout_secs: Option<u64>,
    pool_max_idle_per_host: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    cors_allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayPatch {
    port: Option<u16>,
    perfumist_suggest_url: Option<String>,
    perfumist_tags_url: Option<String>,
    timeout_secs: Option<u64>,
    ai_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, CacheBackend, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_the_deployed_topology() -> Result<(), String> {
        let config = AppConfig::default();
        config.validate().map_err(|err| format!("defaults should validate: {err}"))?;

        ensure(
            config.catalog.get_perfumes_url == "http://perfume:8000/v1/perfumes/get",
            "default catalog url",
        )?;
        ensure(config.advisor.url == "http://ai_advisor:8000/v1/advise", "default advisor url")?;
        ensure(config.catalog.timeout_secs == 2, "catalog timeout should be 2s")?;
        ensure(config.advisor.timeout_secs == 20, "advisor timeout should be 20s")?;
        ensure(config.scoring.workers == 5, "default worker count should be 5")?;
        ensure(config.scoring.suggest_count == 4, "default suggest count should be 4")?;
        ensure(
            config.server.cors_allowed_origins == ["http://frontend:3000"],
            "default cors allow-list",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SCENTLY_INTERNAL_TOKEN", "hub-token-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("scently.toml");
            fs::write(
                &path,
                r#"
[catalog]
internal_token = "${TEST_SCENTLY_INTERNAL_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.internal_token.expose_secret() == "hub-token-from-env",
                "internal token should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_SCENTLY_INTERNAL_TOKEN"]);
        result
    }

    #[test]
    fn unprefixed_service_variables_are_honoured() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("GET_PERFUMES_URL", "http://hub.internal/v1/perfumes/get");
        env::set_var("AI_SUGGEST_URL", "http://advisor.internal/v1/advise");
        env::set_var("PERFUME_INTERNAL_TOKEN", "plain-token");
        env::set_var("CONFIG_STORAGE_HOST", "settings");
        env::set_var("CONFIG_STORAGE_PORT", "6380");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.get_perfumes_url == "http://hub.internal/v1/perfumes/get",
                "GET_PERFUMES_URL should set the catalog url",
            )?;
            ensure(
                config.advisor.url == "http://advisor.internal/v1/advise",
                "AI_SUGGEST_URL should set the advisor url",
            )?;
            ensure(
                config.catalog.internal_token.expose_secret() == "plain-token",
                "PERFUME_INTERNAL_TOKEN should set the token",
            )?;
            ensure(config.remote.host.as_deref() == Some("settings"), "remote host from env")?;
            ensure(config.remote.port == 6380, "remote port from env")
        })();

        clear_vars(&[
            "GET_PERFUMES_URL",
            "AI_SUGGEST_URL",
            "PERFUME_INTERNAL_TOKEN",
            "CONFIG_STORAGE_HOST",
            "CONFIG_STORAGE_PORT",
        ]);
        result
    }

    #[test]
    fn redis_password_is_read_from_the_referenced_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let secret_path = dir.path().join("redis_password");
        fs::write(&secret_path, "s3cret-pass\n").map_err(|err| err.to_string())?;
        env::set_var("REDIS_PASSWORD", &secret_path);

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let password = config.cache.password.as_ref().map(|value| value.expose_secret());
            ensure(password == Some("s3cret-pass"), "password should be trimmed file content")
        })();

        clear_vars(&["REDIS_PASSWORD"]);
        result
    }

    #[test]
    fn missing_password_file_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SCENTLY_CACHE_PASSWORD_FILE", "/definitely/not/here/redis_password");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected secret file failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::ReadSecretFile { .. }),
                "error should name the secret file",
            )
        })();

        clear_vars(&["SCENTLY_CACHE_PASSWORD_FILE"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SCENTLY_LOG_LEVEL", "warn");
        env::set_var("SCENTLY_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["SCENTLY_LOG_LEVEL", "SCENTLY_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SCENTLY_CACHE_BACKEND", "disabled");
        env::set_var("SCENTLY_SCORING_WORKERS", "8");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("scently.toml");
            fs::write(
                &path,
                r#"
[cache]
backend = "memory"
ttl_secs = 60

[scoring]
workers = 3
suggest_count = 6

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    cache_backend: Some(CacheBackend::Memory),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.cache.backend == CacheBackend::Memory, "override backend should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.scoring.workers == 8, "env worker count should win over file")?;
            ensure(config.scoring.suggest_count == 6, "file suggest count should beat default")?;
            ensure(config.cache.ttl_secs == 60, "file ttl should beat default")
        })();

        clear_vars(&["SCENTLY_CACHE_BACKEND", "SCENTLY_SCORING_WORKERS"]);
        result
    }

    #[test]
    fn unbalanced_weights_fail_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("scently.toml");
        fs::write(
            &path,
            r#"
[scoring]
family_weight = 0.6
"#,
        )
        .map_err(|err| err.to_string())?;

        let error = match AppConfig::load(LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected validation failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("sum to 1.0")),
            "validation failure should mention the weight sum",
        )
    }

    #[test]
    fn remote_values_are_applied_and_revalidated() -> Result<(), String> {
        let mut config = AppConfig::default();
        let values: HashMap<String, String> = [
            ("threads_count", "12"),
            ("suggest_count", "6"),
            ("family_weight", "0.30"),
            ("notes_weight", "0.65"),
            ("unrelated_key", "whatever"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let applied =
            config.apply_remote_values(&values).map_err(|err| format!("apply failed: {err}"))?;

        ensure(applied.len() == 4, "four recognised keys should be applied")?;
        ensure(config.scoring.workers == 12, "threads_count should set workers")?;
        ensure(config.scoring.suggest_count == 6, "suggest_count should apply")?;
        ensure((config.scoring.weights.family - 0.30).abs() < 1e-9, "family weight should apply")
    }

    #[test]
    fn tag_weights_load_from_file_and_remote_store() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("scently.toml");
        fs::write(
            &path,
            r#"
[scoring]
tag_upper_notes_weight = 0.1
tag_core_notes_weight = 0.3
tag_base_notes_weight = 0.6
"#,
        )
        .map_err(|err| err.to_string())?;

        let mut config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("load failed: {err}"))?;
        ensure(
            (config.scoring.tag_weights.base_notes - 0.6).abs() < 1e-9,
            "file tag weights should apply",
        )?;
        ensure(
            (config.recommender_settings().tag_weights.upper_notes - 0.1).abs() < 1e-9,
            "recommender settings should carry tag weights",
        )?;

        let unbalanced: HashMap<String, String> =
            [("tags_base_notes_weight".to_string(), "0.9".to_string())].into_iter().collect();
        ensure(
            config.apply_remote_values(&unbalanced).is_err(),
            "unbalanced remote tag weights should be rejected",
        )
    }

    #[test]
    fn invalid_remote_values_leave_config_untouched() -> Result<(), String> {
        let mut config = AppConfig::default();
        let values: HashMap<String, String> =
            [("family_weight".to_string(), "0.9".to_string())].into_iter().collect();

        let outcome = config.apply_remote_values(&values);

        ensure(outcome.is_err(), "unbalanced remote weights should be rejected")?;
        ensure(
            (config.scoring.weights.family - 0.40).abs() < 1e-9,
            "rejected remote values must not leak into the config",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PERFUME_INTERNAL_TOKEN", "hub-secret-value");
        env::set_var("CONFIG_STORAGE_PASSWORD", "settings-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("hub-secret-value"), "debug output should not contain token")?;
            ensure(
                !debug.contains("settings-secret-value"),
                "debug output should not contain remote password",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars(&["PERFUME_INTERNAL_TOKEN", "CONFIG_STORAGE_PASSWORD"]);
        result
    }
}
