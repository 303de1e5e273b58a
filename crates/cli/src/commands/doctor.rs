use scently_cache::build_response_cache;
use scently_core::config::{AppConfig, LoadOptions};
use scently_core::{CatalogFilter, CatalogSource};
use scently_hub::{build_http_client, HttpCatalog};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::{runtime, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DOCTOR_CHECK_BRAND: &str = "scently-doctor";

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\
                 \"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };
    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_internal_token(&config));
            checks.extend(check_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["internal_token", "catalog_reachability", "cache_reachability"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_internal_token(config: &AppConfig) -> DoctorCheck {
    if config.catalog.internal_token.expose_secret().trim().is_empty() {
        DoctorCheck {
            name: "internal_token",
            status: CheckStatus::Fail,
            details: "catalog.internal_token is empty; the hub will answer 401".to_string(),
        }
    } else {
        DoctorCheck {
            name: "internal_token",
            status: CheckStatus::Pass,
            details: "internal token configured".to_string(),
        }
    }
}

fn check_connectivity(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match runtime("doctor") {
        Ok(runtime) => runtime,
        Err(_) => {
            return vec![DoctorCheck {
                name: "catalog_reachability",
                status: CheckStatus::Fail,
                details: "failed to initialize async runtime".to_string(),
            }];
        }
    };

    runtime.block_on(async {
        vec![check_catalog(config).await, check_cache(config).await]
    })
}

async fn check_catalog(config: &AppConfig) -> DoctorCheck {
    let client = match build_http_client(&config.http) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "catalog_reachability",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    // a targeted lookup is one request; an empty result still proves reachability
    let catalog = HttpCatalog::new(client, &config.catalog);
    let lookup = CatalogFilter::by_identity(DOCTOR_CHECK_BRAND, DOCTOR_CHECK_BRAND);
    match catalog.fetch(&lookup).await {
        Ok(_) => DoctorCheck {
            name: "catalog_reachability",
            status: CheckStatus::Pass,
            details: format!("catalog answered at `{}`", config.catalog.get_perfumes_url),
        },
        Err(error) => DoctorCheck {
            name: "catalog_reachability",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

async fn check_cache(config: &AppConfig) -> DoctorCheck {
    let outcome = match build_response_cache(&config.cache) {
        Ok(cache) => cache.ping().await.map(|()| cache.backend_name()),
        Err(error) => Err(error),
    };
    match outcome {
        Ok(backend) => DoctorCheck {
            name: "cache_reachability",
            status: CheckStatus::Pass,
            details: format!("{backend} cache reachable"),
        },
        Err(error) => DoctorCheck {
            name: "cache_reachability",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
