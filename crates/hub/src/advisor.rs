use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scently_core::config::AdvisorConfig;
use scently_core::{AdvisedPerfume, Advisor, AdvisorError, Perfume};
use serde::Deserialize;

/// Client for the external shortlist oracle: the reference perfume goes out
/// as the request body and a list of `{brand, name, sex?}` comes back.
#[derive(Clone)]
pub struct HttpAdvisor {
    client: Client,
    url: String,
    timeout: Duration,
}

/// Advisors answer with either a bare list or an object wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum AdvisorPayload {
    Bare(Vec<AdvisedPerfume>),
    Wrapped { perfumes: Vec<AdvisedPerfume> },
}

impl AdvisorPayload {
    fn into_perfumes(self) -> Vec<AdvisedPerfume> {
        match self {
            Self::Bare(perfumes) | Self::Wrapped { perfumes } => perfumes,
        }
    }
}

impl HttpAdvisor {
    pub fn new(client: Client, config: &AdvisorConfig) -> Self {
        Self { client, url: config.url.clone(), timeout: config.timeout() }
    }

    fn map_error(&self, error: reqwest::Error) -> AdvisorError {
        if error.is_timeout() {
            AdvisorError::Timeout(self.timeout)
        } else if error.is_decode() {
            AdvisorError::Decode(error.to_string())
        } else {
            AdvisorError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl Advisor for HttpAdvisor {
    async fn advise(&self, reference: &Perfume) -> Result<Vec<AdvisedPerfume>, AdvisorError> {
        let response = self
            .client
            .post(&self.url)
            .json(reference)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| self.map_error(error))?;

        if response.status() != StatusCode::OK {
            return Err(AdvisorError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await.map_err(|error| self.map_error(error))?;
        let payload: AdvisorPayload = serde_json::from_slice(&bytes)
            .map_err(|error| AdvisorError::Decode(error.to_string()))?;
        Ok(payload.into_perfumes())
    }
}
