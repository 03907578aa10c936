use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

// Body returned by the game server's health route.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum HealthCheckError {
    Transport(reqwest::Error),
    Upstream { status: StatusCode },
}

impl fmt::Display for HealthCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthCheckError::Transport(err) => write!(f, "health check transport error: {err}"),
            HealthCheckError::Upstream { status } => {
                write!(f, "health check failed with status {status}")
            }
        }
    }
}

impl std::error::Error for HealthCheckError {}

// Thin reqwest client for the pre-connect health check.
#[derive(Clone)]
pub struct HealthClient {
    http: reqwest::Client,
    url: String,
}

impl HealthClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn check(&self) -> Result<HealthStatus, HealthCheckError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(HealthCheckError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HealthCheckError::Upstream { status });
        }

        // A healthy server with an unexpected body is still healthy.
        Ok(response
            .json::<HealthStatus>()
            .await
            .unwrap_or(HealthStatus { message: None }))
    }
}
