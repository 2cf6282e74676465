//! Client for the download oracle's status query.

use album_proto::protocol::{OracleReading, ProtocolError};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[async_trait]
pub trait CompletionOracle: Send + Sync {
    async fn query(&self) -> Result<OracleReading, OracleError>;
}

pub struct HttpOracle {
    client: reqwest::Client,
    url: String,
}

impl HttpOracle {
    /// `client` should carry a request timeout; a hung oracle would
    /// otherwise stall the machine.
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CompletionOracle for HttpOracle {
    async fn query(&self) -> Result<OracleReading, OracleError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()));
        }
        let text = response.text().await?;
        Ok(OracleReading::parse(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_oracle_is_transport_error() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let oracle = HttpOracle::new(client, "http://127.0.0.1:9");
        let err = oracle.query().await.unwrap_err();
        assert!(matches!(err, OracleError::Transport(_)));
        assert!(err.to_string().starts_with("oracle unreachable"));
    }
}
