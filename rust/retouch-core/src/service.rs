//! The remote correction service.
//!
//! The wire contract is a single JSON round-trip:
//!
//! ```text
//! POST <endpoint>  { "text": "..." }
//! 200 OK           { "corrected_text": "..." }
//! ```
//!
//! Anything else (transport failure, non-success status, a body that does not
//! parse) is a [`ServiceError`]. Nothing is retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::ServiceError;

/// Request body sent to the correction endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub text: String,
}

/// Response body returned by the correction endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionResponse {
    pub corrected_text: String,
}

/// Something that can correct a piece of text.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait CorrectionService {
    /// Return the corrected form of `text`.
    async fn correct(&self, text: &str) -> Result<String, ServiceError>;
}

/// [`CorrectionService`] backed by an HTTP endpoint.
#[derive(Clone, Debug)]
pub struct HttpCorrectionService {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpCorrectionService {
    /// Create a client for the given endpoint URL.
    pub fn new(endpoint: &str) -> Result<Self, ServiceError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| ServiceError::InvalidEndpoint(e.to_string()))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ServiceError::Unreachable(e.to_string()))?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl CorrectionService for HttpCorrectionService {
    async fn correct(&self, text: &str) -> Result<String, ServiceError> {
        let body = CorrectionRequest {
            text: text.to_string(),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let parsed: CorrectionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;

        debug!(
            original_len = text.len(),
            corrected_len = parsed.corrected_text.len(),
            "Correction service responded"
        );
        Ok(parsed.corrected_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_an_invalid_endpoint() {
        assert!(matches!(
            HttpCorrectionService::new("not a url"),
            Err(ServiceError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn it_keeps_the_parsed_endpoint() -> anyhow::Result<()> {
        let service = HttpCorrectionService::new("https://retouch.example/api/correct")?;

        assert_eq!(service.endpoint().host_str(), Some("retouch.example"));
        assert_eq!(service.endpoint().path(), "/api/correct");
        Ok(())
    }

    #[test]
    fn it_uses_the_documented_wire_shapes() -> anyhow::Result<()> {
        let request = serde_json::to_value(CorrectionRequest {
            text: "helo".into(),
        })?;
        assert_eq!(request, serde_json::json!({ "text": "helo" }));

        let response: CorrectionResponse =
            serde_json::from_str(r#"{ "corrected_text": "hello", "confidence": 0.9 }"#)?;
        assert_eq!(response.corrected_text, "hello");

        assert!(serde_json::from_str::<CorrectionResponse>("{}").is_err());
        Ok(())
    }
}
