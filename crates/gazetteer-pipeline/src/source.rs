//! Upstream country-data source client.
//!
//! [`CountrySource`] is the pipeline's view of the external canonical data
//! source: a single call that returns a structured document or fails. The
//! client performs no retry or backoff of its own; retries happen only via
//! the queue's redelivery of unacknowledged work items.

use async_trait::async_trait;
use serde_json::Value;

use gazetteer_core::{CountryKey, Document};

use crate::config::SourceConfig;
use crate::error::{Error, Result};

/// Synchronous fetch of one country's canonical document.
///
/// Failures (unknown country, transport error, malformed response) map to
/// [`Error::FetchFailed`] with a human-readable reason; the worker path
/// records that reason in the status history.
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Fetches the canonical document for a country.
    async fn fetch(&self, key: &CountryKey) -> Result<Document>;
}

/// Client for the REST Countries API.
///
/// Queries `{base_url}/name/{name}?fullText=true` with the key's hyphens
/// restored to spaces, and returns the first match. Connect and request
/// timeouts are the transport client's own; a pipeline-enforced maximum
/// fetch deadline is a future extension point.
#[derive(Debug, Clone)]
pub struct RestCountriesSource {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl RestCountriesSource {
    /// Creates a new client from source configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let base_url = reqwest::Url::parse(&config.base_url).map_err(|e| {
            Error::Core(gazetteer_core::Error::internal(format!(
                "invalid source base URL '{}': {e}",
                config.base_url
            )))
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                Error::Core(gazetteer_core::Error::internal(format!(
                    "failed to build HTTP client: {e}"
                )))
            })?;

        Ok(Self { client, base_url })
    }

    /// Builds the request URL for a country.
    fn request_url(&self, key: &CountryKey) -> Result<reqwest::Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::Core(gazetteer_core::Error::internal(
                    "source base URL cannot be a base",
                ))
            })?
            .pop_if_empty()
            .push("name")
            .push(&key.display_name());
        url.query_pairs_mut().append_pair("fullText", "true");
        Ok(url)
    }
}

/// Extracts the document from a source response body.
///
/// The API answers with an array of matches; the first match wins and an
/// empty array means the country is unknown upstream.
fn document_from_response(body: Value, key: &CountryKey) -> Result<Document> {
    match body {
        Value::Array(mut matches) if !matches.is_empty() => Ok(matches.swap_remove(0)),
        Value::Array(_) => Err(Error::fetch_failed(format!(
            "no data found for country '{key}'"
        ))),
        other => Err(Error::fetch_failed(format!(
            "unexpected response shape for country '{key}': expected array, got {}",
            value_kind(&other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl CountrySource for RestCountriesSource {
    #[tracing::instrument(skip(self), fields(country = %key))]
    async fn fetch(&self, key: &CountryKey) -> Result<Document> {
        let url = self.request_url(key)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            Error::fetch_failed_with_source(format!("request for '{key}' failed: {e}"), e)
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::fetch_failed(format!(
                "no country found for '{key}'"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::fetch_failed(format!(
                "source returned status {status} for '{key}': {body}"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            Error::fetch_failed_with_source(format!("malformed response for '{key}': {e}"), e)
        })?;

        let document = document_from_response(body, key)?;
        tracing::debug!(country = %key, "fetched document from source");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(name: &str) -> CountryKey {
        CountryKey::parse(name).unwrap()
    }

    fn source() -> RestCountriesSource {
        RestCountriesSource::new(&SourceConfig::default()).unwrap()
    }

    #[test]
    fn request_url_restores_spaces_and_sets_full_text() {
        let url = source().request_url(&key("united-kingdom")).unwrap();
        assert_eq!(url.path(), "/v3.1/name/united%20kingdom");
        assert_eq!(url.query(), Some("fullText=true"));
    }

    #[test]
    fn request_url_single_word() {
        let url = source().request_url(&key("france")).unwrap();
        assert_eq!(url.path(), "/v3.1/name/france");
    }

    #[test]
    fn first_match_wins() {
        let body = json!([{"name": "France"}, {"name": "Metropolitan France"}]);
        let document = document_from_response(body, &key("france")).unwrap();
        assert_eq!(document, json!({"name": "France"}));
    }

    #[test]
    fn empty_array_is_a_fetch_failure() {
        let err = document_from_response(json!([]), &key("atlantis")).unwrap_err();
        assert!(err.to_string().contains("no data found"));
    }

    #[test]
    fn non_array_response_is_a_fetch_failure() {
        let err = document_from_response(json!({"status": 404}), &key("france")).unwrap_err();
        assert!(err.to_string().contains("expected array"));
        assert!(err.to_string().contains("object"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = SourceConfig {
            base_url: "not a url".into(),
            ..SourceConfig::default()
        };
        assert!(RestCountriesSource::new(&config).is_err());
    }
}
