//! HTTP implementation of [`RulesApi`] on a blocking reqwest client.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::domain::{FactDescriptor, NewFact, PredefinedFact, RuleDocument, RuleSummary, RunOutcome};
use crate::infrastructure::traits::{ApiError, RulesApi};
use crate::infrastructure::{InfraError, InfraResult};

#[derive(Debug, Deserialize)]
struct EnginesBody {
    #[serde(default)]
    engines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FactsBody<T> {
    #[serde(default = "Vec::new")]
    facts: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RulesBody {
    rules: Vec<RuleSummary>,
}

#[derive(Debug, Deserialize)]
struct RuleBody {
    rule: RuleDocument,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpRulesApi {
    client: Client,
    base: Url,
}

impl HttpRulesApi {
    /// Create a client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> InfraResult<Self> {
        let base = Url::parse(base_url).map_err(|e| InfraError::Backend {
            message: format!("invalid api url '{}': {}", base_url, e),
        })?;
        if base.cannot_be_a_base() {
            return Err(InfraError::Backend {
                message: format!("api url cannot be a base: {}", base_url),
            });
        }
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| InfraError::Backend {
                message: format!("build http client: {}", e),
            })?;
        Ok(Self { client, base })
    }

    /// `<base>/api/<segments...>`, each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    #[instrument(level = "debug", skip(self, body))]
    fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(segments);
        debug!("{} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().unwrap_or_default();
        Err(status_error(status, &text))
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        decode(self.send::<Value>(Method::GET, segments, None)?)
    }

    fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<Response, ApiError> {
        self.send(Method::POST, segments, Some(body))
    }

    fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        self.send::<Value>(Method::DELETE, segments, None).map(|_| ())
    }
}

/// Non-2xx response; the message comes from an `{"error": ...}` body when present.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                body.trim().to_string()
            }
        });
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let text = response
        .text()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

impl RulesApi for HttpRulesApi {
    fn list_engines(&self) -> Result<Vec<String>, ApiError> {
        self.get::<EnginesBody>(&["engines"]).map(|b| b.engines)
    }

    fn create_engine(&self, name: &str) -> Result<(), ApiError> {
        self.post(&["engines"], &json!({ "name": name })).map(|_| ())
    }

    fn delete_engine(&self, name: &str) -> Result<(), ApiError> {
        self.delete(&["engines", name])
    }

    fn list_facts(&self, engine: &str) -> Result<Vec<FactDescriptor>, ApiError> {
        self.get::<FactsBody<FactDescriptor>>(&["engines", engine, "facts"])
            .map(|b| b.facts)
    }

    fn add_fact(&self, engine: &str, fact: &NewFact) -> Result<(), ApiError> {
        self.post(&["engines", engine, "facts"], fact).map(|_| ())
    }

    fn delete_fact(&self, engine: &str, id: &str) -> Result<(), ApiError> {
        self.delete(&["engines", engine, "facts", id])
    }

    fn predefined_facts(&self) -> Result<Vec<PredefinedFact>, ApiError> {
        self.get::<FactsBody<PredefinedFact>>(&["predefined-facts"])
            .map(|b| b.facts)
    }

    fn list_rules(&self, engine: &str) -> Result<Vec<RuleSummary>, ApiError> {
        self.get::<RulesBody>(&["engines", engine, "rules"])
            .map(|b| b.rules)
    }

    fn get_rule(&self, engine: &str, name: &str) -> Result<RuleDocument, ApiError> {
        self.get::<RuleBody>(&["engines", engine, "rules", name])
            .map(|b| b.rule)
    }

    fn add_rule(&self, engine: &str, rule: &RuleDocument) -> Result<(), ApiError> {
        self.post(&["engines", engine, "rules"], rule).map(|_| ())
    }

    fn delete_rule(&self, engine: &str, name: &str) -> Result<(), ApiError> {
        self.delete(&["engines", engine, "rules", name])
    }

    fn run(&self, engine: &str, facts: &Map<String, Value>) -> Result<RunOutcome, ApiError> {
        decode(self.post(&["engines", engine, "run"], facts)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = HttpRulesApi::new("http://localhost:8080/").unwrap();
        assert_eq!(
            api.endpoint(&["engines", "my engine", "rules", "a/b"]).as_str(),
            "http://localhost:8080/api/engines/my%20engine/rules/a%2Fb"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = HttpRulesApi::new("http://example.com/gavel").unwrap();
        assert_eq!(
            api.endpoint(&["predefined-facts"]).as_str(),
            "http://example.com/gavel/api/predefined-facts"
        );
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(HttpRulesApi::new("not a url").is_err());
        assert!(HttpRulesApi::new("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_keyed_rules_listing_is_rejected() {
        let keyed = r#"{"adult": {"name": "adult", "event": {"Type": "x", "Params": {}}}}"#;
        assert!(serde_json::from_str::<RulesBody>(keyed).is_err());
    }

    #[test]
    fn test_status_error_prefers_error_field() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, r#"{"error": "engine not found"}"#),
            ApiError::Status {
                status: 404,
                message: "engine not found".into()
            }
        );
    }

    #[test]
    fn test_status_error_falls_back_to_body_or_reason() {
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, " upstream down \n"),
            ApiError::Status {
                status: 502,
                message: "upstream down".into()
            }
        );
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, ""),
            ApiError::Status {
                status: 500,
                message: "Internal Server Error".into()
            }
        );
    }
}
