//! Payloads exchanged with the rules-engine management service.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::condition::Scalar;
use crate::domain::error::DomainError;

/// Event emitted when a rule's conditions hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: BTreeMap<String, Value>,
}

/// The service sends `"params": null` for events without params.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Full rule as submitted to and returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    pub name: String,
    #[serde(default = "RuleDocument::default_priority")]
    pub priority: i64,
    pub conditions: Value,
    pub event: Event,
}

impl RuleDocument {
    pub fn default_priority() -> i64 {
        1
    }

    /// Check the fields a rule form requires before submission.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidRule("rule name is required".into()));
        }
        if self.event.event_type.trim().is_empty() {
            return Err(DomainError::InvalidRule("event type is required".into()));
        }
        Ok(())
    }
}

/// Entry of a rules listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub name: String,
    #[serde(default = "RuleDocument::default_priority")]
    pub priority: i64,
    pub event: Event,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
}

/// Fact registered on an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactDescriptor {
    pub id: String,
    #[serde(default)]
    pub is_constant: bool,
    #[serde(default)]
    pub cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Suggested fact offered by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredefinedFact {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactKind {
    Constant,
    Function,
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactKind::Constant => f.write_str("constant"),
            FactKind::Function => f.write_str("function"),
        }
    }
}

impl FromStr for FactKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constant" => Ok(FactKind::Constant),
            "function" => Ok(FactKind::Function),
            other => Err(DomainError::InvalidRule(format!(
                "unknown fact type '{}' (expected constant or function)",
                other
            ))),
        }
    }
}

/// Request body for registering a fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFact {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FactKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cache: bool,
}

impl NewFact {
    /// Build a fact from form input. Constant values are coerced like leaf values.
    pub fn from_input(
        id: &str,
        kind: FactKind,
        raw_value: Option<&str>,
        description: Option<&str>,
        cache: bool,
    ) -> Result<Self, DomainError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(DomainError::InvalidRule("fact id is required".into()));
        }
        let value = match kind {
            FactKind::Constant => Some(Scalar::text(raw_value.unwrap_or("")).to_json()),
            FactKind::Function => None,
        };
        Ok(Self {
            id: id.to_string(),
            kind,
            value,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
            cache,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResult {
    pub name: String,
    pub success: bool,
}

/// Outcome of running an engine against runtime facts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub rule_results: Vec<RuleResult>,
}
