//! I/O boundary traits for testability
//!
//! The management service is reached only through [`RulesApi`], allowing
//! services to be tested with in-memory implementations.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{FactDescriptor, NewFact, PredefinedFact, RuleDocument, RuleSummary, RunOutcome};

/// Failure talking to the management service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Rules-engine management service.
///
/// Engine-scoped calls take the engine name; no call retries or times out.
pub trait RulesApi: Send + Sync {
    fn list_engines(&self) -> Result<Vec<String>, ApiError>;

    fn create_engine(&self, name: &str) -> Result<(), ApiError>;

    fn delete_engine(&self, name: &str) -> Result<(), ApiError>;

    fn list_facts(&self, engine: &str) -> Result<Vec<FactDescriptor>, ApiError>;

    fn add_fact(&self, engine: &str, fact: &NewFact) -> Result<(), ApiError>;

    fn delete_fact(&self, engine: &str, id: &str) -> Result<(), ApiError>;

    fn predefined_facts(&self) -> Result<Vec<PredefinedFact>, ApiError>;

    fn list_rules(&self, engine: &str) -> Result<Vec<RuleSummary>, ApiError>;

    fn get_rule(&self, engine: &str, name: &str) -> Result<RuleDocument, ApiError>;

    fn add_rule(&self, engine: &str, rule: &RuleDocument) -> Result<(), ApiError>;

    fn delete_rule(&self, engine: &str, name: &str) -> Result<(), ApiError>;

    /// Evaluate the engine's rules against runtime facts.
    fn run(&self, engine: &str, facts: &Map<String, Value>) -> Result<RunOutcome, ApiError>;
}
