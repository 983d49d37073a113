//! In-memory management service for service and command tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use rulesdesk::domain::{
    Event, FactDescriptor, FactKind, NewFact, PredefinedFact, RuleDocument, RuleResult,
    RuleSummary, RunOutcome,
};
use rulesdesk::infrastructure::traits::{ApiError, RulesApi};

#[derive(Debug, Default)]
struct EngineState {
    facts: Vec<FactDescriptor>,
    rules: Vec<RuleDocument>,
}

#[derive(Debug, Default)]
struct State {
    engines: BTreeMap<String, EngineState>,
    fail_next: Option<ApiError>,
    calls: Vec<String>,
}

/// Backend double: keeps engines, facts and rules in memory.
///
/// `run` reports every rule as successful and fires its event.
#[derive(Debug, Default, Clone)]
pub struct FakeRulesApi {
    state: Arc<Mutex<State>>,
}

impl FakeRulesApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(name: &str) -> Self {
        let api = Self::new();
        api.state
            .lock()
            .unwrap()
            .engines
            .insert(name.to_string(), EngineState::default());
        api
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        self.state.lock().unwrap().fail_next = Some(error);
    }

    pub fn rules(&self, engine: &str) -> Vec<RuleDocument> {
        self.state
            .lock()
            .unwrap()
            .engines
            .get(engine)
            .map(|e| e.rules.clone())
            .unwrap_or_default()
    }

    pub fn engine_names(&self) -> Vec<String> {
        self.state.lock().unwrap().engines.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn call<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut State) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(name.to_string());
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        f(&mut state)
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("{} not found", what),
    }
}

fn engine<'s>(state: &'s mut State, name: &str) -> Result<&'s mut EngineState, ApiError> {
    state
        .engines
        .get_mut(name)
        .ok_or_else(|| not_found(&format!("engine {}", name)))
}

impl RulesApi for FakeRulesApi {
    fn list_engines(&self) -> Result<Vec<String>, ApiError> {
        self.call("list_engines", |s| Ok(s.engines.keys().cloned().collect()))
    }

    fn create_engine(&self, name: &str) -> Result<(), ApiError> {
        self.call("create_engine", |s| {
            if s.engines.contains_key(name) {
                return Err(ApiError::Status {
                    status: 409,
                    message: format!("engine {} already exists", name),
                });
            }
            s.engines.insert(name.to_string(), EngineState::default());
            Ok(())
        })
    }

    fn delete_engine(&self, name: &str) -> Result<(), ApiError> {
        self.call("delete_engine", |s| {
            s.engines
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| not_found(&format!("engine {}", name)))
        })
    }

    fn list_facts(&self, name: &str) -> Result<Vec<FactDescriptor>, ApiError> {
        self.call("list_facts", |s| Ok(engine(s, name)?.facts.clone()))
    }

    fn add_fact(&self, name: &str, fact: &NewFact) -> Result<(), ApiError> {
        self.call("add_fact", |s| {
            engine(s, name)?.facts.push(FactDescriptor {
                id: fact.id.clone(),
                is_constant: fact.kind == FactKind::Constant,
                cache: fact.cache,
                description: fact.description.clone(),
            });
            Ok(())
        })
    }

    fn delete_fact(&self, name: &str, id: &str) -> Result<(), ApiError> {
        self.call("delete_fact", |s| {
            let facts = &mut engine(s, name)?.facts;
            let before = facts.len();
            facts.retain(|f| f.id != id);
            if facts.len() == before {
                return Err(not_found(&format!("fact {}", id)));
            }
            Ok(())
        })
    }

    fn predefined_facts(&self) -> Result<Vec<PredefinedFact>, ApiError> {
        self.call("predefined_facts", |_| {
            Ok(vec![PredefinedFact {
                id: "currentTime".into(),
                description: "Current time".into(),
                usage: None,
            }])
        })
    }

    fn list_rules(&self, name: &str) -> Result<Vec<RuleSummary>, ApiError> {
        self.call("list_rules", |s| {
            Ok(engine(s, name)?
                .rules
                .iter()
                .map(|r| RuleSummary {
                    name: r.name.clone(),
                    priority: r.priority,
                    event: r.event.clone(),
                    conditions: Some(r.conditions.clone()),
                })
                .collect())
        })
    }

    fn get_rule(&self, name: &str, rule: &str) -> Result<RuleDocument, ApiError> {
        self.call("get_rule", |s| {
            engine(s, name)?
                .rules
                .iter()
                .find(|r| r.name == rule)
                .cloned()
                .ok_or_else(|| not_found(&format!("rule {}", rule)))
        })
    }

    fn add_rule(&self, name: &str, rule: &RuleDocument) -> Result<(), ApiError> {
        self.call("add_rule", |s| {
            engine(s, name)?.rules.push(rule.clone());
            Ok(())
        })
    }

    fn delete_rule(&self, name: &str, rule: &str) -> Result<(), ApiError> {
        self.call("delete_rule", |s| {
            let rules = &mut engine(s, name)?.rules;
            let before = rules.len();
            rules.retain(|r| r.name != rule);
            if rules.len() == before {
                return Err(not_found(&format!("rule {}", rule)));
            }
            Ok(())
        })
    }

    fn run(&self, name: &str, _facts: &Map<String, Value>) -> Result<RunOutcome, ApiError> {
        self.call("run", |s| {
            let rules = &engine(s, name)?.rules;
            Ok(RunOutcome {
                events: rules
                    .iter()
                    .map(|r| Event {
                        event_type: r.event.event_type.clone(),
                        params: r.event.params.clone(),
                    })
                    .collect(),
                rule_results: rules
                    .iter()
                    .map(|r| RuleResult {
                        name: r.name.clone(),
                        success: true,
                    })
                    .collect(),
            })
        })
    }
}
