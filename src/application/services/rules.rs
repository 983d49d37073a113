//! Rule authoring, listing and engine runs

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::application::{ApplicationError, ApplicationResult, EditorSession};
use crate::domain::{RuleDocument, RuleSummary, RunOutcome};
use crate::infrastructure::traits::RulesApi;

pub struct RuleService {
    api: Arc<dyn RulesApi>,
}

impl RuleService {
    pub fn new(api: Arc<dyn RulesApi>) -> Self {
        Self { api }
    }

    #[instrument(level = "debug", skip(self, session))]
    pub fn list(&self, session: &EditorSession) -> ApplicationResult<Vec<RuleSummary>> {
        let engine = session.require_engine()?;
        self.api
            .list_rules(engine)
            .map_err(|e| ApplicationError::backend(format!("list rules of '{}'", engine), e))
    }

    #[instrument(level = "debug", skip(self, session))]
    pub fn get(&self, session: &EditorSession, name: &str) -> ApplicationResult<RuleDocument> {
        let engine = session.require_engine()?;
        self.api
            .get_rule(engine, name)
            .map_err(|e| ApplicationError::backend(format!("get rule '{}'", name), e))
    }

    #[instrument(level = "debug", skip(self, session))]
    pub fn delete(&self, session: &EditorSession, name: &str) -> ApplicationResult<()> {
        let engine = session.require_engine()?;
        self.api
            .delete_rule(engine, name)
            .map_err(|e| ApplicationError::backend(format!("delete rule '{}'", name), e))
    }

    /// Build a rule from the session and post it.
    ///
    /// The session is reset only after the backend accepted the rule.
    #[instrument(level = "debug", skip(self, session, params))]
    pub fn submit(
        &self,
        session: &mut EditorSession,
        name: &str,
        priority: Option<i64>,
        event_type: &str,
        params: BTreeMap<String, Value>,
    ) -> ApplicationResult<RuleDocument> {
        let engine = session.require_engine()?.to_string();
        let rule = session.draft_rule(name, priority, event_type, params)?;
        self.api
            .add_rule(&engine, &rule)
            .map_err(|e| ApplicationError::backend(format!("add rule '{}'", rule.name), e))?;
        info!("rule '{}' added to '{}'", rule.name, engine);
        session.reset();
        Ok(rule)
    }

    #[instrument(level = "debug", skip(self, session, facts))]
    pub fn run(
        &self,
        session: &EditorSession,
        facts: &Map<String, Value>,
    ) -> ApplicationResult<RunOutcome> {
        let engine = session.require_engine()?;
        self.api
            .run(engine, facts)
            .map_err(|e| ApplicationError::backend(format!("run engine '{}'", engine), e))
    }
}
