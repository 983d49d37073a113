//! Engine and fact management
//!
//! Keeps the session's engine selection and fact cache in step with the backend.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, EditorSession};
use crate::domain::{DomainError, FactDescriptor, NewFact, PredefinedFact};
use crate::infrastructure::traits::RulesApi;

pub struct CatalogService {
    api: Arc<dyn RulesApi>,
}

impl CatalogService {
    pub fn new(api: Arc<dyn RulesApi>) -> Self {
        Self { api }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn list_engines(&self) -> ApplicationResult<Vec<String>> {
        self.api
            .list_engines()
            .map_err(|e| ApplicationError::backend("list engines", e))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn create_engine(&self, name: &str) -> ApplicationResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidRule("engine name is required".into()).into());
        }
        self.api
            .create_engine(name)
            .map_err(|e| ApplicationError::backend(format!("create engine '{}'", name), e))
    }

    /// Delete an engine; deselects it when it was the session's engine.
    #[instrument(level = "debug", skip(self, session))]
    pub fn delete_engine(&self, session: &mut EditorSession, name: &str) -> ApplicationResult<()> {
        self.api
            .delete_engine(name)
            .map_err(|e| ApplicationError::backend(format!("delete engine '{}'", name), e))?;
        if session.engine() == Some(name) {
            debug!("selected engine deleted, clearing selection");
            session.clear_engine();
        }
        Ok(())
    }

    /// Fetch the engine's facts and cache them in the session.
    #[instrument(level = "debug", skip(self, session))]
    pub fn refresh_facts(&self, session: &mut EditorSession) -> ApplicationResult<Vec<FactDescriptor>> {
        let engine = session.require_engine()?.to_string();
        let facts = self
            .api
            .list_facts(&engine)
            .map_err(|e| ApplicationError::backend(format!("list facts of '{}'", engine), e))?;
        debug!("cached {} fact(s)", facts.len());
        session.set_facts(facts.clone());
        Ok(facts)
    }

    #[instrument(level = "debug", skip(self, session))]
    pub fn add_fact(&self, session: &EditorSession, fact: &NewFact) -> ApplicationResult<()> {
        let engine = session.require_engine()?;
        self.api
            .add_fact(engine, fact)
            .map_err(|e| ApplicationError::backend(format!("add fact '{}'", fact.id), e))
    }

    #[instrument(level = "debug", skip(self, session))]
    pub fn delete_fact(&self, session: &EditorSession, id: &str) -> ApplicationResult<()> {
        let engine = session.require_engine()?;
        self.api
            .delete_fact(engine, id)
            .map_err(|e| ApplicationError::backend(format!("delete fact '{}'", id), e))
    }

    pub fn predefined_facts(&self) -> ApplicationResult<Vec<PredefinedFact>> {
        self.api
            .predefined_facts()
            .map_err(|e| ApplicationError::backend("list predefined facts", e))
    }
}
