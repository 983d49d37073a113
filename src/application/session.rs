//! Rule-authoring session state
//!
//! Holds the selected engine, the cached fact list and the two views of the
//! condition being edited: the interactive tree and the JSON text buffer.
//! The views are only reconciled on an explicit mode switch.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    codec, ConditionTree, Event, FactDescriptor, RuleDocument, DomainError,
};

/// Which view of the condition is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Visual,
    Json,
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorMode::Visual => f.write_str("visual"),
            EditorMode::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    VisualToJson,
    JsonToVisual,
}

/// Document placed in the JSON buffer on a fresh form.
pub fn default_conditions() -> Value {
    json!({
        "all": [
            {"fact": "age", "operator": "greaterThanInclusive", "value": 18}
        ]
    })
}

#[derive(Debug)]
pub struct EditorSession {
    engine: Option<String>,
    facts: Vec<FactDescriptor>,
    tree: ConditionTree,
    json_buffer: String,
    mode: EditorMode,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            engine: None,
            facts: Vec::new(),
            tree: ConditionTree::default(),
            json_buffer: codec::to_json_text(&default_conditions()),
            mode: EditorMode::Visual,
        }
    }

    pub fn with_engine(engine: Option<String>) -> Self {
        let mut session = Self::new();
        session.engine = engine;
        session
    }

    /// Clear the rule form. Engine selection and fact cache survive.
    #[instrument(level = "debug", skip(self))]
    pub fn reset(&mut self) {
        self.tree = ConditionTree::default();
        self.json_buffer = codec::to_json_text(&default_conditions());
        self.mode = EditorMode::Visual;
    }

    pub fn engine(&self) -> Option<&str> {
        self.engine.as_deref()
    }

    /// Selected engine, or `NoEngineSelected`.
    pub fn require_engine(&self) -> ApplicationResult<&str> {
        self.engine().ok_or(ApplicationError::NoEngineSelected)
    }

    pub fn select_engine(&mut self, name: impl Into<String>) {
        let name = name.into();
        info!("engine selected: {}", name);
        self.engine = Some(name);
        self.facts.clear();
    }

    pub fn clear_engine(&mut self) {
        self.engine = None;
        self.facts.clear();
    }

    pub fn facts(&self) -> &[FactDescriptor] {
        &self.facts
    }

    pub fn set_facts(&mut self, facts: Vec<FactDescriptor>) {
        self.facts = facts;
    }

    /// Fact ids offered when choosing a fact for a new condition.
    pub fn fact_options(&self) -> Vec<&str> {
        self.facts.iter().map(|f| f.id.as_str()).collect()
    }

    /// Advisory only; unknown facts are never rejected.
    pub fn is_known_fact(&self, id: &str) -> bool {
        self.facts.iter().any(|f| f.id == id)
    }

    pub fn tree(&self) -> &ConditionTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ConditionTree {
        &mut self.tree
    }

    pub fn json_buffer(&self) -> &str {
        &self.json_buffer
    }

    pub fn set_json_buffer(&mut self, text: impl Into<String>) {
        self.json_buffer = text.into();
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// One-way refresh of one view from the other.
    ///
    /// `JsonToVisual` leaves the tree untouched if the buffer does not parse
    /// or does not describe a condition tree.
    #[instrument(level = "debug", skip(self))]
    pub fn synchronize(&mut self, direction: SyncDirection) -> ApplicationResult<()> {
        match direction {
            SyncDirection::VisualToJson => {
                self.json_buffer = codec::to_json_text(&codec::serialize(&self.tree));
            }
            SyncDirection::JsonToVisual => {
                let tree = self.parse_buffer()?;
                debug!("replacing visual tree with {} node(s)", tree.len());
                self.tree = tree;
            }
        }
        Ok(())
    }

    /// Switch the active view, synchronizing into the new one.
    ///
    /// Switching to the current mode is a no-op. On failure the mode is unchanged.
    pub fn switch_mode(&mut self, mode: EditorMode) -> ApplicationResult<()> {
        if mode == self.mode {
            return Ok(());
        }
        let direction = match mode {
            EditorMode::Json => SyncDirection::VisualToJson,
            EditorMode::Visual => SyncDirection::JsonToVisual,
        };
        self.synchronize(direction)?;
        self.mode = mode;
        Ok(())
    }

    /// Conditions document to submit, taken from the active view.
    pub fn conditions(&self) -> ApplicationResult<Value> {
        match self.mode {
            EditorMode::Visual => Ok(codec::serialize(&self.tree)),
            EditorMode::Json => Ok(codec::serialize(&self.parse_buffer()?)),
        }
    }

    /// Assemble a rule from the form fields and the active condition view.
    pub fn draft_rule(
        &self,
        name: &str,
        priority: Option<i64>,
        event_type: &str,
        params: BTreeMap<String, Value>,
    ) -> ApplicationResult<RuleDocument> {
        let rule = RuleDocument {
            name: name.trim().to_string(),
            priority: priority.unwrap_or_else(RuleDocument::default_priority),
            conditions: self.conditions()?,
            event: Event {
                event_type: event_type.trim().to_string(),
                params,
            },
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Replace the tree from a document, e.g. a rule fetched from the backend.
    pub fn load_conditions(&mut self, document: &Value) -> Result<(), DomainError> {
        self.tree = codec::deserialize(document)?;
        self.json_buffer = codec::to_json_text(document);
        Ok(())
    }

    fn parse_buffer(&self) -> ApplicationResult<ConditionTree> {
        let document =
            codec::parse_json_text(&self.json_buffer).map_err(|e| ApplicationError::invalid_json(&e))?;
        Ok(codec::deserialize(&document)?)
    }
}

/// Parse an event params object from JSON text.
pub fn parse_params(text: &str) -> ApplicationResult<BTreeMap<String, Value>> {
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(text).map_err(|e| ApplicationError::invalid_json(&e))
}
