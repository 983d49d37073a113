//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{CatalogService, RuleService};
use crate::config::Settings;
use crate::infrastructure::http::HttpRulesApi;
use crate::infrastructure::traits::RulesApi;
use crate::infrastructure::InfraResult;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Management service backend
    pub api: Arc<dyn RulesApi>,

    pub catalog: CatalogService,
    pub rules: RuleService,
}

impl ServiceContainer {
    /// Create a new service container talking HTTP to `settings.api_url`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let api = Arc::new(HttpRulesApi::new(&settings.api_url)?);
        Ok(Self::with_deps(settings, api))
    }

    /// Create a service container with a custom backend (for testing).
    pub fn with_deps(settings: Settings, api: Arc<dyn RulesApi>) -> Self {
        let settings = Arc::new(settings);
        let catalog = CatalogService::new(Arc::clone(&api));
        let rules = RuleService::new(Arc::clone(&api));

        Self {
            settings,
            api,
            catalog,
            rules,
        }
    }
}
