//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the [`RulesApi`](crate::infrastructure::traits::RulesApi)
//! boundary trait but are themselves concrete structs, not traits.

mod catalog;
mod rules;

pub use catalog::CatalogService;
pub use rules::RuleService;
