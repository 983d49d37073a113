//! Domain layer: condition tree model and wire payloads
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod codec;
pub mod condition;
pub mod error;
pub mod path;
pub mod render;
pub mod rule;

pub use arena::{ConditionTree, LeafData, NodeId, NodeKind, TreeNode};
pub use codec::{deserialize, parse_json_text, serialize, to_json_text};
pub use condition::{Combinator, ConditionNode, Scalar};
pub use error::{DomainError, DomainResult};
pub use path::NodePath;
pub use render::TreeNodeConvert;
pub use rule::{
    Event, FactDescriptor, FactKind, NewFact, PredefinedFact, RuleDocument, RuleResult,
    RuleSummary, RunOutcome,
};
