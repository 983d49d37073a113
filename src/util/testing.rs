//! Test support: one-time tracing setup and condition tree fixtures.

use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{Combinator, ConditionTree, NodeId};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env::var("RULESDESK_TEST_LOG").unwrap_or_else(|_| "rulesdesk=debug".into())));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else if let Err(e) = subscriber.try_init() {
        eprintln!("Error: Failed to set up logging: {}", e);
    }
}

/// Append a fully specified leaf to `group` and return its id.
pub fn push_leaf(
    tree: &mut ConditionTree,
    group: NodeId,
    fact: &str,
    operator: &str,
    raw_value: &str,
) -> NodeId {
    let id = tree.add_leaf(group).expect("group accepts leaves");
    tree.set_fact(id, fact).expect("fresh leaf");
    tree.set_operator(id, operator).expect("fresh leaf");
    tree.set_value(id, raw_value).expect("fresh leaf");
    id
}

/// `age >= 18 AND (score < 50)` built through the builder operations.
pub fn adult_or_low_score() -> ConditionTree {
    let mut tree = ConditionTree::default();
    let root = tree.root();
    let age = push_leaf(&mut tree, root, "age", "greaterThanInclusive", "18");
    let group = tree
        .add_nested_group(age, Combinator::Any)
        .expect("leaf has a parent");
    push_leaf(&mut tree, group, "score", "lessThan", "50");
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
        init_test_setup();
    }

    #[test]
    fn test_fixture_shape() {
        let tree = adult_or_low_score();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.depth(), 3);
    }
}
