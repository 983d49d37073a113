//! Conversion between a [`ConditionTree`] and its canonical JSON document.
//!
//! Groups serialize as `{"all": [...]}` / `{"any": [...]}`, leaves as
//! `{"fact", "operator", "value"}`. Unset leaves are skipped and leaf values
//! pass through [`Scalar::coerce`] on the way out; nothing is coerced on the
//! way in.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::domain::arena::{ConditionTree, LeafData, NodeId, NodeKind};
use crate::domain::condition::{Combinator, Scalar};
use crate::domain::error::{DomainError, DomainResult};

const LEAF_KEYS: [&str; 3] = ["fact", "operator", "value"];

/// Serialize the whole tree, pre-order.
#[instrument(level = "debug", skip(tree))]
pub fn serialize(tree: &ConditionTree) -> Value {
    serialize_node(tree, tree.root()).unwrap_or_else(|| empty_document(Combinator::All))
}

fn serialize_node(tree: &ConditionTree, id: NodeId) -> Option<Value> {
    match &tree.get(id)?.kind {
        NodeKind::Group {
            combinator,
            children,
        } => {
            let items: Vec<Value> = children
                .iter()
                .filter_map(|&child| serialize_node(tree, child))
                .collect();
            let mut map = Map::new();
            map.insert(combinator.key().to_string(), Value::Array(items));
            Some(Value::Object(map))
        }
        NodeKind::Leaf(leaf) if leaf.is_specified() => Some(leaf_to_json(leaf)),
        NodeKind::Leaf(_) => None,
    }
}

fn leaf_to_json(leaf: &LeafData) -> Value {
    let mut map = Map::new();
    map.insert("fact".into(), Value::String(leaf.fact.clone()));
    map.insert("operator".into(), Value::String(leaf.operator.clone()));
    map.insert("value".into(), leaf.value.to_json());
    Value::Object(map)
}

/// `{"<combinator>": []}`
pub fn empty_document(combinator: Combinator) -> Value {
    let mut map = Map::new();
    map.insert(combinator.key().to_string(), Value::Array(Vec::new()));
    Value::Object(map)
}

/// Rebuild a tree from a conditions document.
///
/// The root must be a group. Fact ids are taken as-is, including ones the
/// backend no longer knows about.
#[instrument(level = "debug", skip(document))]
pub fn deserialize(document: &Value) -> DomainResult<ConditionTree> {
    let (combinator, items) = match classify(document, "$")? {
        Shape::Group(combinator, items) => (combinator, items),
        Shape::Leaf(_) => return Err(DomainError::RootNotGroup),
    };

    let mut tree = ConditionTree::new(combinator);
    let root = tree.root();
    let mut stack: Vec<(NodeId, String, &Value)> = items
        .iter()
        .enumerate()
        .rev()
        .map(|(i, item)| (root, format!("$.{}[{}]", combinator, i), item))
        .collect();

    while let Some((parent, at, value)) = stack.pop() {
        match classify(value, &at)? {
            Shape::Group(combinator, items) => {
                let id = tree.add_group(parent, combinator)?;
                stack.extend(
                    items
                        .iter()
                        .enumerate()
                        .rev()
                        .map(|(i, item)| (id, format!("{}.{}[{}]", at, combinator, i), item)),
                );
            }
            Shape::Leaf(data) => {
                let id = tree.add_leaf(parent)?;
                tree.set_leaf(id, data)?;
            }
        }
    }
    debug!("deserialized {} node(s)", tree.len());
    Ok(tree)
}

enum Shape<'a> {
    Group(Combinator, &'a [Value]),
    Leaf(LeafData),
}

fn classify<'a>(value: &'a Value, at: &str) -> DomainResult<Shape<'a>> {
    let Value::Object(map) = value else {
        return Err(DomainError::InvalidShape {
            at: at.to_string(),
            reason: format!("expected an object, found {}", json_type(value)),
        });
    };

    let combinator = match (map.get("all"), map.get("any")) {
        (Some(_), Some(_)) => {
            return Err(DomainError::AmbiguousCombinator { at: at.to_string() })
        }
        (Some(items), None) => Some((Combinator::All, items)),
        (None, Some(items)) => Some((Combinator::Any, items)),
        (None, None) => None,
    };

    if let Some((combinator, items)) = combinator {
        return match items {
            Value::Array(items) => Ok(Shape::Group(combinator, items)),
            other => Err(DomainError::InvalidShape {
                at: at.to_string(),
                reason: format!("'{}' must be an array, found {}", combinator, json_type(other)),
            }),
        };
    }

    if !LEAF_KEYS.iter().any(|key| map.contains_key(*key)) {
        return Err(DomainError::UnrecognizedNode { at: at.to_string() });
    }

    Ok(Shape::Leaf(LeafData {
        fact: string_field(map, "fact", at)?,
        operator: string_field(map, "operator", at)?,
        value: match map.get("value") {
            None => Scalar::default(),
            Some(v) => Scalar::from_json(v).ok_or_else(|| DomainError::InvalidLeaf {
                at: at.to_string(),
                reason: format!("value must be a boolean, number or string, found {}", json_type(v)),
            })?,
        },
    }))
}

fn string_field(map: &Map<String, Value>, key: &str, at: &str) -> DomainResult<String> {
    match map.get(key) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(DomainError::InvalidLeaf {
            at: at.to_string(),
            reason: format!("'{}' must be a string, found {}", key, json_type(other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Pretty-print a document the way the JSON text buffer holds it.
pub fn to_json_text(document: &Value) -> String {
    serde_json::to_string_pretty(document).unwrap_or_else(|_| document.to_string())
}

/// Parse JSON text buffer contents.
pub fn parse_json_text(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text)
}
