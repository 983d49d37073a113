//! Terminal projection of a condition tree.
//!
//! Each line carries the node path so builder commands can address it.

use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::{ConditionTree, NodeId, NodeKind};
use crate::domain::path::NodePath;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for ConditionTree {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(tree: &ConditionTree, id: NodeId, path: &mut Vec<usize>) -> Tree<String> {
            let label = node_label(tree, id, &NodePath::new(path.clone()));
            let mut node_tree = Tree::new(label);
            for (index, &child) in tree.children(id).iter().enumerate() {
                path.push(index);
                node_tree.push(build_tree(tree, child, path));
                path.pop();
            }
            node_tree
        }

        build_tree(self, self.root(), &mut Vec::new())
    }
}

fn node_label(tree: &ConditionTree, id: NodeId, path: &NodePath) -> String {
    match tree.get(id).map(|n| &n.kind) {
        Some(NodeKind::Group { combinator, .. }) => {
            format!("[{}] {}", path, combinator.label())
        }
        Some(NodeKind::Leaf(leaf)) if leaf.is_specified() => {
            format!("[{}] {} {} {}", path, leaf.fact, leaf.operator, leaf.value.coerce())
        }
        Some(NodeKind::Leaf(leaf)) => format!(
            "[{}] <unset> fact={} operator={} value={}",
            path,
            or_dash(&leaf.fact),
            or_dash(&leaf.operator),
            leaf.value
        ),
        None => format!("[{}] <missing>", path),
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::condition::Combinator;

    #[test]
    fn test_render_shows_paths_and_unset_leaves() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let leaf = tree.add_leaf(root).unwrap();
        tree.set_fact(leaf, "age").unwrap();
        tree.set_operator(leaf, "greaterThan").unwrap();
        tree.set_value(leaf, "18").unwrap();
        let group = tree.add_nested_group(leaf, Combinator::Any).unwrap();
        tree.add_leaf(group).unwrap();

        let rendered = tree.to_tree_string().to_string();
        assert!(rendered.contains("[/] ALL of these conditions (AND)"));
        assert!(rendered.contains("[0] age greaterThan 18"));
        assert!(rendered.contains("[1] ANY of these conditions (OR)"));
        assert!(rendered.contains("[1.0] <unset> fact=- operator=- value=\"\""));
    }

    #[test]
    fn test_render_is_stable_across_codec_round_trip() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let leaf = tree.add_leaf(root).unwrap();
        tree.set_fact(leaf, "name").unwrap();
        tree.set_operator(leaf, "equal").unwrap();
        tree.set_value(leaf, "bob").unwrap();
        let other = tree.add_leaf(root).unwrap();
        tree.set_fact(other, "vip").unwrap();
        tree.set_operator(other, "equal").unwrap();
        tree.set_value(other, "true").unwrap();

        let reloaded = crate::domain::codec::deserialize(&crate::domain::codec::serialize(&tree)).unwrap();

        assert_eq!(
            reloaded.to_tree_string().to_string(),
            tree.to_tree_string().to_string()
        );
    }
}
