//! Arena-backed condition tree.
//!
//! Groups and leaves live in a generational arena; each node records its
//! parent and groups keep an ordered list of children. The root is always a
//! group and can never be removed.

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::condition::{Combinator, ConditionNode, Scalar};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::path::NodePath;

/// Handle to a node in a [`ConditionTree`].
pub type NodeId = Index;

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group {
        combinator: Combinator,
        children: Vec<NodeId>,
    },
    Leaf(LeafData),
}

/// A single fact/operator/value predicate.
///
/// Freshly added leaves are unset: empty fact, empty operator, empty value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeafData {
    pub fact: String,
    pub operator: String,
    pub value: Scalar,
}

impl LeafData {
    /// A leaf takes part in serialization only once fact and operator are chosen.
    pub fn is_specified(&self) -> bool {
        !self.fact.is_empty() && !self.operator.is_empty()
    }
}

/// Tree node in the arena.
#[derive(Debug)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// None for the root group
    pub parent: Option<NodeId>,
}

impl TreeNode {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Group { children, .. } => children,
            NodeKind::Leaf(_) => &[],
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafData> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Group { .. } => None,
        }
    }

    pub fn combinator(&self) -> Option<Combinator> {
        match &self.kind {
            NodeKind::Group { combinator, .. } => Some(*combinator),
            NodeKind::Leaf(_) => None,
        }
    }
}

/// Mutable condition tree with a permanent root group.
#[derive(Debug)]
pub struct ConditionTree {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Default for ConditionTree {
    fn default() -> Self {
        Self::new(Combinator::All)
    }
}

impl ConditionTree {
    /// Create a tree holding a single empty root group.
    pub fn new(combinator: Combinator) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            kind: NodeKind::Group {
                combinator,
                children: Vec::new(),
            },
            parent: None,
        });
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// A tree is empty when its root group has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena.get(id).map(TreeNode::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    pub fn leaf(&self, id: NodeId) -> DomainResult<&LeafData> {
        self.node(id)?
            .as_leaf()
            .ok_or_else(|| DomainError::NotALeaf(format!("{:?}", id)))
    }

    /// Append an unset leaf to the end of `group`'s children.
    #[instrument(level = "debug", skip(self))]
    pub fn add_leaf(&mut self, group: NodeId) -> DomainResult<NodeId> {
        self.insert_child(group, None, NodeKind::Leaf(LeafData::default()))
    }

    /// Append an empty group to the end of `group`'s children.
    #[instrument(level = "debug", skip(self))]
    pub fn add_group(&mut self, group: NodeId, combinator: Combinator) -> DomainResult<NodeId> {
        self.insert_child(group, None, empty_group(combinator))
    }

    /// Insert an empty group as the sibling immediately after `after`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_nested_group(
        &mut self,
        after: NodeId,
        combinator: Combinator,
    ) -> DomainResult<NodeId> {
        let parent = self
            .node(after)?
            .parent
            .ok_or(DomainError::RootImmutable("given a sibling"))?;
        let position = self
            .children(parent)
            .iter()
            .position(|&c| c == after)
            .map(|p| p + 1)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", after)))?;
        self.insert_child(parent, Some(position), empty_group(combinator))
    }

    /// Remove `id` and its whole subtree.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_node(&mut self, id: NodeId) -> DomainResult<()> {
        let parent = self
            .node(id)?
            .parent
            .ok_or(DomainError::RootImmutable("removed"))?;

        if let Some(NodeKind::Group { children, .. }) =
            self.arena.get_mut(parent).map(|p| &mut p.kind)
        {
            children.retain(|&c| c != id);
        }

        let mut stack = vec![id];
        let mut removed = 0usize;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                if let NodeKind::Group { children, .. } = node.kind {
                    stack.extend(children);
                }
                removed += 1;
            }
        }
        debug!("removed {} node(s)", removed);
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn set_combinator(&mut self, group: NodeId, combinator: Combinator) -> DomainResult<()> {
        match &mut self.node_mut(group)?.kind {
            NodeKind::Group { combinator: c, .. } => {
                *c = combinator;
                Ok(())
            }
            NodeKind::Leaf(_) => Err(DomainError::NotAGroup(format!("{:?}", group))),
        }
    }

    pub fn set_fact(&mut self, leaf: NodeId, fact: impl Into<String>) -> DomainResult<()> {
        self.leaf_mut(leaf)?.fact = fact.into();
        Ok(())
    }

    pub fn set_operator(&mut self, leaf: NodeId, operator: impl Into<String>) -> DomainResult<()> {
        self.leaf_mut(leaf)?.operator = operator.into();
        Ok(())
    }

    /// Set the raw input value; coercion happens on serialization.
    pub fn set_value(&mut self, leaf: NodeId, raw: impl Into<String>) -> DomainResult<()> {
        self.leaf_mut(leaf)?.value = Scalar::text(raw);
        Ok(())
    }

    pub fn set_leaf(&mut self, leaf: NodeId, data: LeafData) -> DomainResult<()> {
        *self.leaf_mut(leaf)? = data;
        Ok(())
    }

    /// Resolve a dotted child-index path from the root.
    pub fn resolve(&self, path: &NodePath) -> DomainResult<NodeId> {
        let mut current = self.root;
        for (depth, &index) in path.indices().iter().enumerate() {
            let node = self.node(current)?;
            if !node.is_group() {
                return Err(DomainError::InvalidPath {
                    path: path.to_string(),
                    reason: format!("segment {} descends into a condition", depth),
                });
            }
            current = *node.children().get(index).ok_or_else(|| DomainError::InvalidPath {
                path: path.to_string(),
                reason: format!("no child {} at depth {}", index, depth),
            })?;
        }
        Ok(current)
    }

    /// Path of `id` relative to the root.
    pub fn path_of(&self, id: NodeId) -> DomainResult<NodePath> {
        let mut indices = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current)?.parent {
            let index = self
                .children(parent)
                .iter()
                .position(|&c| c == current)
                .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", current)))?;
            indices.push(index);
            current = parent;
        }
        indices.reverse();
        Ok(NodePath::new(indices))
    }

    /// Maximum nesting depth; a lone root has depth 1.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, id: NodeId) -> usize {
        1 + self
            .children(id)
            .iter()
            .map(|&child| self.calculate_depth(child))
            .max()
            .unwrap_or(0)
    }

    /// Depth-first, pre-order traversal yielding `(id, node, depth)`.
    pub fn iter(&self) -> PreOrderIterator<'_> {
        PreOrderIterator {
            tree: self,
            stack: vec![(self.root, 0)],
        }
    }

    /// Owned structural copy.
    pub fn snapshot(&self) -> ConditionNode {
        self.snapshot_node(self.root)
    }

    fn snapshot_node(&self, id: NodeId) -> ConditionNode {
        match self.arena.get(id).map(|n| &n.kind) {
            Some(NodeKind::Group {
                combinator,
                children,
            }) => ConditionNode::group(
                *combinator,
                children.iter().map(|&c| self.snapshot_node(c)).collect(),
            ),
            Some(NodeKind::Leaf(leaf)) => {
                ConditionNode::leaf(leaf.fact.clone(), leaf.operator.clone(), leaf.value.clone())
            }
            None => ConditionNode::group(Combinator::All, Vec::new()),
        }
    }

    /// Build a tree from a snapshot whose root is a group.
    pub fn from_snapshot(node: &ConditionNode) -> DomainResult<Self> {
        let ConditionNode::Group {
            combinator,
            children,
        } = node
        else {
            return Err(DomainError::RootNotGroup);
        };
        let mut tree = Self::new(*combinator);
        let root = tree.root;
        let mut stack: Vec<(NodeId, &ConditionNode)> =
            children.iter().rev().map(|c| (root, c)).collect();
        while let Some((parent, child)) = stack.pop() {
            match child {
                ConditionNode::Group {
                    combinator,
                    children,
                } => {
                    let id = tree.add_group(parent, *combinator)?;
                    stack.extend(children.iter().rev().map(|c| (id, c)));
                }
                ConditionNode::Leaf {
                    fact,
                    operator,
                    value,
                } => {
                    let id = tree.add_leaf(parent)?;
                    tree.set_leaf(
                        id,
                        LeafData {
                            fact: fact.clone(),
                            operator: operator.clone(),
                            value: value.clone(),
                        },
                    )?;
                }
            }
        }
        Ok(tree)
    }

    fn node(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.arena
            .get(id)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", id)))
    }

    fn node_mut(&mut self, id: NodeId) -> DomainResult<&mut TreeNode> {
        self.arena
            .get_mut(id)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", id)))
    }

    fn leaf_mut(&mut self, id: NodeId) -> DomainResult<&mut LeafData> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Leaf(leaf) => Ok(leaf),
            NodeKind::Group { .. } => Err(DomainError::NotALeaf(format!("{:?}", id))),
        }
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        position: Option<usize>,
        kind: NodeKind,
    ) -> DomainResult<NodeId> {
        if !self.node(parent)?.is_group() {
            return Err(DomainError::NotAGroup(format!("{:?}", parent)));
        }
        let id = self.arena.insert(TreeNode {
            kind,
            parent: Some(parent),
        });
        if let Some(NodeKind::Group { children, .. }) =
            self.arena.get_mut(parent).map(|p| &mut p.kind)
        {
            match position {
                Some(pos) if pos <= children.len() => children.insert(pos, id),
                _ => children.push(id),
            }
        }
        Ok(id)
    }
}

fn empty_group(combinator: Combinator) -> NodeKind {
    NodeKind::Group {
        combinator,
        children: Vec::new(),
    }
}

pub struct PreOrderIterator<'a> {
    tree: &'a ConditionTree,
    stack: Vec<(NodeId, usize)>,
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, depth)) = self.stack.pop() {
            if let Some(node) = self.tree.get(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children().iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((current, node, depth));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(tree: &mut ConditionTree, group: NodeId, fact: &str, op: &str, raw: &str) -> NodeId {
        let id = tree.add_leaf(group).unwrap();
        tree.set_fact(id, fact).unwrap();
        tree.set_operator(id, op).unwrap();
        tree.set_value(id, raw).unwrap();
        id
    }

    #[test]
    fn test_new_tree_has_single_empty_root() {
        let tree = ConditionTree::default();
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
        assert_eq!(tree.get(tree.root()).unwrap().combinator(), Some(Combinator::All));
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_add_leaf_appends_unset_placeholder() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let leaf = tree.add_leaf(root).unwrap();
        assert_eq!(tree.children(root), &[leaf]);
        let data = tree.leaf(leaf).unwrap();
        assert!(!data.is_specified());
        assert_eq!(data.value, Scalar::text(""));
    }

    #[test]
    fn test_add_leaf_into_leaf_fails() {
        let mut tree = ConditionTree::default();
        let leaf = tree.add_leaf(tree.root()).unwrap();
        assert!(matches!(tree.add_leaf(leaf), Err(DomainError::NotAGroup(_))));
    }

    #[test]
    fn test_nested_group_is_inserted_right_after_sibling() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let a = filled(&mut tree, root, "a", "equal", "1");
        let b = filled(&mut tree, root, "b", "equal", "2");
        let group = tree.add_nested_group(a, Combinator::Any).unwrap();
        assert_eq!(tree.children(root), &[a, group, b]);
        assert_eq!(tree.parent(group), Some(root));
    }

    #[test]
    fn test_nested_group_after_root_is_rejected() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        assert!(matches!(
            tree.add_nested_group(root, Combinator::All),
            Err(DomainError::RootImmutable(_))
        ));
    }

    #[test]
    fn test_remove_group_removes_subtree() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let a = filled(&mut tree, root, "a", "equal", "1");
        let group = tree.add_nested_group(a, Combinator::Any).unwrap();
        let inner = filled(&mut tree, group, "b", "equal", "2");
        tree.add_group(group, Combinator::All).unwrap();
        assert_eq!(tree.len(), 5);

        tree.remove_node(group).unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.children(root), &[a]);
        assert!(tree.get(inner).is_none());
    }

    #[test]
    fn test_remove_root_is_rejected() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        assert!(matches!(
            tree.remove_node(root),
            Err(DomainError::RootImmutable(_))
        ));
        assert!(tree.get(root).is_some());
    }

    #[test]
    fn test_stale_id_after_remove_is_not_found() {
        let mut tree = ConditionTree::default();
        let leaf = tree.add_leaf(tree.root()).unwrap();
        tree.remove_node(leaf).unwrap();
        assert!(matches!(
            tree.set_fact(leaf, "x"),
            Err(DomainError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_and_path_of_agree() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let a = filled(&mut tree, root, "a", "equal", "1");
        let group = tree.add_nested_group(a, Combinator::Any).unwrap();
        let inner = filled(&mut tree, group, "b", "equal", "2");

        let path = tree.path_of(inner).unwrap();
        assert_eq!(path.to_string(), "1.0");
        assert_eq!(tree.resolve(&path).unwrap(), inner);
        assert_eq!(tree.resolve(&NodePath::root()).unwrap(), root);
    }

    #[test]
    fn test_resolve_through_leaf_fails() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        filled(&mut tree, root, "a", "equal", "1");
        let err = tree.resolve(&"0.0".parse().unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidPath { .. }));
    }

    #[test]
    fn test_preorder_iteration_order() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let a = filled(&mut tree, root, "a", "equal", "1");
        let group = tree.add_nested_group(a, Combinator::Any).unwrap();
        filled(&mut tree, group, "b", "equal", "2");
        filled(&mut tree, root, "c", "equal", "3");

        let facts: Vec<_> = tree
            .iter()
            .map(|(_, node, depth)| match node.as_leaf() {
                Some(leaf) => format!("{}@{}", leaf.fact, depth),
                None => format!("{}@{}", node.combinator().unwrap(), depth),
            })
            .collect();
        assert_eq!(facts, vec!["all@0", "a@1", "any@1", "b@2", "c@1"]);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut tree = ConditionTree::default();
        let root = tree.root();
        let a = filled(&mut tree, root, "a", "equal", "1");
        let group = tree.add_nested_group(a, Combinator::Any).unwrap();
        filled(&mut tree, group, "b", "lessThan", "2");

        let snapshot = tree.snapshot();
        let rebuilt = ConditionTree::from_snapshot(&snapshot).unwrap();
        assert_eq!(rebuilt.snapshot(), snapshot);
    }

    #[test]
    fn test_set_combinator_on_leaf_fails() {
        let mut tree = ConditionTree::default();
        let leaf = tree.add_leaf(tree.root()).unwrap();
        assert!(tree.set_combinator(leaf, Combinator::Any).is_err());
        tree.set_combinator(tree.root(), Combinator::Any).unwrap();
        assert_eq!(
            tree.get(tree.root()).unwrap().combinator(),
            Some(Combinator::Any)
        );
    }
}
