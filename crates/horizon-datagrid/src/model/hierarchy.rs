//! Flattening a tree of items into grid rows.
//!
//! [`HierarchicalAdapter`] keeps its nodes in a `slotmap` arena and maintains
//! the pre-order sequence of visible nodes (`flat`). Expanding a node splices
//! its visible subtree in right after it; collapsing removes the contiguous
//! run of deeper nodes that follows it.
//!
//! With virtualized children, a collapse also drops the discarded subtree
//! from the arena. Which of its descendants were expanded is remembered as
//! child-position paths and replayed on the next expand.
//!
//! # Example
//!
//! ```
//! use horizon_datagrid::model::{HierarchicalAdapter, ItemSource};
//!
//! #[derive(Clone)]
//! struct Dir { name: &'static str, children: Vec<Dir> }
//!
//! let tree = Dir {
//!     name: "root",
//!     children: vec![
//!         Dir { name: "a", children: vec![] },
//!         Dir { name: "b", children: vec![] },
//!     ],
//! };
//!
//! let mut adapter = HierarchicalAdapter::new(|d: &Dir| Some(d.children.clone()));
//! adapter.set_root(tree);
//! assert_eq!(adapter.count(), 1);
//!
//! assert!(adapter.expand(0));
//! assert_eq!(adapter.count(), 3);
//! assert_eq!(adapter.node_at(2).map(|n| n.item.name), Some("b"));
//! ```

use std::fmt;
use std::sync::Arc;

use horizon_datagrid_core::Signal;
use horizon_datagrid_core::logging::targets;
use slotmap::{Key, KeyData, SlotMap, new_key_type};

use super::source::{CollectionChange, ItemId, ItemSource};

new_key_type! {
    /// Identity of a node in a [`HierarchicalAdapter`].
    ///
    /// Stable across expand/collapse; invalidated by `set_root`.
    pub struct NodeId;
}

/// A change to the flattened node sequence.
pub type FlatChange = CollectionChange;

type ChildrenSelector<T> = Arc<dyn Fn(&T) -> Option<Vec<T>> + Send + Sync>;
type LeafPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

struct NodeData<T> {
    item: T,
    parent: Option<NodeId>,
    level: usize,
    is_expanded: bool,
    is_leaf: bool,
    children: Option<Vec<NodeId>>,
    /// Expanded descendants discarded by a virtualized collapse.
    remembered: Vec<Vec<usize>>,
}

/// Read view of a node.
#[derive(Debug)]
pub struct HierarchicalNode<'a, T> {
    /// Node identity.
    pub id: NodeId,
    /// The wrapped domain item.
    pub item: &'a T,
    /// Parent node, `None` for roots.
    pub parent: Option<NodeId>,
    /// Depth, 0 for roots.
    pub level: usize,
    /// Whether the node's children are shown.
    pub is_expanded: bool,
    /// Whether the node has no children.
    pub is_leaf: bool,
    /// Whether the children have been computed.
    pub children_materialized: bool,
}

/// Expand/collapse and parent/child stepping over a flattened hierarchy.
///
/// Indices are flat row indices.
pub trait TreeNavigation {
    /// Depth of the row, or `None` if out of range.
    fn level(&self, index: usize) -> Option<usize>;

    /// Returns true if the row can have children.
    fn is_expandable(&self, index: usize) -> bool;

    /// Returns true if the row's children are shown.
    fn is_expanded(&self, index: usize) -> bool;

    /// Expand the row. Returns false if nothing changed.
    fn expand(&mut self, index: usize) -> bool;

    /// Collapse the row. Returns false if nothing changed.
    fn collapse(&mut self, index: usize) -> bool;

    /// Flat index of the row's parent.
    fn parent_index(&self, index: usize) -> Option<usize>;

    /// Flat index of the row's first child, if expanded and non-empty.
    fn first_child_index(&self, index: usize) -> Option<usize>;
}

/// Presents a tree of items as a flat, indexable sequence.
pub struct HierarchicalAdapter<T> {
    nodes: SlotMap<NodeId, NodeData<T>>,
    roots: Vec<NodeId>,
    flat: Vec<NodeId>,
    children_selector: ChildrenSelector<T>,
    leaf_predicate: Option<LeafPredicate<T>>,
    virtualize_children: bool,
    changes: Vec<FlatChange>,
    /// Emitted after every change to the flattened sequence.
    pub flat_changed: Signal<FlatChange>,
}

impl<T> HierarchicalAdapter<T> {
    /// Create an empty adapter.
    ///
    /// `children_selector` returns the children of an item. Returning `None`
    /// or an empty list marks the item as a leaf unless a leaf predicate is
    /// set. With virtualized children and no predicate the selector is not
    /// called until a node is first expanded, so every node starts out
    /// expandable and a childless one turns into a leaf on that expand.
    pub fn new<F>(children_selector: F) -> Self
    where
        F: Fn(&T) -> Option<Vec<T>> + Send + Sync + 'static,
    {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            flat: Vec::new(),
            children_selector: Arc::new(children_selector),
            leaf_predicate: None,
            virtualize_children: false,
            changes: Vec::new(),
            flat_changed: Signal::new(),
        }
    }

    /// Use `predicate` instead of the children selector to decide leaves.
    ///
    /// Applies to nodes created afterwards.
    pub fn with_leaf_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.leaf_predicate = Some(Arc::new(predicate));
        self
    }

    /// Builder form of [`set_virtualize_children`](Self::set_virtualize_children).
    pub fn with_virtualized_children(mut self, virtualize: bool) -> Self {
        self.virtualize_children = virtualize;
        self
    }

    /// Discard children on collapse and recompute them on expand.
    pub fn set_virtualize_children(&mut self, virtualize: bool) {
        self.virtualize_children = virtualize;
    }

    /// Returns true if children are discarded on collapse.
    pub fn is_virtualizing_children(&self) -> bool {
        self.virtualize_children
    }

    /// Replace the tree with a single root.
    pub fn set_root(&mut self, item: T) {
        self.set_roots(vec![item]);
    }

    /// Replace the tree with the given roots.
    pub fn set_roots(&mut self, items: Vec<T>) {
        self.nodes.clear();
        let roots: Vec<NodeId> = items
            .into_iter()
            .map(|item| self.create_node(item, None, 0))
            .collect();
        self.roots = roots;
        self.flat = self.roots.clone();
        tracing::debug!(target: targets::HIERARCHY, roots = self.roots.len(), "tree reset");
        self.record(FlatChange::Reset);
    }

    /// Number of visible nodes.
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    /// Returns true if no node is visible.
    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Identities of the root nodes.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The node shown at `index`.
    pub fn node_at(&self, index: usize) -> Option<HierarchicalNode<'_, T>> {
        self.flat.get(index).and_then(|&id| self.node(id))
    }

    /// The node with identity `id`, visible or not.
    pub fn node(&self, id: NodeId) -> Option<HierarchicalNode<'_, T>> {
        self.nodes.get(id).map(|data| HierarchicalNode {
            id,
            item: &data.item,
            parent: data.parent,
            level: data.level,
            is_expanded: data.is_expanded,
            is_leaf: data.is_leaf,
            children_materialized: data.children.is_some(),
        })
    }

    /// Flat index of `id`, or `None` if it is hidden or unknown.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        self.flat.iter().position(|&node| node == id)
    }

    /// Show the children of the node at `index`.
    ///
    /// Returns false for leaves, already expanded nodes and out-of-range
    /// indices.
    pub fn expand(&mut self, index: usize) -> bool {
        let Some(&id) = self.flat.get(index) else {
            return false;
        };
        match self.nodes.get(id) {
            Some(node) if !node.is_leaf && !node.is_expanded => {}
            _ => return false,
        }

        self.materialize(id);
        let remembered = match self.nodes.get_mut(id) {
            Some(node) if node.is_leaf => return false,
            Some(node) => {
                node.is_expanded = true;
                std::mem::take(&mut node.remembered)
            }
            None => return false,
        };
        for path in &remembered {
            self.restore_path(id, path);
        }

        let mut visible = Vec::new();
        self.collect_visible(id, &mut visible);
        let count = visible.len();
        let at = index + 1;
        self.flat.splice(at..at, visible);

        tracing::debug!(target: targets::HIERARCHY, index, count, "expanded node");
        if count > 0 {
            self.record(FlatChange::Inserted { index: at, count });
        }
        true
    }

    /// Hide the children of the node at `index`.
    ///
    /// Returns false if the node is not expanded or out of range.
    pub fn collapse(&mut self, index: usize) -> bool {
        let Some(&id) = self.flat.get(index) else {
            return false;
        };
        let level = match self.nodes.get(id) {
            Some(node) if node.is_expanded => node.level,
            _ => return false,
        };

        let start = index + 1;
        let count = self.flat[start..]
            .iter()
            .take_while(|&&node| self.nodes.get(node).is_some_and(|n| n.level > level))
            .count();
        self.flat.drain(start..start + count);

        if self.virtualize_children {
            let mut remembered = Vec::new();
            self.collect_expanded_paths(id, &mut Vec::new(), &mut remembered);
            self.discard_children(id);
            if let Some(node) = self.nodes.get_mut(id) {
                node.remembered = remembered;
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.is_expanded = false;
        }

        tracing::debug!(target: targets::HIERARCHY, index, count, "collapsed node");
        if count > 0 {
            self.record(FlatChange::Removed { index: start, count });
        }
        true
    }

    /// Flat index of the parent of the node at `index`.
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        let level = self.level_at(index)?;
        if level == 0 {
            return None;
        }
        (0..index)
            .rev()
            .find(|&i| self.level_at(i).is_some_and(|l| l < level))
    }

    /// Flat index of the first child of the node at `index`.
    pub fn first_child_index(&self, index: usize) -> Option<usize> {
        let level = self.level_at(index)?;
        let expanded = self.flat.get(index).and_then(|&id| self.nodes.get(id))?.is_expanded;
        (expanded && self.level_at(index + 1) == Some(level + 1)).then_some(index + 1)
    }

    /// Expand every node, materializing the whole tree.
    pub fn expand_all(&mut self) {
        let mut index = 0;
        while index < self.flat.len() {
            self.expand(index);
            index += 1;
        }
    }

    /// Collapse every node, including hidden ones.
    pub fn collapse_all(&mut self) {
        for index in (0..self.flat.len()).rev() {
            self.collapse(index);
        }
        for node in self.nodes.values_mut() {
            node.is_expanded = false;
            node.remembered.clear();
        }
    }

    fn level_at(&self, index: usize) -> Option<usize> {
        self.flat
            .get(index)
            .and_then(|&id| self.nodes.get(id))
            .map(|node| node.level)
    }

    fn create_node(&mut self, item: T, parent: Option<NodeId>, level: usize) -> NodeId {
        let is_leaf = match &self.leaf_predicate {
            Some(predicate) => predicate(&item),
            None if self.virtualize_children => false,
            None => (self.children_selector)(&item).is_none_or(|children| children.is_empty()),
        };
        self.nodes.insert(NodeData {
            item,
            parent,
            level,
            is_expanded: false,
            is_leaf,
            children: None,
            remembered: Vec::new(),
        })
    }

    fn materialize(&mut self, id: NodeId) {
        let (items, level) = match self.nodes.get(id) {
            Some(node) if node.children.is_none() => (
                (self.children_selector)(&node.item).unwrap_or_default(),
                node.level,
            ),
            _ => return,
        };
        let children: Vec<NodeId> = items
            .into_iter()
            .map(|item| self.create_node(item, Some(id), level + 1))
            .collect();
        tracing::trace!(target: targets::HIERARCHY, count = children.len(), "materialized children");
        let childless = children.is_empty() && self.leaf_predicate.is_none();
        if let Some(node) = self.nodes.get_mut(id) {
            node.children = Some(children);
            node.is_leaf |= childless;
        }
    }

    fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .and_then(|node| node.children.as_deref())
            .unwrap_or(&[])
    }

    /// Pre-order list of the nodes shown beneath an expanded node.
    fn collect_visible(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children_of(id) {
            out.push(child);
            if self.nodes.get(child).is_some_and(|node| node.is_expanded) {
                self.collect_visible(child, out);
            }
        }
    }

    fn collect_expanded_paths(&self, id: NodeId, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        for (position, &child) in self.children_of(id).iter().enumerate() {
            let Some(node) = self.nodes.get(child) else {
                continue;
            };
            prefix.push(position);
            if node.is_expanded {
                out.push(prefix.clone());
            }
            for nested in &node.remembered {
                let mut path = prefix.clone();
                path.extend_from_slice(nested);
                out.push(path);
            }
            self.collect_expanded_paths(child, prefix, out);
            prefix.pop();
        }
    }

    fn restore_path(&mut self, id: NodeId, path: &[usize]) {
        let mut current = id;
        for &position in path {
            self.materialize(current);
            match self.children_of(current).get(position) {
                Some(&child) => current = child,
                None => return,
            }
        }
        self.materialize(current);
        if let Some(node) = self.nodes.get_mut(current)
            && !node.is_leaf
        {
            node.is_expanded = true;
        }
    }

    fn discard_children(&mut self, id: NodeId) {
        let children = self
            .nodes
            .get_mut(id)
            .and_then(|node| node.children.take())
            .unwrap_or_default();
        for child in children {
            self.discard_children(child);
            self.nodes.remove(child);
        }
    }

    fn record(&mut self, change: FlatChange) {
        self.changes.push(change.clone());
        self.flat_changed.emit(change);
    }
}

impl<T> TreeNavigation for HierarchicalAdapter<T> {
    fn level(&self, index: usize) -> Option<usize> {
        self.level_at(index)
    }

    fn is_expandable(&self, index: usize) -> bool {
        self.node_at(index).is_some_and(|node| !node.is_leaf)
    }

    fn is_expanded(&self, index: usize) -> bool {
        self.node_at(index).is_some_and(|node| node.is_expanded)
    }

    fn expand(&mut self, index: usize) -> bool {
        HierarchicalAdapter::expand(self, index)
    }

    fn collapse(&mut self, index: usize) -> bool {
        HierarchicalAdapter::collapse(self, index)
    }

    fn parent_index(&self, index: usize) -> Option<usize> {
        HierarchicalAdapter::parent_index(self, index)
    }

    fn first_child_index(&self, index: usize) -> Option<usize> {
        HierarchicalAdapter::first_child_index(self, index)
    }
}

impl<T> ItemSource for HierarchicalAdapter<T> {
    type Item = T;

    fn count(&self) -> usize {
        self.flat.len()
    }

    fn item(&self, index: usize) -> Option<&T> {
        self.flat
            .get(index)
            .and_then(|&id| self.nodes.get(id))
            .map(|node| &node.item)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut T> {
        let id = *self.flat.get(index)?;
        self.nodes.get_mut(id).map(|node| &mut node.item)
    }

    fn item_id(&self, index: usize) -> Option<ItemId> {
        self.flat.get(index).map(|id| ItemId::new(id.data().as_ffi()))
    }

    fn index_of(&self, id: ItemId) -> Option<usize> {
        HierarchicalAdapter::index_of(self, NodeId::from(KeyData::from_ffi(id.as_u64())))
    }

    fn take_changes(&mut self) -> Vec<CollectionChange> {
        std::mem::take(&mut self.changes)
    }

    fn supports_nesting(&self) -> bool {
        true
    }

    fn as_tree(&self) -> Option<&dyn TreeNavigation> {
        Some(self)
    }

    fn as_tree_mut(&mut self) -> Option<&mut dyn TreeNavigation> {
        Some(self)
    }
}

impl<T> fmt::Debug for HierarchicalAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchicalAdapter")
            .field("nodes", &self.nodes.len())
            .field("visible", &self.flat.len())
            .field("virtualize_children", &self.virtualize_children)
            .finish()
    }
}
