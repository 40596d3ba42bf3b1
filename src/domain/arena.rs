use std::collections::VecDeque;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::BomNode;

/// Data payload for hierarchy nodes: one BOM item without its children.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub item_no: String,
    pub cost: f64,
    pub level: u32,
    pub description: Option<String>,
}

impl NodeData {
    pub fn is_root_level(&self) -> bool {
        self.level == 0
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.item_no, crate::domain::format_cost(self.cost))
    }
}

impl From<&BomNode> for NodeData {
    fn from(node: &BomNode) -> Self {
        Self {
            item_no: node.item_no.clone(),
            cost: node.cost,
            level: node.level,
            description: node.description.clone(),
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Tree node in the arena-based hierarchy.
#[derive(Debug)]
pub struct TreeNode {
    /// BOM item carried by this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in BOM line order
    pub children: Vec<Index>,
    /// Distance from the root (root = 0)
    pub depth: usize,
    /// Position among the parent's children
    pub sibling_index: usize,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Arena-based hierarchy of one BOM.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Built fresh for every render and dropped afterwards.
#[derive(Debug)]
pub struct BomArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for BomArena {
    fn default() -> Self {
        Self::new()
    }
}

impl BomArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Build the hierarchy of a decoded BOM tree.
    ///
    /// Children are taken in order; an empty children list makes a leaf.
    #[instrument(level = "debug", skip(tree), fields(root = %tree.item_no))]
    pub fn from_tree(tree: &BomNode) -> Self {
        let mut arena = Self::new();
        let mut stack = vec![(tree, None)];

        while let Some((node, parent_idx)) = stack.pop() {
            let idx = arena.insert_node(NodeData::from(node), parent_idx);
            // Reverse so that children are inserted (and linked) in source order
            for child in node.children.iter().rev() {
                stack.push((child, Some(idx)));
            }
        }

        arena
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let (depth, sibling_index) = match parent.and_then(|p| self.arena.get(p)) {
            Some(p) => (p.depth + 1, p.children.len()),
            None => (0, 0),
        };
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
            depth,
            sibling_index,
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal, children left to right.
    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    /// Level-by-level traversal, the order nodes are drawn in.
    pub fn iter_breadth_first(&self) -> BreadthFirstIterator {
        BreadthFirstIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    /// Number of levels in the hierarchy (1 for a lone root, 0 when empty).
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, node)| node.depth + 1).max().unwrap_or(0)
    }

    /// Largest node depth, 0 for a lone root.
    pub fn max_depth(&self) -> usize {
        self.depth().saturating_sub(1)
    }

    /// Item numbers of all leaf nodes, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| !node.has_children())
            .map(|(_, node)| node.data.item_no.clone())
            .collect()
    }

    /// Parent-child pairs, one per non-root node, in breadth-first order.
    pub fn links(&self) -> Vec<(Index, Index)> {
        self.iter_breadth_first()
            .filter_map(|(idx, node)| node.parent.map(|p| (p, idx)))
            .collect()
    }

    /// Nodes flagged as root by their `level` field.
    pub fn root_level_count(&self) -> usize {
        self.arena
            .iter()
            .filter(|(_, node)| node.data.is_root_level())
            .count()
    }

    /// Nodes whose `level` disagrees with their position in the hierarchy.
    pub fn level_mismatches(&self) -> Vec<Index> {
        self.iter()
            .filter(|(_, node)| node.data.level as usize != node.depth)
            .map(|(idx, _)| idx)
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a BomArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a BomArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct BreadthFirstIterator<'a> {
    arena: &'a BomArena,
    queue: VecDeque<Index>,
}

impl<'a> BreadthFirstIterator<'a> {
    fn new(arena: &'a BomArena) -> Self {
        let mut queue = VecDeque::new();
        if let Some(root) = arena.root() {
            queue.push_back(root);
        }
        Self { arena, queue }
    }
}

impl<'a> Iterator for BreadthFirstIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.queue.pop_front() {
            if let Some(node) = self.arena.get_node(current_idx) {
                self.queue.extend(node.children.iter().copied());
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a BomArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a BomArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
