/*
Conversion of hierarchies into termtree::Tree for terminal display.

Labels carry the same "<item_no> ($<cost>)" text as the rendered diagram.
 */
use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::BomArena;
use crate::domain::entities::BomNode;

pub trait TreeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeConvert for BomNode {
    #[instrument(level = "trace", skip(self), fields(item_no = %self.item_no))]
    fn to_tree_string(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children.iter().map(|c| c.to_tree_string()).collect();
        Tree::new(self.label()).with_leaves(leaves)
    }
}

impl TreeConvert for BomArena {
    fn to_tree_string(&self) -> Tree<String> {
        let Some(root_idx) = self.root() else {
            return Tree::new("Empty tree".to_string());
        };

        fn build_tree(arena: &BomArena, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = arena.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = arena.get_node(child_idx) {
                        let mut child_tree = Tree::new(child.data.label());
                        build_tree(arena, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        let label = self
            .get_node(root_idx)
            .map(|n| n.data.label())
            .unwrap_or_default();
        let mut tree = Tree::new(label);
        build_tree(self, root_idx, &mut tree);
        tree
    }
}
