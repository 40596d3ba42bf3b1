//! Tidy tree layout (Buchheim et al. improvement of Walker's algorithm).
//!
//! Assigns every hierarchy node a breadth coordinate `x` and a depth
//! coordinate `y`, then scales both into a `[breadth, depth_extent]` box:
//! - siblings are one unit apart, cousins two units
//! - a parent sits centered over its first and last child
//! - `y = depth * depth_extent / max_depth`
//!
//! The output is consumed by the renderer with the axes swapped, so trees
//! grow left to right.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::BomArena;

/// Laid-out position of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Breadth coordinate, in `[0, breadth]`
    pub x: f64,
    /// Depth coordinate, in `[0, depth_extent]`
    pub y: f64,
}

/// Positions for every node of a hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    positions: HashMap<Index, Position>,
}

impl Layout {
    pub fn position(&self, idx: Index) -> Option<Position> {
        self.positions.get(&idx).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Tree layout sized to a fixed box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeLayout {
    breadth: f64,
    depth_extent: f64,
}

/// Working record of one node during the two walks.
#[derive(Debug, Clone)]
struct Walker {
    node: Option<Index>,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Position among siblings
    number: usize,
    depth: usize,
    ancestor: usize,
    /// Default ancestor handed down during apportion
    default_ancestor: Option<usize>,
    thread: Option<usize>,
    prelim: f64,
    modifier: f64,
    change: f64,
    shift: f64,
    x: f64,
}

impl Walker {
    fn new(node: Option<Index>, parent: Option<usize>, number: usize, depth: usize, me: usize) -> Self {
        Self {
            node,
            parent,
            children: Vec::new(),
            number,
            depth,
            ancestor: me,
            default_ancestor: None,
            thread: None,
            prelim: 0.0,
            modifier: 0.0,
            change: 0.0,
            shift: 0.0,
            x: 0.0,
        }
    }
}

impl TreeLayout {
    /// `breadth` spans siblings, `depth_extent` spans root to deepest level.
    pub fn new(breadth: f64, depth_extent: f64) -> Self {
        Self {
            breadth,
            depth_extent,
        }
    }

    /// Compute positions for all nodes of `arena`.
    #[instrument(level = "debug", skip(self, arena), fields(nodes = arena.len()))]
    pub fn apply(&self, arena: &BomArena) -> Layout {
        let Some(root) = arena.root() else {
            return Layout::default();
        };

        let mut w = build_walkers(arena, root);
        const SENTINEL: usize = 0;
        const ROOT: usize = 1;

        // Post-order over real nodes, sentinel excluded
        for v in postorder(&w, ROOT) {
            first_walk(&mut w, v);
        }
        w[SENTINEL].modifier = -w[ROOT].prelim;
        for v in preorder(&w, ROOT) {
            second_walk(&mut w, v);
        }

        self.normalize(&w, ROOT)
    }

    fn normalize(&self, w: &[Walker], root: usize) -> Layout {
        let nodes = preorder(w, root);
        let mut left = root;
        let mut right = root;
        let mut bottom = root;
        for &v in &nodes {
            if w[v].x < w[left].x {
                left = v;
            }
            if w[v].x > w[right].x {
                right = v;
            }
            if w[v].depth > w[bottom].depth {
                bottom = v;
            }
        }

        let s = if left == right {
            1.0
        } else {
            separation(w, left, right) / 2.0
        };
        let tx = s - w[left].x;
        let kx = self.breadth / (w[right].x + s + tx);
        let ky = self.depth_extent / (w[bottom].depth.max(1) as f64);
        debug!("normalize: tx={tx} kx={kx} ky={ky}");

        let positions = nodes
            .into_iter()
            .filter_map(|v| {
                w[v].node.map(|idx| {
                    (
                        idx,
                        Position {
                            x: (w[v].x + tx) * kx,
                            y: w[v].depth as f64 * ky,
                        },
                    )
                })
            })
            .collect();
        Layout { positions }
    }
}

/// Dense copy of the hierarchy; slot 0 is a sentinel parent of the root.
fn build_walkers(arena: &BomArena, root: Index) -> Vec<Walker> {
    let mut w = vec![Walker::new(None, None, 0, 0, 0), Walker::new(Some(root), Some(0), 0, 0, 1)];
    w[0].children.push(1);

    let mut stack = vec![1usize];
    while let Some(v) = stack.pop() {
        let Some(node) = w[v].node.and_then(|idx| arena.get_node(idx)) else {
            continue;
        };
        for (i, &child) in node.children.iter().enumerate() {
            let me = w.len();
            let depth = w[v].depth + 1;
            w.push(Walker::new(Some(child), Some(v), i, depth, me));
            w[v].children.push(me);
            stack.push(me);
        }
    }
    w
}

fn preorder(w: &[Walker], root: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(w.len());
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        out.push(v);
        stack.extend(w[v].children.iter().rev());
    }
    out
}

fn postorder(w: &[Walker], root: usize) -> Vec<usize> {
    let mut out = preorder_mirrored(w, root);
    out.reverse();
    out
}

/// Root, then children right to left; reversed this is a left-to-right post-order.
fn preorder_mirrored(w: &[Walker], root: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(w.len());
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        out.push(v);
        stack.extend(w[v].children.iter());
    }
    out
}

fn separation(w: &[Walker], a: usize, b: usize) -> f64 {
    if w[a].parent == w[b].parent {
        1.0
    } else {
        2.0
    }
}

fn next_left(w: &[Walker], v: usize) -> Option<usize> {
    w[v].children.first().copied().or(w[v].thread)
}

fn next_right(w: &[Walker], v: usize) -> Option<usize> {
    w[v].children.last().copied().or(w[v].thread)
}

fn parent_of(w: &[Walker], v: usize) -> usize {
    // Every real node has a parent; the sentinel is never walked
    w[v].parent.unwrap_or(0)
}

fn move_subtree(w: &mut [Walker], wm: usize, wp: usize, shift: f64) {
    let change = shift / (w[wp].number as f64 - w[wm].number as f64);
    w[wp].change -= change;
    w[wp].shift += shift;
    w[wm].change += change;
    w[wp].prelim += shift;
    w[wp].modifier += shift;
}

fn execute_shifts(w: &mut [Walker], v: usize) {
    let mut shift = 0.0;
    let mut change = 0.0;
    let children = w[v].children.clone();
    for &c in children.iter().rev() {
        w[c].prelim += shift;
        w[c].modifier += shift;
        change += w[c].change;
        shift += w[c].shift + change;
    }
}

fn next_ancestor(w: &[Walker], vim: usize, v: usize, ancestor: usize) -> usize {
    let a = w[vim].ancestor;
    if w[a].parent == w[v].parent {
        a
    } else {
        ancestor
    }
}

fn first_walk(w: &mut [Walker], v: usize) {
    let parent = parent_of(w, v);
    let number = w[v].number;
    let left_sibling = if number > 0 {
        Some(w[parent].children[number - 1])
    } else {
        None
    };

    if !w[v].children.is_empty() {
        execute_shifts(w, v);
        let first = w[v].children[0];
        let last = w[v].children[w[v].children.len() - 1];
        let midpoint = (w[first].prelim + w[last].prelim) / 2.0;
        if let Some(ls) = left_sibling {
            w[v].prelim = w[ls].prelim + separation(w, v, ls);
            w[v].modifier = w[v].prelim - midpoint;
        } else {
            w[v].prelim = midpoint;
        }
    } else if let Some(ls) = left_sibling {
        w[v].prelim = w[ls].prelim + separation(w, v, ls);
    }

    let default_ancestor = w[parent]
        .default_ancestor
        .unwrap_or(w[parent].children[0]);
    w[parent].default_ancestor = Some(apportion(w, v, left_sibling, default_ancestor));
}

fn apportion(w: &mut [Walker], v: usize, left_sibling: Option<usize>, mut ancestor: usize) -> usize {
    let Some(ls) = left_sibling else {
        return ancestor;
    };

    let parent = parent_of(w, v);
    let mut vip = v;
    let mut vop = v;
    let mut vim = ls;
    let mut vom = w[parent].children[0];
    let mut sip = w[vip].modifier;
    let mut sop = w[vop].modifier;
    let mut sim = w[vim].modifier;
    let mut som = w[vom].modifier;

    let mut next_vim = next_right(w, vim);
    let mut next_vip = next_left(w, vip);
    while let (Some(nvim), Some(nvip)) = (next_vim, next_vip) {
        vim = nvim;
        vip = nvip;
        // Contours of equal length are walked in lockstep, so these exist
        vom = next_left(w, vom).unwrap_or(vom);
        vop = next_right(w, vop).unwrap_or(vop);
        w[vop].ancestor = v;

        let shift = w[vim].prelim + sim - w[vip].prelim - sip + separation(w, vim, vip);
        if shift > 0.0 {
            let a = next_ancestor(w, vim, v, ancestor);
            move_subtree(w, a, v, shift);
            sip += shift;
            sop += shift;
        }
        sim += w[vim].modifier;
        sip += w[vip].modifier;
        som += w[vom].modifier;
        sop += w[vop].modifier;

        next_vim = next_right(w, vim);
        next_vip = next_left(w, vip);
    }

    if let Some(nvim) = next_vim {
        if next_right(w, vop).is_none() {
            w[vop].thread = Some(nvim);
            w[vop].modifier += sim - sop;
        }
    }
    if let Some(nvip) = next_vip {
        if next_left(w, vom).is_none() {
            w[vom].thread = Some(nvip);
            w[vom].modifier += sip - som;
            ancestor = v;
        }
    }
    ancestor
}

fn second_walk(w: &mut [Walker], v: usize) {
    let parent = parent_of(w, v);
    let parent_modifier = w[parent].modifier;
    w[v].x = w[v].prelim + parent_modifier;
    w[v].modifier += parent_modifier;
}

/// SVG path for a horizontal link between two laid-out points.
///
/// Axes are swapped: the depth coordinate `y` becomes the horizontal
/// position. The curve leaves and enters horizontally.
pub fn link_horizontal(source: Position, target: Position) -> String {
    let (x0, y0) = (source.y, source.x);
    let (x1, y1) = (target.y, target.x);
    let mid = (x0 + x1) / 2.0;
    format!("M{x0},{y0}C{mid},{y0} {mid},{y1} {x1},{y1}")
}
