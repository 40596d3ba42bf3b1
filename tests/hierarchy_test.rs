//! Tests for BOM hierarchy, layout and tree listing using JSON fixtures

use std::collections::HashMap;
use std::fs;

use bomviz::application::services::BomService;
use bomviz::domain::{BomArena, BomNode, Position, TreeConvert, TreeLayout};

fn load(name: &str) -> BomNode {
    let body = fs::read_to_string(format!("tests/resources/bom/{}.json", name)).unwrap();
    BomNode::from_json(&body).unwrap()
}

fn positions(arena: &BomArena, layout: &bomviz::domain::Layout) -> HashMap<String, Position> {
    arena
        .iter()
        .map(|(idx, node)| (node.data.item_no.clone(), layout.position(idx).unwrap()))
        .collect()
}

// ============================================================
// Hierarchy
// ============================================================

#[test]
fn given_moderate_bom_when_building_hierarchy_then_counts_and_depth() {
    let tree = load("moderate");
    let arena = BomArena::from_tree(&tree);

    assert_eq!(arena.len(), 9);
    assert_eq!(arena.len(), tree.count());
    assert_eq!(arena.depth(), 4);
    assert_eq!(arena.links().len(), arena.len() - 1);
    assert_eq!(
        arena.leaf_nodes(),
        vec!["P1101", "P1102", "1103", "P1211", "P1300"]
    );
}

#[test]
fn given_moderate_bom_when_iterating_breadth_first_then_level_by_level() {
    let arena = BomArena::from_tree(&load("moderate"));

    let depths: Vec<usize> = arena.iter_breadth_first().map(|(_, n)| n.depth).collect();
    let mut sorted = depths.clone();
    sorted.sort_unstable();
    assert_eq!(depths, sorted);

    let post: Vec<String> = arena
        .iter_postorder()
        .map(|(_, n)| n.data.item_no.clone())
        .collect();
    assert_eq!(post.last().map(String::as_str), Some("A1000"));
    assert_eq!(post.first().map(String::as_str), Some("P1101"));
}

#[test]
fn given_inconsistent_levels_when_building_hierarchy_then_structure_wins() {
    let tree = load("inconsistent_levels");
    let arena = BomService::hierarchy(&tree);

    assert_eq!(arena.depth(), 2);
    assert_eq!(arena.root_level_count(), 2);
    assert_eq!(arena.level_mismatches().len(), 2);
}

// ============================================================
// Layout
// ============================================================

#[test]
fn given_moderate_bom_when_laying_out_then_depth_maps_linearly() {
    let arena = BomArena::from_tree(&load("moderate"));
    let layout = TreeLayout::new(800.0, 1100.0).apply(&arena);
    let pos = positions(&arena, &layout);

    assert_eq!(layout.len(), arena.len());
    for (_, node) in arena.iter() {
        let p = pos[&node.data.item_no];
        let expected = node.depth as f64 * 1100.0 / 3.0;
        assert!((p.y - expected).abs() < 1e-9, "{}", node.data.item_no);
        assert!(p.x > 0.0 && p.x < 800.0, "{} at {}", node.data.item_no, p.x);
    }
}

#[test]
fn given_moderate_bom_when_laying_out_then_parents_centered_over_children() {
    let arena = BomArena::from_tree(&load("moderate"));
    let layout = TreeLayout::new(800.0, 1100.0).apply(&arena);

    for (idx, node) in arena.iter() {
        if !node.has_children() {
            continue;
        }
        let first = layout.position(node.children[0]).unwrap().x;
        let last = layout.position(*node.children.last().unwrap()).unwrap().x;
        let parent = layout.position(idx).unwrap().x;
        assert!(
            (parent - (first + last) / 2.0).abs() < 1e-9,
            "{} not centered",
            node.data.item_no
        );
    }
}

#[test]
fn given_moderate_bom_when_laying_out_then_siblings_keep_order_without_overlap() {
    let arena = BomArena::from_tree(&load("moderate"));
    let layout = TreeLayout::new(800.0, 1100.0).apply(&arena);

    // Nodes on the same depth appear left to right in breadth-first order
    let mut by_depth: HashMap<usize, Vec<f64>> = HashMap::new();
    for (idx, node) in arena.iter_breadth_first() {
        by_depth
            .entry(node.depth)
            .or_default()
            .push(layout.position(idx).unwrap().x);
    }
    for xs in by_depth.values() {
        assert!(xs.windows(2).all(|w| w[0] < w[1]), "{:?}", xs);
    }
}

// ============================================================
// Tree listing
// ============================================================

#[test]
fn given_moderate_bom_when_listing_then_labels_with_two_decimals() {
    let tree = load("moderate");
    let listing = BomArena::from_tree(&tree).to_tree_string().to_string();

    assert_eq!(listing, tree.to_tree_string().to_string());
    assert!(listing.starts_with("A1000 ($1843.75)"));
    assert!(listing.contains("P1102 ($287.56)"));
    assert!(listing.contains("1103 ($14.20)"));
    assert!(listing.contains("P1211 ($2.13)"));
}
