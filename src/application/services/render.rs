//! BOM tree rendering
//!
//! Draws a fetched BOM tree onto a [`Surface`] as a horizontal node-link diagram.

use tracing::{debug, instrument, warn};

use crate::application::services::BomService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::CanvasConfig;
use crate::domain::{link_horizontal, BomArena, BomNode, Complexity, DomainError, TreeLayout};
use crate::infrastructure::svg::Element;
use crate::infrastructure::traits::Surface;

const ROOT_RADIUS: f64 = 8.0;
const NODE_RADIUS: f64 = 4.0;
const ROOT_FILL: &str = "#1f77b4";
const NODE_FILL: &str = "#ff7f0e";
const LINK_STROKE: &str = "#555";
const LABEL_OFFSET: f64 = 10.0;
const LABEL_DY: f64 = 3.0;
const ERROR_FILL: &str = "#b22222";

/// Outcome of a successful draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawSummary {
    pub nodes: usize,
    pub links: usize,
    /// Number of levels
    pub depth: usize,
}

/// Renders BOM trees with a fixed canvas geometry.
#[derive(Clone)]
pub struct TreeRenderer {
    bom: BomService,
    canvas: CanvasConfig,
}

impl TreeRenderer {
    pub fn new(bom: BomService, canvas: CanvasConfig) -> Self {
        Self { bom, canvas }
    }

    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Fetch the tree for `complexity` and draw it onto `surface`.
    ///
    /// The surface is cleared first. On failure it holds a single error
    /// text element and the error is returned.
    #[instrument(level = "debug", skip(self, surface), fields(complexity = %complexity))]
    pub async fn draw(
        &self,
        complexity: &Complexity,
        surface: &mut dyn Surface,
    ) -> ApplicationResult<DrawSummary> {
        surface.clear();

        let tree = match self.bom.fetch_tree(complexity).await {
            Ok(tree) => tree,
            Err(e) => {
                warn!("draw failed: {}", e);
                render_error(&e, &self.canvas, surface);
                return Err(e);
            }
        };

        let summary = render_tree(&tree, &self.canvas, surface)?;
        debug!(
            "draw: nodes={} links={} depth={}",
            summary.nodes, summary.links, summary.depth
        );
        Ok(summary)
    }
}

/// Draw an already decoded tree onto `surface`, replacing its content.
pub fn render_tree(
    tree: &BomNode,
    canvas: &CanvasConfig,
    surface: &mut dyn Surface,
) -> ApplicationResult<DrawSummary> {
    surface.clear();
    surface.set_size(canvas.width, canvas.height);

    let arena = BomService::hierarchy(tree);
    let layout = TreeLayout::new(canvas.height, canvas.layout_width()).apply(&arena);
    if layout.is_empty() {
        return Err(DomainError::EmptyHierarchy.into());
    }

    let mut group =
        Element::new("g").attr("transform", format!("translate({},0)", canvas.margin_left));

    let links = arena.links();
    for (parent, child) in &links {
        let (Some(source), Some(target)) = (layout.position(*parent), layout.position(*child))
        else {
            continue;
        };
        group.push(
            Element::new("path")
                .attr("class", "link")
                .attr("d", link_horizontal(source, target))
                .attr("stroke", LINK_STROKE)
                .attr("fill", "none"),
        );
    }

    for (idx, node) in arena.iter_breadth_first() {
        let Some(pos) = layout.position(idx) else {
            continue;
        };
        group.push(node_element(&arena, idx, pos.x, pos.y));
    }

    surface.append(group);

    Ok(DrawSummary {
        nodes: arena.len(),
        links: links.len(),
        depth: arena.depth(),
    })
}

fn node_element(arena: &BomArena, idx: generational_arena::Index, x: f64, y: f64) -> Element {
    let Some(node) = arena.get_node(idx) else {
        return Element::new("g");
    };
    let (radius, fill) = if node.data.is_root_level() {
        (ROOT_RADIUS, ROOT_FILL)
    } else {
        (NODE_RADIUS, NODE_FILL)
    };
    let (label_x, anchor) = if node.has_children() {
        (-LABEL_OFFSET, "end")
    } else {
        (LABEL_OFFSET, "start")
    };

    Element::new("g")
        .attr("class", "node")
        .attr("transform", format!("translate({},{})", y, x))
        .child(Element::new("circle").attr("r", radius).attr("fill", fill))
        .child(
            Element::new("text")
                .attr("dy", LABEL_DY)
                .attr("x", label_x)
                .attr("text-anchor", anchor)
                .text(node.data.label()),
        )
}

/// Replace the surface content with a single error message.
pub fn render_error(error: &ApplicationError, canvas: &CanvasConfig, surface: &mut dyn Surface) {
    surface.clear();
    surface.set_size(canvas.width, canvas.height);
    surface.append(
        Element::new("text")
            .attr("class", "error")
            .attr("x", LABEL_OFFSET)
            .attr("y", 2.0 * LABEL_OFFSET)
            .attr("fill", ERROR_FILL)
            .text(format!("Error loading BOM: {}", error)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::infrastructure::svg::SvgCanvas;

    #[test]
    fn given_single_node_when_rendering_then_root_centered_without_links() {
        let mut canvas = SvgCanvas::new();
        let config = Profile::Development.canvas();
        let summary = render_tree(&BomNode::new("A", 1.0, 0), &config, &mut canvas).unwrap();

        assert_eq!(summary, DrawSummary { nodes: 1, links: 0, depth: 1 });
        let nodes = canvas.select_all("g");
        let node = nodes.iter().find(|g| g.has_class("node")).unwrap();
        assert_eq!(node.get_attr("transform"), Some("translate(0,400)"));
        let text = node.find_child("text").unwrap();
        assert_eq!(text.get_attr("text-anchor"), Some("start"));
    }

    #[test]
    fn given_canvas_config_when_rendering_then_surface_sized_and_translated() {
        let mut canvas = SvgCanvas::new();
        let config = Profile::Production.canvas();
        render_tree(&BomNode::new("A", 1.0, 0), &config, &mut canvas).unwrap();

        assert_eq!((canvas.width(), canvas.height()), (960.0, 600.0));
        assert_eq!(canvas.elements().len(), 1);
        assert_eq!(
            canvas.elements()[0].get_attr("transform"),
            Some("translate(40,0)")
        );
    }

    #[test]
    fn given_error_when_rendering_error_then_single_text_element() {
        let mut canvas = SvgCanvas::new();
        canvas.append(Element::new("g"));
        let err: ApplicationError = DomainError::EmptyHierarchy.into();
        render_error(&err, &Profile::Development.canvas(), &mut canvas);

        assert_eq!(canvas.elements().len(), 1);
        let text = &canvas.elements()[0];
        assert!(text.has_class("error"));
        assert_eq!(text.text_content(), Some("Error loading BOM: empty hierarchy"));
    }
}
