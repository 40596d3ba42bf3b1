//! BOM retrieval service
//!
//! Fetches a BOM tree from a source, decodes it and builds the hierarchy.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::ApplicationResult;
use crate::domain::{BomArena, BomNode, Complexity};
use crate::infrastructure::traits::BomSource;

/// Service for loading BOM trees.
#[derive(Clone)]
pub struct BomService {
    source: Arc<dyn BomSource>,
}

impl BomService {
    pub fn new(source: Arc<dyn BomSource>) -> Self {
        Self { source }
    }

    /// Fetch and decode the BOM tree for `complexity`.
    #[instrument(level = "debug", skip(self), fields(complexity = %complexity))]
    pub async fn fetch_tree(&self, complexity: &Complexity) -> ApplicationResult<BomNode> {
        if !complexity.is_known() {
            debug!("complexity '{}' is not a generator value", complexity);
        }
        let body = self.source.fetch_tree(complexity).await?;
        let tree = BomNode::from_json(&body)?;
        debug!(
            "fetch_tree: root={} nodes={} from {}",
            tree.item_no,
            tree.count(),
            self.source.describe()
        );
        Ok(tree)
    }

    /// Fetch the tree and build its hierarchy.
    pub async fn fetch_hierarchy(&self, complexity: &Complexity) -> ApplicationResult<BomArena> {
        let tree = self.fetch_tree(complexity).await?;
        Ok(Self::hierarchy(&tree))
    }

    /// Build the hierarchy of a decoded tree.
    ///
    /// Inconsistent `level` values are reported, not rejected: the tree
    /// structure decides placement, `level` only the root styling.
    pub fn hierarchy(tree: &BomNode) -> BomArena {
        let arena = BomArena::from_tree(tree);
        let mismatches = arena.level_mismatches();
        if !mismatches.is_empty() {
            warn!(
                "{} node(s) have a level that does not match their depth",
                mismatches.len()
            );
        }
        let roots = arena.root_level_count();
        if roots != 1 {
            warn!("expected one node with level 0, found {}", roots);
        }
        arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::infrastructure::traits::FetchError;
    use crate::application::ApplicationError;
    use async_trait::async_trait;

    struct StaticSource(&'static str);

    #[async_trait]
    impl BomSource for StaticSource {
        async fn fetch_tree(&self, _c: &Complexity) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
        async fn fetch_routing(&self, _c: &Complexity) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    #[tokio::test]
    async fn given_valid_body_when_fetching_then_decodes_tree() {
        let service = BomService::new(Arc::new(StaticSource(
            r#"{"item_no":"A","cost":100,"level":0,"children":[{"item_no":"B","cost":25.5,"level":1}]}"#,
        )));
        let arena = service
            .fetch_hierarchy(&Complexity::parse("simple").unwrap())
            .await
            .unwrap();
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.depth(), 2);
    }

    #[tokio::test]
    async fn given_html_body_when_fetching_then_malformed() {
        let service = BomService::new(Arc::new(StaticSource("<html>oops</html>")));
        let err = service
            .fetch_tree(&Complexity::parse("simple").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::MalformedTree { .. })
        ));
    }
}
