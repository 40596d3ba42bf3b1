//! Routing report service

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::{Complexity, RoutingReport};
use crate::infrastructure::traits::BomSource;

/// Service for loading per-work-center routing reports.
#[derive(Clone)]
pub struct RoutingService {
    source: Arc<dyn BomSource>,
}

impl RoutingService {
    pub fn new(source: Arc<dyn BomSource>) -> Self {
        Self { source }
    }

    #[instrument(level = "debug", skip(self), fields(complexity = %complexity))]
    pub async fn fetch(&self, complexity: &Complexity) -> ApplicationResult<RoutingReport> {
        let body = self.source.fetch_routing(complexity).await?;
        let report = RoutingReport::from_json(&body)?;
        debug!(
            "fetch: {} work centers, root={}",
            report.work_centers.len(),
            report.routing_data.item_no
        );
        Ok(report)
    }
}
