//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (BomSource, Surface)
//! but are themselves concrete structs, not traits.

mod bom;
mod render;
mod routing;

pub use bom::BomService;
pub use render::{DrawSummary, TreeRenderer};
pub use routing::RoutingService;
