//! Domain layer: entities, hierarchy and layout
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod layout;
pub mod tree_view;

pub use arena::{BomArena, NodeData, TreeNode};
pub use entities::*;
pub use error::DomainError;
pub use layout::{link_horizontal, Layout, Position, TreeLayout};
pub use tree_view::TreeConvert;
