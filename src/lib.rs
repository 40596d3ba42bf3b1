//! bomviz: fetch bill-of-materials trees and render them as node-link diagrams.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
