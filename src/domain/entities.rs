//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::DomainError;

/// Upper bound on the length of a complexity selector.
pub const MAX_COMPLEXITY_LEN: usize = 64;

/// Complexity values produced by the BOM data generator.
pub const KNOWN_COMPLEXITIES: [&str; 4] = ["simple", "moderate", "complex", "part"];

/// One node of a bill-of-materials tree as delivered by the BOM API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomNode {
    /// Part or assembly number (string or number on the wire)
    #[serde(deserialize_with = "item_no_from_any")]
    pub item_no: String,
    /// Rolled-up cost of the item
    pub cost: f64,
    /// Depth indicator, 0 for the top-level assembly
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Components in BOM line order; absent, null or empty for parts
    #[serde(default, deserialize_with = "children_or_empty")]
    pub children: Vec<BomNode>,
}

impl BomNode {
    /// Create a leaf node.
    pub fn new(item_no: impl Into<String>, cost: f64, level: u32) -> Self {
        Self {
            item_no: item_no.into(),
            cost,
            level,
            description: None,
            children: Vec::new(),
        }
    }

    /// Builder-style helper to attach a child.
    pub fn with_child(mut self, child: BomNode) -> Self {
        self.children.push(child);
        self
    }

    /// Label shown next to the node: `"<item_no> ($<cost>)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.item_no, format_cost(self.cost))
    }

    /// Total number of nodes in this subtree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(BomNode::count).sum::<usize>()
    }

    /// Decode a BOM tree from a JSON document.
    pub fn from_json(body: &str) -> Result<Self, DomainError> {
        serde_json::from_str(body).map_err(|e| DomainError::MalformedTree {
            message: e.to_string(),
        })
    }
}

/// Format a cost with a `$` prefix and exactly two decimals.
///
/// Rounds the exact binary value of `cost` half away from zero, so
/// `1.005` (stored as 1.00499...) gives `$1.00` and `0.125` gives `$0.13`.
pub fn format_cost(cost: f64) -> String {
    match Decimal::from_f64_retain(cost) {
        Some(d) => {
            let rounded = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("${:.2}", rounded)
        }
        None => format!("${:.2}", cost),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemNo {
    Text(String),
    Int(i64),
    Float(f64),
}

fn item_no_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawItemNo::deserialize(deserializer)? {
        RawItemNo::Text(s) => s,
        RawItemNo::Int(i) => i.to_string(),
        RawItemNo::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        RawItemNo::Float(f) => f.to_string(),
    })
}

fn children_or_empty<'de, D>(deserializer: D) -> Result<Vec<BomNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<BomNode>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Selector for the BOM variant to fetch, validated for use as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Complexity(String);

impl Complexity {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidComplexity {
                value: raw.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if trimmed.chars().count() > MAX_COMPLEXITY_LEN {
            return Err(DomainError::InvalidComplexity {
                value: raw.to_string(),
                reason: format!("longer than {} characters", MAX_COMPLEXITY_LEN),
            });
        }
        if trimmed == "." || trimmed == ".." {
            return Err(DomainError::InvalidComplexity {
                value: raw.to_string(),
                reason: "dot segments are not allowed".to_string(),
            });
        }
        if trimmed.chars().any(char::is_control) {
            return Err(DomainError::InvalidComplexity {
                value: raw.to_string(),
                reason: "contains control characters".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the value is one the BOM data generator produces.
    pub fn is_known(&self) -> bool {
        KNOWN_COMPLEXITIES.contains(&self.0.as_str())
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Complexity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Work center column of a routing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCenter {
    pub wc_no: String,
    pub name: String,
}

/// Routing data of one item and its components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingNode {
    #[serde(deserialize_with = "item_no_from_any")]
    pub item_no: String,
    #[serde(default)]
    pub description: String,
    /// `A` for assemblies, `P` for parts
    #[serde(default)]
    pub item_type: String,
    pub level: u32,
    /// Run time in minutes per work center number
    #[serde(default)]
    pub work_centers: BTreeMap<String, u32>,
    #[serde(default)]
    pub total_time: u32,
    #[serde(default, deserialize_with = "routing_children_or_empty")]
    pub children: Vec<RoutingNode>,
}

fn routing_children_or_empty<'de, D>(deserializer: D) -> Result<Vec<RoutingNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RoutingNode>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Payload of the BOM routing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingReport {
    pub work_centers: Vec<WorkCenter>,
    pub routing_data: RoutingNode,
}

/// One flattened line of a routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRow {
    pub level: u32,
    pub item_no: String,
    pub description: String,
    pub item_type: String,
    /// Minutes per work center, in report column order
    pub minutes: Vec<u32>,
    pub total_time: u32,
}

impl RoutingReport {
    pub fn from_json(body: &str) -> Result<Self, DomainError> {
        serde_json::from_str(body).map_err(|e| DomainError::MalformedTree {
            message: e.to_string(),
        })
    }

    /// Flatten the routing tree in pre-order.
    pub fn rows(&self) -> Vec<RoutingRow> {
        let mut rows = Vec::new();
        let mut stack = vec![&self.routing_data];
        while let Some(node) = stack.pop() {
            rows.push(RoutingRow {
                level: node.level,
                item_no: node.item_no.clone(),
                description: node.description.clone(),
                item_type: node.item_type.clone(),
                minutes: self
                    .work_centers
                    .iter()
                    .map(|wc| node.work_centers.get(&wc.wc_no).copied().unwrap_or(0))
                    .collect(),
                total_time: node.total_time,
            });
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        rows
    }

    /// Sum of `total_time` over all rows.
    pub fn total_minutes(&self) -> u64 {
        self.rows().iter().map(|r| u64::from(r.total_time)).sum()
    }
}
