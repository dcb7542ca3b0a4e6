use crate::errors::SegmentError;
use crate::types::{ContainerNode, Node};
use serde::Serialize;

pub const DEFAULT_MAX_DEPTH: usize = 16;
pub const DEFAULT_MAX_NODES: usize = 500;

/// Deepest nesting the JSON decoder accepts with margin; each container level
/// costs two levels of serde_json's recursion limit (128)
pub const MAX_DEPTH_CEILING: usize = 48;

/// Size caps applied to stored trees before compilation.
/// Trees nested past `MAX_DEPTH_CEILING` are rejected by the decoder as
/// malformed regardless of `max_depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl SegmentLimits {
    pub fn check(&self, root: &ContainerNode) -> Result<(), SegmentError> {
        let depth = root.depth();
        if depth > self.max_depth {
            return Err(SegmentError::TooComplex(format!(
                "nesting depth {} exceeds limit {}",
                depth, self.max_depth
            )));
        }
        let nodes = root.node_count();
        if nodes > self.max_nodes {
            return Err(SegmentError::TooComplex(format!(
                "{} nodes exceeds limit {}",
                nodes, self.max_nodes
            )));
        }
        Ok(())
    }
}

/// Serialization view of a root container, tagged like any other node
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RootRef<'a> {
    Container(&'a ContainerNode),
}

/// Parses a stored segment query; the root must be a container
pub fn parse_query(query: &str) -> Result<ContainerNode, SegmentError> {
    if query.trim().is_empty() {
        return Err(SegmentError::MalformedSegment("empty query".to_string()));
    }
    match serde_json::from_str::<Node>(query)? {
        Node::Container(container) => Ok(container),
        Node::Condition(_) => Err(SegmentError::MalformedSegment(
            "root node must be a container".to_string(),
        )),
    }
}

/// Parses and enforces `limits` in one step
pub fn parse_query_with_limits(
    query: &str,
    limits: &SegmentLimits,
) -> Result<ContainerNode, SegmentError> {
    let root = parse_query(query)?;
    limits.check(&root)?;
    Ok(root)
}

pub fn serialize_query(root: &ContainerNode) -> Result<String, SegmentError> {
    Ok(serde_json::to_string(&RootRef::Container(root))?)
}
