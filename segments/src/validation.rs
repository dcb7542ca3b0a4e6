use crate::edit::NodePath;
use crate::errors::SegmentError;
use crate::registry::FieldRegistry;
use crate::types::{ConditionNode, Node};

/// A problem found in a tree, located by path for the builder UI
#[derive(Debug, Clone, PartialEq)]
pub struct NodeIssue {
    pub path: NodePath,
    pub error: SegmentError,
}

/// Collects every field, operator and value problem in `node`.
/// Unlike compilation this does not stop at the first error.
pub fn validate_tree(node: &Node, registry: &FieldRegistry) -> Vec<NodeIssue> {
    let mut issues = Vec::new();
    walk(node, NodePath::root(), registry, &mut issues);
    issues
}

pub fn validate_condition(
    condition: &ConditionNode,
    registry: &FieldRegistry,
) -> Result<(), SegmentError> {
    let descriptor = registry.describe(&condition.field)?;
    if !descriptor.allows(condition.operator) {
        return Err(SegmentError::IllegalOperator {
            field: condition.field.clone(),
            operator: condition.operator,
        });
    }
    registry.coerce(&condition.field, &condition.value)?;
    Ok(())
}

fn walk(node: &Node, path: NodePath, registry: &FieldRegistry, issues: &mut Vec<NodeIssue>) {
    match node {
        Node::Condition(condition) => {
            if let Err(error) = validate_condition(condition, registry) {
                issues.push(NodeIssue { path, error });
            }
        }
        Node::Container(container) => {
            for (index, child) in container.children.iter().enumerate() {
                walk(child, path.child(index), registry, issues);
            }
        }
    }
}
